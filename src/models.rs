use crate::layout::RegionSelection;
use crate::thresholds::Task;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical country identifier: a lowercase two-letter ISO 3166-1
/// alpha-2 code. Stored inline so maps over codes stay cheap to clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CountryCode([u8; 2]);

impl CountryCode {
    /// Canonicalize a code, accepting either case. Returns `None` for
    /// anything that is not exactly two ASCII letters.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        let bytes = s.as_bytes();
        if bytes.len() == 2 && bytes.iter().all(|b| b.is_ascii_alphabetic()) {
            Some(Self([
                bytes[0].to_ascii_lowercase(),
                bytes[1].to_ascii_lowercase(),
            ]))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        // Always valid: constructed from two ASCII letters.
        std::str::from_utf8(&self.0).unwrap_or("??")
    }

    /// CSS class selector for this country in the base template.
    pub fn selector(&self) -> String {
        format!(".{}", self.as_str())
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CountryCode {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CountryCode {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        CountryCode::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid country code {s:?}")))
    }
}

/// Country -> finite value. Non-finite values are dropped by the data
/// loaders before a map ever sees them.
pub type ValueMap = BTreeMap<CountryCode, f64>;

/// Bin index -> countries in that bin. Every country of the input
/// appears in exactly one bin; empty bins are kept.
pub type IntensityMap = BTreeMap<usize, Vec<CountryCode>>;

/// Legend rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegendMode {
    /// No legend.
    Off,
    /// One entry per bin, labels generated from the thresholds.
    #[default]
    Auto,
    /// Exactly two entries, for the lowest and highest bins.
    Extremes,
}

/// Language of the generated legend phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegendLanguage {
    En,
    Es,
    De,
    /// `< X`, `X – Y`, `>= X`.
    #[default]
    Math,
    /// `x < X`, `X <= x < Y`, `x >= X`.
    Nerd,
}

/// Families available for the synthesized sequential fallback palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteFamily {
    Reds,
    Greens,
    Blues,
}

impl fmt::Display for PaletteFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaletteFamily::Reds => "Reds",
            PaletteFamily::Greens => "Greens",
            PaletteFamily::Blues => "Blues",
        })
    }
}

/// A non-fatal substitution record. Every fallback the pipeline takes
/// (palette substitutions, dropped thresholds, skipped legends) is
/// reported here and mirrored to the log, never inferred from the
/// output alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What was originally requested.
    pub requested: String,
    /// What was used instead.
    pub substitute: String,
    /// Human-readable reason for the substitution.
    pub detail: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "substituted {:?} for {:?}: {}",
            self.substitute, self.requested, self.detail
        )
    }
}

/// Full configuration of one compilation. Mirrors the CLI surface;
/// every field has a sensible default.
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Threshold construction method.
    pub task: Task,
    /// Which continents to show; empty means the whole world.
    pub regions: RegionSelection,
    /// Recover from palette misses and out-of-range thresholds.
    pub smart: bool,
    /// Palette name, or `_`-joined literal color sequence.
    pub palette: String,
    /// Reverse the resolved palette.
    pub invert_palette: bool,
    /// Last-resort synthesized family; `None` disables tier 5.
    pub fallback_family: Option<PaletteFamily>,
    /// Fill for countries absent from the data.
    pub missing_color: String,
    /// Fill for oceans, seas and lakes.
    pub ocean_color: String,
    pub legend: LegendMode,
    /// Bin index -> label, overriding the generated legend phrases.
    pub aliases: Option<BTreeMap<usize, String>>,
    pub language: LegendLanguage,
    /// Decimals for threshold numbers in the legend.
    pub decimals: usize,
    /// Drop legend entries for bins with no countries.
    pub used_bins_only: bool,
    /// Optional caption rendered under the map.
    pub caption: Option<String>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            task: Task::Values,
            regions: RegionSelection::default(),
            smart: true,
            palette: "RdYlBu".to_string(),
            invert_palette: false,
            fallback_family: Some(PaletteFamily::Reds),
            missing_color: "#e6e6e6".to_string(),
            ocean_color: "255,255,255".to_string(),
            legend: LegendMode::Auto,
            aliases: None,
            language: LegendLanguage::Math,
            decimals: 0,
            used_bins_only: true,
            caption: None,
        }
    }
}
