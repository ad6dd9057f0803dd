//! Palette resolution.
//!
//! A palette specification is either the name of a directory entry
//! (ColorBrewer-style) or a literal `_`-joined color sequence. The
//! resolver walks a fixed fallback ladder and reports every
//! substitution it makes as a [`Diagnostic`]; only when all tiers fail
//! and no synthesized family was allowed does it return an error.

use crate::color::{self, Rgb};
use crate::error::{MapError, PaletteError, Result};
use crate::models::{Diagnostic, PaletteFamily};
use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// ColorBrewer scheme classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteKind {
    /// Sequential: lightness ramp for ordered data.
    Seq,
    /// Divergent: emphasizes both extremes and the midpoint.
    Div,
    /// Qualitative: hue contrast for categorical data.
    Qual,
}

impl PaletteKind {
    fn as_str(self) -> &'static str {
        match self {
            PaletteKind::Seq => "seq",
            PaletteKind::Div => "div",
            PaletteKind::Qual => "qual",
        }
    }

    /// The directory-wide default of this class and its supported size
    /// range.
    fn default_scheme(self) -> (&'static str, usize, usize) {
        match self {
            PaletteKind::Qual => ("Set3", 3, 12),
            PaletteKind::Div => ("RdYlBu", 3, 11),
            PaletteKind::Seq => ("YlGnBu", 3, 9),
        }
    }
}

/// One named scheme: its class and an ordered color list per supported
/// size.
#[derive(Debug, Clone)]
pub struct PaletteEntry {
    pub kind: PaletteKind,
    pub counts: BTreeMap<usize, Vec<Rgb>>,
}

/// Immutable name -> scheme table, loaded once and shared read-only.
#[derive(Debug, Clone)]
pub struct PaletteDirectory {
    entries: BTreeMap<String, PaletteEntry>,
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(rename = "type")]
    kind: PaletteKind,
    #[serde(flatten)]
    counts: BTreeMap<String, Vec<String>>,
}

impl PaletteDirectory {
    /// Parse a ColorBrewer-style JSON table:
    /// `{"RdYlBu": {"type": "div", "3": ["rgb(252,141,89)", ...], ...}}`.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let raw: BTreeMap<String, RawEntry> =
            serde_json::from_str(json).context("parse palette directory")?;
        let mut entries = BTreeMap::new();
        for (name, entry) in raw {
            let mut counts = BTreeMap::new();
            for (count, colors) in entry.counts {
                let count: usize = count
                    .parse()
                    .with_context(|| format!("palette {name}: bad color count key {count:?}"))?;
                let colors = colors
                    .iter()
                    .map(|c| color::parse_color(c))
                    .collect::<Result<Vec<_>>>()
                    .with_context(|| format!("palette {name}: bad color in {count}-class list"))?;
                counts.insert(count, colors);
            }
            entries.insert(
                name,
                PaletteEntry {
                    kind: entry.kind,
                    counts,
                },
            );
        }
        Ok(Self { entries })
    }

    /// The embedded ColorBrewer table shipped with the crate.
    pub fn builtin() -> &'static PaletteDirectory {
        static DIR: OnceLock<PaletteDirectory> = OnceLock::new();
        DIR.get_or_init(|| {
            PaletteDirectory::from_json(include_str!("../assets/colorbrewer.json"))
                .expect("embedded colorbrewer directory")
        })
    }

    pub fn get(&self, name: &str) -> Option<&PaletteEntry> {
        self.entries.get(name)
    }

    fn colors(&self, name: &str, n: usize) -> Option<Vec<Rgb>> {
        self.get(name).and_then(|e| e.counts.get(&n)).cloned()
    }
}

fn note(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    log::warn!("{diagnostic}");
    diagnostics.push(diagnostic);
}

/// Per-channel ramp parameters `(max, min, param)` for the synthesized
/// sequential families.
fn family_params(family: PaletteFamily) -> [(f64, f64, f64); 3] {
    match family {
        PaletteFamily::Reds => [(255.0, 100.0, 500.0), (240.0, 0.0, 250.0), (240.0, 0.0, 250.0)],
        PaletteFamily::Greens => [(240.0, 0.0, 250.0), (255.0, 70.0, 350.0), (250.0, 20.0, 250.0)],
        PaletteFamily::Blues => [(220.0, 0.0, 230.0), (240.0, 50.0, 250.0), (255.0, 100.0, 350.0)],
    }
}

/// Synthesize a light-to-dark sequential ramp without consulting any
/// directory. The ramp is computed for at least 3 steps and truncated
/// to the requested size.
pub fn synthesize_sequential(family: PaletteFamily, n_colors: usize) -> Vec<Rgb> {
    let params = family_params(family);
    let n = n_colors.max(3);
    (0..n)
        .take(n_colors)
        .map(|i| {
            let channel = |&(max, min, param): &(f64, f64, f64)| -> u8 {
                let v = ((i + 1) as f64 * (min - param) / n as f64 + param).round_ties_even();
                v.min(max).clamp(0.0, 255.0) as u8
            };
            Rgb::new(
                channel(&params[0]),
                channel(&params[1]),
                channel(&params[2]),
            )
        })
        .collect()
}

/// Tier 2: substitute the same-class directory default.
fn same_class_default(
    spec: &str,
    kind: PaletteKind,
    n: usize,
    directory: &PaletteDirectory,
    diagnostics: &mut Vec<Diagnostic>,
) -> std::result::Result<Vec<Rgb>, PaletteError> {
    let (default_name, lo, hi) = kind.default_scheme();
    if (lo..=hi).contains(&n) {
        if let Some(colors) = directory.colors(default_name, n) {
            note(
                diagnostics,
                Diagnostic {
                    requested: spec.to_string(),
                    substitute: default_name.to_string(),
                    detail: format!(
                        "palette {spec:?} does not have {n} colors; the default {} palette {default_name:?} was assigned",
                        kind.as_str()
                    ),
                },
            );
            return Ok(colors);
        }
    }
    Err(PaletteError::DefaultExhausted {
        name: spec.to_string(),
        kind: kind.as_str(),
        wanted: n,
    })
}

/// Tier 4: last-resort named defaults for specs that are neither a
/// directory entry nor a usable literal sequence.
fn last_resort(
    spec: &str,
    n: usize,
    directory: &PaletteDirectory,
    diagnostics: &mut Vec<Diagnostic>,
) -> std::result::Result<Vec<Rgb>, PaletteError> {
    for (name, lo, hi) in [("RdYlBu", 3usize, 11usize), ("Set3", 3, 12)] {
        if (lo..=hi).contains(&n) {
            if let Some(colors) = directory.colors(name, n) {
                note(
                    diagnostics,
                    Diagnostic {
                        requested: spec.to_string(),
                        substitute: name.to_string(),
                        detail: format!(
                            "palette {spec:?} is not valid or does not have {n} colors; the default palette {name:?} was assigned"
                        ),
                    },
                );
                return Ok(colors);
            }
        }
    }
    Err(PaletteError::NoLastResort { wanted: n })
}

fn resolve_tiers(
    spec: &str,
    n: usize,
    smart: bool,
    directory: &PaletteDirectory,
    diagnostics: &mut Vec<Diagnostic>,
) -> std::result::Result<Vec<Rgb>, PaletteError> {
    if let Some(entry) = directory.get(spec) {
        // Tier 1: exact hit.
        if let Some(colors) = entry.counts.get(&n) {
            return Ok(colors.clone());
        }
        if smart {
            return same_class_default(spec, entry.kind, n, directory, diagnostics);
        }
        return Err(PaletteError::InsufficientColors {
            name: spec.to_string(),
            wanted: n,
        });
    }
    // Tier 3: literal color sequence.
    match color::parse_sequence(spec) {
        Ok(colors) if colors.len() >= n => Ok(colors[..n].to_vec()),
        Ok(colors) => {
            let cause = PaletteError::SequenceTooShort {
                input: spec.to_string(),
                got: colors.len(),
                wanted: n,
            };
            if smart {
                last_resort(spec, n, directory, diagnostics).map_err(|_| cause)
            } else {
                Err(cause)
            }
        }
        Err(parse_err) => {
            let cause = PaletteError::InvalidSequence {
                input: spec.to_string(),
                source: Box::new(parse_err),
            };
            if smart {
                last_resort(spec, n, directory, diagnostics).map_err(|_| cause)
            } else {
                Err(cause)
            }
        }
    }
}

/// Resolve a palette specification into exactly `n_colors` colors.
///
/// Resolution order: exact directory hit, same-class smart default,
/// literal sequence, smart last-resort defaults, and finally the
/// synthesized sequential `fallback_family` (if any). Inversion is
/// applied last, after resolution, and is involutive.
pub fn resolve(
    spec: &str,
    n_colors: usize,
    smart: bool,
    invert: bool,
    fallback_family: Option<PaletteFamily>,
    directory: &PaletteDirectory,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<Rgb>> {
    let mut palette = match resolve_tiers(spec, n_colors, smart, directory, diagnostics) {
        Ok(palette) => palette,
        Err(cause) => match fallback_family {
            // Tier 5: synthesized sequential ramp.
            Some(family) => {
                note(
                    diagnostics,
                    Diagnostic {
                        requested: spec.to_string(),
                        substitute: format!("synthesized {family} ramp"),
                        detail: format!(
                            "a safe sequential {family} palette was assigned because palette resolution failed: {cause}"
                        ),
                    },
                );
                synthesize_sequential(family, n_colors)
            }
            None => return Err(MapError::PaletteResolution(cause)),
        },
    };
    if invert {
        palette.reverse();
    }
    Ok(palette)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir() -> &'static PaletteDirectory {
        PaletteDirectory::builtin()
    }

    #[test]
    fn exact_directory_hit_is_unmodified() {
        let mut diags = Vec::new();
        let p = resolve("RdYlBu", 5, false, false, None, dir(), &mut diags).unwrap();
        assert_eq!(p.len(), 5);
        assert_eq!(p, dir().colors("RdYlBu", 5).unwrap());
        assert!(diags.is_empty());
    }

    #[test]
    fn same_class_default_substitutes_with_diagnostic() {
        // Set1 stops at 9 colors; Set3 (qual default) reaches 12.
        let mut diags = Vec::new();
        let p = resolve("Set1", 11, true, false, None, dir(), &mut diags).unwrap();
        assert_eq!(p, dir().colors("Set3", 11).unwrap());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].requested, "Set1");
        assert_eq!(diags[0].substitute, "Set3");
    }

    #[test]
    fn literal_sequence_takes_first_n_in_order() {
        let mut diags = Vec::new();
        let p = resolve(
            "#ff0000_#00ff00_#0000ff",
            2,
            false,
            false,
            None,
            dir(),
            &mut diags,
        )
        .unwrap();
        assert_eq!(p, vec![Rgb::new(255, 0, 0), Rgb::new(0, 255, 0)]);
    }

    #[test]
    fn unresolvable_without_fallback_errors() {
        let mut diags = Vec::new();
        let err = resolve("NoSuchPalette", 5, false, false, None, dir(), &mut diags).unwrap_err();
        assert!(matches!(err, MapError::PaletteResolution(_)));
    }

    #[test]
    fn smart_last_resort_uses_rdylbu() {
        let mut diags = Vec::new();
        let p = resolve("NoSuchPalette", 5, true, false, None, dir(), &mut diags).unwrap();
        assert_eq!(p, dir().colors("RdYlBu", 5).unwrap());
        assert_eq!(diags[0].substitute, "RdYlBu");
    }

    #[test]
    fn smart_last_resort_falls_back_to_set3_at_12() {
        let mut diags = Vec::new();
        let p = resolve("NoSuchPalette", 12, true, false, None, dir(), &mut diags).unwrap();
        assert_eq!(p, dir().colors("Set3", 12).unwrap());
    }

    #[test]
    fn forced_family_never_fails() {
        let mut diags = Vec::new();
        let p = resolve(
            "garbage!!",
            3,
            false,
            false,
            Some(PaletteFamily::Reds),
            dir(),
            &mut diags,
        )
        .unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(diags.len(), 1);
        // Light to dark: luma strictly decreasing.
        assert!(p[0].luma() > p[1].luma() && p[1].luma() > p[2].luma());
    }

    #[test]
    fn synthesized_reds_match_the_ramp_formula() {
        let p = synthesize_sequential(PaletteFamily::Reds, 3);
        assert_eq!(
            p,
            vec![
                Rgb::new(255, 167, 167),
                Rgb::new(233, 83, 83),
                Rgb::new(100, 0, 0),
            ]
        );
    }

    #[test]
    fn synthesized_small_counts_truncate_a_three_step_ramp() {
        let three = synthesize_sequential(PaletteFamily::Blues, 3);
        let two = synthesize_sequential(PaletteFamily::Blues, 2);
        assert_eq!(two, three[..2].to_vec());
    }

    #[test]
    fn inversion_is_involutive() {
        let mut diags = Vec::new();
        let plain = resolve("RdYlBu", 5, false, false, None, dir(), &mut diags).unwrap();
        let once = resolve("RdYlBu", 5, false, true, None, dir(), &mut diags).unwrap();
        let mut twice = once.clone();
        twice.reverse();
        assert_eq!(twice, plain);
        assert_ne!(once, plain);
    }
}
