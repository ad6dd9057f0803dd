//! RGB color parsing and formatting.
//!
//! Colors arrive as free-form strings: hex (`"#e6e6e6"`) or 0-255 RGB
//! (`"rgb(230,230,230)"`, `"230,230,230"`). Literal palettes join
//! several of these with `_`.

use crate::error::{MapError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// An opaque RGB color on the 0-255 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS serialization, `rgb(r,g,b)`.
    pub fn to_css(self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }

    /// Relative luminance on the 0-255 scale (0.299 R + 0.587 G + 0.114 B).
    pub fn luma(self) -> f64 {
        0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64
    }

    /// Text color with enough contrast against this background: black on
    /// light backgrounds (luma > 186), white on dark ones. The threshold
    /// is a fixed perceptual constant, not configurable.
    pub fn contrast_text(self) -> Rgb {
        if self.luma() > 186.0 {
            Rgb::new(0, 0, 0)
        } else {
            Rgb::new(255, 255, 255)
        }
    }
}

fn hex_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9a-f]{6}").unwrap())
}

fn rgb255_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,3})\D+(\d{1,3})\D+(\d{1,3})").unwrap())
}

/// Parse a single color string. Hex is tried first, then 0-255 RGB;
/// components out of range are rejected.
pub fn parse_color(input: &str) -> Result<Rgb> {
    let lowered = input.to_lowercase();
    if let Some(m) = hex_re().find(&lowered) {
        let hex = m.as_str();
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        if let (Ok(r), Ok(g), Ok(b)) = (channel(0), channel(2), channel(4)) {
            return Ok(Rgb::new(r, g, b));
        }
    }
    if let Some(caps) = rgb255_re().captures(input) {
        let mut parts = [0u32; 3];
        for (i, part) in parts.iter_mut().enumerate() {
            *part = caps[i + 1]
                .parse()
                .map_err(|_| MapError::InvalidColorFormat(input.to_string()))?;
        }
        if parts.iter().all(|&c| c <= 255) {
            return Ok(Rgb::new(parts[0] as u8, parts[1] as u8, parts[2] as u8));
        }
        return Err(MapError::InvalidColorFormat(input.to_string()));
    }
    Err(MapError::InvalidColorFormat(input.to_string()))
}

/// Parse an `_`-joined sequence of colors into an ordered palette.
pub fn parse_sequence(input: &str) -> Result<Vec<Rgb>> {
    input.split('_').map(parse_color).collect()
}
