//! Magnitude-suffix number formatting and fixed-decimal rounding.
//!
//! Values accept and produce SI-style suffixes in 10^3 steps, from `q`
//! (1e-30) up to `Q` (1e30): `"1.5M"` parses to `1_500_000.0`, and
//! `1_500_000.0` formats back to `"1.5M"` at precision 1. Both `k` and
//! `K` mean kilo on input; output always uses the canonical symbol.

/// Multiplier for a magnitude suffix, if recognized.
fn suffix_factor(c: char) -> Option<f64> {
    Some(match c {
        'q' => 1e-30,
        'r' => 1e-27,
        'y' => 1e-24,
        'z' => 1e-21,
        'a' => 1e-18,
        'f' => 1e-15,
        'p' => 1e-12,
        'n' => 1e-9,
        '\u{03BC}' => 1e-6,
        'm' => 1e-3,
        'k' | 'K' => 1e3,
        'M' => 1e6,
        'G' => 1e9,
        'T' => 1e12,
        'P' => 1e15,
        'E' => 1e18,
        'Z' => 1e21,
        'Y' => 1e24,
        'R' => 1e27,
        'Q' => 1e30,
        _ => return None,
    })
}

/// Canonical suffix for a 10^3 exponent step.
fn suffix_symbol(step: i32) -> &'static str {
    match step {
        -30 => "q",
        -27 => "r",
        -24 => "y",
        -21 => "z",
        -18 => "a",
        -15 => "f",
        -12 => "p",
        -9 => "n",
        -6 => "\u{03BC}",
        -3 => "m",
        0 => "",
        3 => "k",
        6 => "M",
        9 => "G",
        12 => "T",
        15 => "P",
        18 => "E",
        21 => "Z",
        24 => "Y",
        27 => "R",
        _ => "Q",
    }
}

fn is_plain_number(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| c.is_ascii_digit() || c == '.')
        && s.chars().filter(|&c| c == '.').count() <= 1
        && s.chars().any(|c| c.is_ascii_digit())
}

/// Parse a number with an optional magnitude suffix (`"300"`, `"2.5k"`,
/// `"1.5M"`). Signs are not part of the accepted grammar; anything that
/// does not match yields `None`.
pub fn parse_magnitude(input: &str) -> Option<f64> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if is_plain_number(s) {
        return s.parse::<f64>().ok();
    }
    let last = s.chars().last()?;
    let head = &s[..s.len() - last.len_utf8()];
    let factor = suffix_factor(last)?;
    if is_plain_number(head) {
        head.parse::<f64>().ok().map(|v| v * factor)
    } else {
        None
    }
}

/// Format a number with the nearest magnitude suffix at the requested
/// precision. The suffix step never crosses zero: `0.05` stays `"0.05"`
/// rather than becoming a milli-scaled value.
pub fn format_magnitude(n: f64, precision: usize) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let exp = n.abs().log10().floor() as i32;
    let step = if exp >= 0 {
        exp.div_euclid(3) * 3
    } else {
        (exp + 2).div_euclid(3) * 3
    }
    .clamp(-30, 30);
    let scaled = n / 10f64.powi(step);
    let body = if precision == 0 {
        format!("{}", scaled.round_ties_even() as i64)
    } else {
        let s = format!("{:.*}", precision, scaled);
        // Drop an all-zero fractional part ("2.00" -> "2").
        match s.split_once('.') {
            Some((int, frac)) if frac.bytes().all(|b| b == b'0') => int.to_string(),
            _ => s,
        }
    };
    format!("{}{}", body, suffix_symbol(step))
}

/// Rounding direction for [`round_dp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Nearest,
    Floor,
    Ceil,
}

/// Round to a fixed number of decimal places.
pub fn round_dp(n: f64, decimals: u32, rounding: Rounding) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let scaled = n * factor;
    let r = match rounding {
        Rounding::Nearest => scaled.round_ties_even(),
        Rounding::Floor => scaled.floor(),
        Rounding::Ceil => scaled.ceil(),
    };
    r / factor
}
