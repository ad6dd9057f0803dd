//! File loading and saving around the compilation pipeline.
//!
//! Data files are two-column CSVs (country code, value) with no
//! header. Rows that do not name a country present in the base
//! template, or whose value the magnitude grammar cannot read, are
//! dropped with a warning instead of failing the whole load.

use crate::models::{CountryCode, ValueMap};
use crate::numfmt::parse_magnitude;
use crate::palette::PaletteDirectory;
use crate::svg::MapTemplate;
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Load a country/value CSV, keeping only rows that resolve against
/// the template. Later rows win on duplicate countries.
pub fn load_csv<P: AsRef<Path>>(
    path: P,
    separator: u8,
    template: &MapTemplate,
) -> Result<ValueMap> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(separator)
        .flexible(true)
        .from_path(path.as_ref())
        .with_context(|| format!("open data file {}", path.as_ref().display()))?;
    let mut data = ValueMap::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("read data row {}", line + 1))?;
        let country = record.get(0).and_then(CountryCode::parse);
        let value = record.get(1).and_then(|v| parse_magnitude(v.trim()));
        match (country, value) {
            (Some(country), Some(value)) if template.contains(country) => {
                data.insert(country, value);
            }
            _ => {
                log::warn!(
                    "dropping data row {}: {:?} is not a mappable country/value pair",
                    line + 1,
                    record.iter().collect::<Vec<_>>()
                );
            }
        }
    }
    Ok(data)
}

/// Load legend aliases: a JSON object from bin index to label.
pub fn load_aliases<P: AsRef<Path>>(path: P) -> Result<BTreeMap<usize, String>> {
    let text = fs::read_to_string(path.as_ref())
        .with_context(|| format!("open aliases file {}", path.as_ref().display()))?;
    serde_json::from_str(&text).context("parse aliases JSON")
}

/// Load and parse a base template SVG.
pub fn load_template<P: AsRef<Path>>(path: P) -> Result<MapTemplate> {
    let source = fs::read_to_string(path.as_ref())
        .with_context(|| format!("open base template {}", path.as_ref().display()))?;
    MapTemplate::parse(&source).context("parse base template")
}

/// Load a palette directory from a ColorBrewer-style JSON file.
pub fn load_palettes<P: AsRef<Path>>(path: P) -> Result<PaletteDirectory> {
    let text = fs::read_to_string(path.as_ref())
        .with_context(|| format!("open palette directory {}", path.as_ref().display()))?;
    PaletteDirectory::from_json(&text)
}

/// Write the compiled document.
pub fn save_svg<P: AsRef<Path>>(document: &str, path: P) -> Result<()> {
    fs::write(path.as_ref(), document)
        .with_context(|| format!("write map to {}", path.as_ref().display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    const TEMPLATE: &str = r#"<svg width="1000" height="507.209" viewBox="0 0 1000 507.209">
<defs><style type="text/css"><![CDATA[ text { cursor: default; } ]]></style></defs>
<g id="de">
<path class="landxx europe de" id="de-main" d="M10,10h5v5z"/>
</g>
<g id="us">
<path class="landxx north_america us" id="us-main" d="M20,20h5v5z"/>
</g>
</svg>"#;

    #[test]
    fn csv_rows_resolve_against_the_template() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "DE,1.5k").unwrap();
        writeln!(f, "us,200").unwrap();
        writeln!(f, "zz,3").unwrap(); // not in the template
        writeln!(f, "de,not a number").unwrap();
        drop(f);

        let template = MapTemplate::parse(TEMPLATE).unwrap();
        let data = load_csv(&path, b',', &template).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[&CountryCode::parse("de").unwrap()], 1500.0);
        assert_eq!(data[&CountryCode::parse("us").unwrap()], 200.0);
    }

    #[test]
    fn later_duplicate_rows_win() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "de,1\nde,2\n").unwrap();
        let template = MapTemplate::parse(TEMPLATE).unwrap();
        let data = load_csv(&path, b',', &template).unwrap();
        assert_eq!(data[&CountryCode::parse("de").unwrap()], 2.0);
    }

    #[test]
    fn aliases_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        fs::write(&path, r#"{"0": "low", "1": "high"}"#).unwrap();
        let aliases = load_aliases(&path).unwrap();
        assert_eq!(aliases[&0], "low");
        assert_eq!(aliases[&1], "high");
    }

    #[test]
    fn svg_is_written_verbatim() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.svg");
        save_svg("<svg/>", &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<svg/>");
    }
}
