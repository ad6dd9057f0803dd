//! SVG document composition.
//!
//! The base template is a CSS-classed world map: every country is a
//! `<g id="xx">` group whose shapes carry class selectors (`landxx`,
//! `coastxx`, continent names, the country code). Compilation never
//! touches the geometry; it splices a generated stylesheet into the
//! template's `<defs>`, appends legend and caption groups before the
//! closing tag and rewrites the viewport to the crop box.

use crate::color::{self, Rgb};
use crate::error::{MapError, Result};
use crate::layout::{self, CONTINENTS, Layout, LayoutBox, RegionSelection};
use crate::models::{
    CountryCode, Diagnostic, IntensityMap, LegendLanguage, LegendMode, MapConfig, ValueMap,
};
use crate::numfmt::{Rounding, format_magnitude, round_dp};
use crate::palette::{self, PaletteDirectory};
use crate::thresholds::{self, Task};
use crate::wrap;
use regex::{NoExpand, Regex};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

fn group_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\n<g id="([A-Za-z]{2})">"#).unwrap())
}

fn viewport_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"width="\d+\.?\d*" height="\d+\.?\d*" viewBox="(?:\d+\.?\d*\s){3}\d+\.?\d*""#)
            .unwrap()
    })
}

/// A parsed base template, split at its structural markers so the
/// stylesheet and overlay groups can be spliced in.
#[derive(Debug, Clone)]
pub struct MapTemplate {
    /// Everything before the `<style>` block.
    intro: String,
    /// Everything after `</defs>`, with the closing `</svg>` removed.
    body: String,
    /// Country groups present in the template.
    countries: BTreeSet<CountryCode>,
}

impl MapTemplate {
    pub fn parse(source: &str) -> Result<Self> {
        let style_at = source
            .find("<style type=\"text/css\">")
            .ok_or(MapError::MalformedTemplate("missing <style> block"))?;
        let defs_end = source
            .find("</defs>")
            .ok_or(MapError::MalformedTemplate("missing </defs> marker"))?;
        let countries = group_re()
            .captures_iter(source)
            .filter_map(|c| CountryCode::parse(&c[1]))
            .collect();
        Ok(Self {
            intro: source[..style_at].to_string(),
            body: source[defs_end + "</defs>".len()..].replace("</svg>", ""),
            countries,
        })
    }

    pub fn countries(&self) -> &BTreeSet<CountryCode> {
        &self.countries
    }

    pub fn contains(&self, country: CountryCode) -> bool {
        self.countries.contains(&country)
    }

    fn splice(&self, css: &str, legend: &str, caption: &str, crop: LayoutBox) -> String {
        let intro = format!(
            "{}<style type=\"text/css\">{css}    </style>\n</defs>",
            self.intro
        );
        let intro = viewport_re()
            .replace(&intro, NoExpand(&viewport(crop)))
            .into_owned();
        let gap = if !legend.is_empty() && !caption.is_empty() {
            "\n"
        } else {
            ""
        };
        format!("{intro}{}{legend}{gap}{caption}\n</svg>", self.body)
    }
}

/// Format a geometry number: rounded to 3 decimals, no trailing zeros.
fn num(x: f64) -> String {
    format!("{}", round_dp(x, 3, Rounding::Nearest))
}

/// Viewport attributes for a crop box. The pixel size is ten times the
/// template units, so continental crops still rasterize sharply.
fn viewport(crop: LayoutBox) -> String {
    let w = round_dp(crop.width(), 3, Rounding::Nearest);
    let h = round_dp(crop.height(), 3, Rounding::Nearest);
    format!(
        "width=\"{}\" height=\"{}\" viewBox=\"{} {} {} {}\"",
        num(w * 10.0),
        num(h * 10.0),
        num(crop.x0),
        num(crop.y0),
        w,
        h
    )
}

/// Generated stylesheet: base classes recolored, unselected continents
/// hidden, extended selections forced visible and one fill rule per
/// used bin.
fn css_block(
    intensities: &IntensityMap,
    palette: &[Rgb],
    template: &MapTemplate,
    missing: Rgb,
    ocean: Rgb,
    regions: &RegionSelection,
) -> String {
    let mut continent_rules = String::new();
    if !regions.is_world() {
        let selected: BTreeSet<&str> = regions
            .specs()
            .iter()
            .map(|s| s.region.css_name())
            .collect();
        let hidden: Vec<String> = CONTINENTS
            .iter()
            .filter(|r| !selected.contains(r.css_name()))
            .map(|r| format!(".{}", r.css_name()))
            .collect();
        if !hidden.is_empty() {
            continent_rules.push_str(&format!(
                "{}\n        {{\n        opacity: 0;\n        }}",
                hidden.join(", ")
            ));
        }
        // Extended territories sit outside their continent's group, so
        // they need an explicit opacity override.
        let shown: Vec<String> = regions
            .specs()
            .iter()
            .filter(|s| s.extended)
            .map(|s| format!(".{}", s.region.css_name()))
            .collect();
        if !shown.is_empty() {
            continent_rules.push_str(&format!(
                "\n        {}\n        {{\n        opacity: 1;\n        }}",
                shown.join(", ")
            ));
        }
    }

    let frame_opacity = if regions.is_world() { 0 } else { 1 };
    let mut fill_rules = String::new();
    for (bin, countries) in intensities {
        let selectors: Vec<String> = countries
            .iter()
            .filter(|c| template.contains(**c))
            .map(|c| c.selector())
            .collect();
        if selectors.is_empty() {
            continue;
        }
        fill_rules.push_str(&format!(
            "        {}\n        {{\n        fill: {};\n        fill-opacity: 1;\n        }}\n",
            selectors.join(", "),
            palette[*bin].to_css()
        ));
    }

    format!(
        r#"
        /* Oval frame */
        .framexx
        {{
        fill: {ocean};
        opacity: {frame_opacity};
        }}

        /* Oceans, seas and lakes */
        .oceanxx
        {{
        opacity: 1;
        fill: {ocean};
        stroke: {ocean};
        stroke-width: 0.1;
        stroke-miterlimit: 1;
        }}

        /* Mainland */
        .landxx
        {{
        fill: {missing};
        stroke: #ffffff;
        stroke-width: 0.5;
        }}

        /* Small islands */
        .smallxx
        {{
        fill: {missing};
        stroke: #ffffff;
        stroke-width: 0.2;
        }}

        /* Land within a country */
        .inlandxx
        {{
        fill: {missing};
        fill-opacity: 0;
        }}

        /* Land with no borders */
        .coastxx
        {{
        fill: {missing};
        stroke: #ffffff;
        stroke-width: 0.2;
        }}

        /* Circles around small countries */
        .circlexx
        {{
        fill: {missing};
        fill-opacity: 0;
        }}

        /* Show continents */
        {continent_rules}

        /* Color countries */
{fill_rules}"#,
        ocean = ocean.to_css(),
        missing = missing.to_css(),
    )
}

/// Phrase fragments of one legend language. Entities are HTML-escaped
/// because the fragments land verbatim inside `<text>` nodes.
struct Phrases {
    below: &'static str,
    between: &'static str,
    and: &'static str,
    above: &'static str,
    extremes: [&'static str; 2],
}

fn phrases(language: LegendLanguage) -> Phrases {
    match language {
        LegendLanguage::En => Phrases {
            below: "less than ",
            between: "between ",
            and: " and ",
            above: "more than ",
            extremes: ["Lowest", "Highest"],
        },
        LegendLanguage::Es => Phrases {
            below: "menos de ",
            between: "entre ",
            and: " y ",
            above: "m&#225;s de ",
            extremes: ["M&#237;nimo", "M&#225;ximo"],
        },
        LegendLanguage::De => Phrases {
            below: "weniger als ",
            between: "zwischen ",
            and: " und ",
            above: "mehr als ",
            extremes: ["Minimum", "Maximal"],
        },
        LegendLanguage::Math => Phrases {
            below: "&#60; ",
            between: "",
            and: " &#8211; ",
            above: "&#8805; ",
            extremes: ["minimum", "maximum"],
        },
        LegendLanguage::Nerd => Phrases {
            below: "x &#60; ",
            between: "",
            and: " &#8804; x &#60; ",
            above: "x &#8805; ",
            extremes: ["min(x)", "max(x)"],
        },
    }
}

/// Legend rows, stacked upward from the anchor. Every measurement is
/// multiplied by the layout scale so the legend keeps its apparent size
/// under any crop. Returns an empty string (with a diagnostic) when an
/// automatic legend has no thresholds to describe.
#[allow(clippy::too_many_arguments)]
fn legend_block(
    thresholds: &[f64],
    intensities: &IntensityMap,
    palette: &[Rgb],
    layout: &Layout,
    aliases: Option<&BTreeMap<usize, String>>,
    config: &MapConfig,
    text_color: Rgb,
    diagnostics: &mut Vec<Diagnostic>,
) -> String {
    let lang = phrases(config.language);
    let (sentences, colors): (Vec<String>, Vec<Rgb>) = match (aliases, config.legend) {
        (Some(aliases), _) => (
            aliases.values().cloned().collect(),
            palette.to_vec(),
        ),
        (None, LegendMode::Extremes) => (
            lang.extremes.iter().map(|s| s.to_string()).collect(),
            vec![palette[0], palette[palette.len() - 1]],
        ),
        (None, _) => {
            if thresholds.is_empty() {
                let diagnostic = Diagnostic {
                    requested: "automatic legend".to_string(),
                    substitute: "no legend".to_string(),
                    detail: "the data produced no thresholds, so there are no value ranges to describe".to_string(),
                };
                log::warn!("{diagnostic}");
                diagnostics.push(diagnostic);
                return String::new();
            }
            let fmt = |t: f64| format_magnitude(t, config.decimals);
            let mut sentences = vec![format!("{}{}", lang.below, fmt(thresholds[0]))];
            sentences.extend(thresholds.windows(2).map(|w| {
                format!("{}{}{}{}", lang.between, fmt(w[0]), lang.and, fmt(w[1]))
            }));
            sentences.push(format!("{}{}", lang.above, fmt(thresholds[thresholds.len() - 1])));
            if config.used_bins_only {
                let used: Vec<usize> = intensities
                    .iter()
                    .filter(|(_, countries)| !countries.is_empty())
                    .map(|(bin, _)| *bin)
                    .collect();
                (
                    used.iter().map(|i| sentences[*i].clone()).collect(),
                    used.iter().map(|i| palette[*i]).collect(),
                )
            } else {
                (sentences, palette.to_vec())
            }
        }
    };

    let scale = layout.scale;
    let (x, y_base) = layout.legend_anchor;
    let stroke = text_color.to_css();
    let line_step = -scale * 20.0;
    let mut rows = String::new();
    for (i, (fill, sentence)) in colors.iter().zip(&sentences).enumerate() {
        let y = y_base + line_step * i as f64;
        rows.push_str(&format!(
            "\n    <rect fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{sw}\" x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" rx=\"{rx}\" ry=\"{ry}\"/>\
             \n    <text x=\"{tx}\" y=\"{ty}\" fill=\"{stroke}\" font-size=\"{fs}px\" class=\"textxx\">{sentence}</text>",
            fill = fill.to_css(),
            sw = num(scale),
            x = num(x),
            y = num(y),
            w = num(scale * 30.0),
            h = num(scale * 15.0),
            rx = num(scale * 5.0),
            ry = num(scale * 7.0),
            tx = num(x + scale * 37.0),
            ty = num(y + scale * 13.0),
            fs = num(scale * 15.0),
        ));
    }
    format!("<g id=\"legend\" class=\"legend\">{rows}\n</g>")
}

/// Escape a caption line for a `<text>` node: anything outside
/// `[A-Za-z0-9 ]` becomes a decimal character reference.
fn escape_caption(line: &str) -> String {
    line.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == ' ' {
                c.to_string()
            } else {
                format!("&#{};", c as u32)
            }
        })
        .collect()
}

/// Caption block, centered under the crop. Lines are emitted bottom-up
/// with negative `dy` steps so the block grows away from the map edge.
fn caption_block(text: &str, layout: &Layout, text_color: Rgb) -> String {
    let crop = layout.crop;
    let font_size = layout.scale * 20.0;
    let line_width = ((crop.width() / font_size).floor() as usize).max(1);
    let x = round_dp(
        crop.width() / 2.0 + crop.x0 - line_width as f64 / 2.0 * font_size / 2.0,
        3,
        Rounding::Nearest,
    );
    let y = round_dp(crop.y1 - font_size, 3, Rounding::Nearest);
    let tspans: Vec<String> = wrap::center_paragraph(text, line_width, None)
        .lines()
        .rev()
        .map(|line| {
            format!(
                "        <tspan x=\"{x}\" dy=\"{}\">{}</tspan>",
                num(-font_size),
                escape_caption(line)
            )
        })
        .collect();
    format!(
        "<g id=\"text_box\" class=\"text_box\">\n    <text x=\"{x}\" y=\"{}\" fill=\"{}\" font-size=\"{}px\" class=\"textxx\">\n{}\n    </text>\n</g>",
        num(y + font_size),
        text_color.to_css(),
        num(font_size),
        tspans.join("\n")
    )
}

/// Labels for the `values` task when none are given: one per distinct
/// value, ascending.
fn value_aliases(data: &ValueMap, decimals: usize) -> BTreeMap<usize, String> {
    let mut vals: Vec<f64> = data.values().copied().collect();
    vals.sort_by(|a, b| a.partial_cmp(b).expect("finite values"));
    vals.dedup();
    vals.iter()
        .enumerate()
        .map(|(i, v)| (i, format_magnitude(*v, decimals)))
        .collect()
}

/// Compile one choropleth document.
///
/// Pure with respect to its inputs: the same data, configuration,
/// template and palette directory always produce the same document.
/// Every substitution made along the way is returned as a diagnostic
/// (and mirrored to the log); only unrecoverable configuration errors
/// fail the compilation.
pub fn compose_map(
    data: &ValueMap,
    config: &MapConfig,
    template: &MapTemplate,
    directory: &PaletteDirectory,
) -> Result<(String, Vec<Diagnostic>)> {
    let mut diagnostics = Vec::new();

    let thresholds =
        thresholds::make_thresholds(&config.task, data, config.smart, &mut diagnostics);
    let intensities = thresholds::classify(data, &thresholds);
    let palette = palette::resolve(
        &config.palette,
        thresholds.len() + 1,
        config.smart,
        config.invert_palette,
        config.fallback_family,
        directory,
        &mut diagnostics,
    )?;

    let aliases = config.aliases.clone().or_else(|| {
        matches!(config.task, Task::Values).then(|| value_aliases(data, config.decimals))
    });

    let with_legend = config.legend != LegendMode::Off;
    let layout = layout::compute(&config.regions, with_legend, config.caption.is_some())?;

    let ocean = color::parse_color(&config.ocean_color)?;
    let missing = color::parse_color(&config.missing_color)?;
    // Legend and caption sit on the ocean, so their text contrast is
    // chosen against it.
    let text_color = ocean.contrast_text();

    let css = css_block(
        &intensities,
        &palette,
        template,
        missing,
        ocean,
        &config.regions,
    );
    let legend = if with_legend {
        legend_block(
            &thresholds,
            &intensities,
            &palette,
            &layout,
            aliases.as_ref(),
            config,
            text_color,
            &mut diagnostics,
        )
    } else {
        String::new()
    };
    let caption = config
        .caption
        .as_deref()
        .map(|text| caption_block(text, &layout, text_color))
        .unwrap_or_default();

    Ok((template.splice(&css, &legend, &caption, layout.crop), diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<svg version="1.1" id="Earth" xmlns="http://www.w3.org/2000/svg" width="1000" height="507.209" viewBox="0 0 1000 507.209" xml:space="preserve">
<defs><style type="text/css"><![CDATA[ text { cursor: default; } ]]></style></defs>
<rect class="framexx" id="frame" x="0" y="0" width="1000" height="507.209"/>
<path class="oceanxx" id="ocean" d="M0,0h1000v507.209H0z"/>
<g id="de">
<path class="landxx europe de" id="de-main" d="M10,10h5v5z"/>
</g>
<g id="us">
<path class="landxx north_america us" id="us-main" d="M20,20h5v5z"/>
</g>
<g id="br">
<path class="landxx south_america br" id="br-main" d="M30,30h5v5z"/>
</g>
</svg>"#;

    #[test]
    fn template_collects_country_groups() {
        let t = MapTemplate::parse(TEMPLATE).unwrap();
        let codes: Vec<&str> = t.countries().iter().map(|c| c.as_str()).collect();
        assert_eq!(codes, vec!["br", "de", "us"]);
    }

    #[test]
    fn template_without_markers_is_rejected() {
        assert!(matches!(
            MapTemplate::parse("<svg></svg>"),
            Err(MapError::MalformedTemplate(_))
        ));
    }

    #[test]
    fn viewport_scales_pixels_tenfold() {
        let crop = LayoutBox::new(392.971, 126.133, 640.717, 372.914);
        assert_eq!(
            viewport(crop),
            "width=\"2477.46\" height=\"2467.81\" viewBox=\"392.971 126.133 247.746 246.781\""
        );
    }

    #[test]
    fn caption_escapes_non_alphanumerics() {
        assert_eq!(escape_caption("a-b (c)"), "a&#45;b &#40;c&#41;");
        assert_eq!(escape_caption("plain words 42"), "plain words 42");
        assert_eq!(escape_caption("m\u{e1}s de 1\u{20ac}"), "m&#225;s de 1&#8364;");
    }

    #[test]
    fn value_aliases_are_sorted_and_formatted() {
        let data: ValueMap = [("us", 2_000_000.0), ("de", 1_000.0), ("br", 2_000_000.0)]
            .iter()
            .map(|(c, v)| (CountryCode::parse(c).unwrap(), *v))
            .collect();
        let aliases = value_aliases(&data, 0);
        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases[&0], "1k");
        assert_eq!(aliases[&1], "2M");
    }
}
