use anyhow::{Context, Result};
use choromap::{
    LegendLanguage, LegendMode, MapConfig, PaletteDirectory, PaletteFamily, RegionSelection,
    compose_map, storage,
};
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "choromap",
    version,
    about = "Color a world map by country from numeric data, using 2-digit ISO codes"
)]
struct Cli {
    /// Path to the CSV file with the data (country code, value).
    data_file: PathBuf,
    /// Path for the generated SVG map. Defaults to the data file name.
    #[arg(short = 'z', long)]
    out: Option<PathBuf>,
    /// CSV separator character.
    #[arg(short = 'c', long, default_value = ",")]
    separator: String,
    /// How to segment the data into colored bins ("values", "b:N",
    /// "t:a,b,...", "sign", "mean", "median", "std").
    #[arg(short, long, default_value = "values")]
    task: String,
    /// Regions to draw: any combination of the continents and "world",
    /// each optionally suffixed with "*" for intercontinental territory.
    #[arg(short = 'm', long, num_args = 0..)]
    regions: Vec<String>,
    /// Recover from palette misses and out-of-range thresholds.
    #[arg(short, long, default_value = "true", action = ArgAction::Set, value_parser = parse_switch)]
    smart: bool,
    /// Palette name, or sequence of hex/RGB colors joined with "_".
    #[arg(short, long, default_value = "RdYlBu")]
    palette: String,
    /// Use the palette colors in inverted order.
    #[arg(short, long)]
    invert: bool,
    /// Safe palette family to synthesize when resolution fails.
    #[arg(short, long, value_enum, default_value_t = FamilyArg::Reds)]
    fallback: FamilyArg,
    /// Color for countries missing from the data.
    #[arg(short = 'g', long, default_value = "#e6e6e6")]
    missing: String,
    /// Color for oceans, seas and lakes.
    #[arg(short, long, default_value = "255,255,255")]
    ocean: String,
    /// Legend mode.
    #[arg(short, long, value_enum, default_value_t = LegendArg::Auto)]
    legend: LegendArg,
    /// Path to a JSON file mapping bin indices to legend labels.
    #[arg(short = 'k', long)]
    aliases: Option<PathBuf>,
    /// Language of the generated legend phrases.
    #[arg(short = 'a', long, value_enum, default_value_t = LangArg::Math)]
    language: LangArg,
    /// Decimals for the numbers in the legend.
    #[arg(short = 'e', long, default_value_t = 0)]
    decimals: usize,
    /// Drop legend entries for bins with no countries.
    #[arg(short = 'y', long, default_value = "true", action = ArgAction::Set, value_parser = parse_switch)]
    used_only: bool,
    /// Caption text displayed under the map.
    #[arg(short = 'x', long)]
    caption: Option<String>,
    /// Path to the base template SVG.
    #[arg(long, default_value = "maps/World.svg")]
    template: PathBuf,
    /// Path to a custom palette directory JSON. Defaults to the
    /// embedded ColorBrewer table.
    #[arg(long)]
    palettes: Option<PathBuf>,
}

/// Accept the usual truth words for boolean switches, not just
/// "true"/"false".
fn parse_switch(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        other => Err(format!("invalid truth value {other:?}")),
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FamilyArg {
    Reds,
    Greens,
    Blues,
    /// Disable the synthesized fallback; resolution failures become errors.
    None,
}

impl FamilyArg {
    fn to_family(self) -> Option<PaletteFamily> {
        match self {
            FamilyArg::Reds => Some(PaletteFamily::Reds),
            FamilyArg::Greens => Some(PaletteFamily::Greens),
            FamilyArg::Blues => Some(PaletteFamily::Blues),
            FamilyArg::None => None,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LegendArg {
    Off,
    Auto,
    Extremes,
}

impl From<LegendArg> for LegendMode {
    fn from(arg: LegendArg) -> Self {
        match arg {
            LegendArg::Off => LegendMode::Off,
            LegendArg::Auto => LegendMode::Auto,
            LegendArg::Extremes => LegendMode::Extremes,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LangArg {
    En,
    Es,
    De,
    Math,
    Nerd,
}

impl From<LangArg> for LegendLanguage {
    fn from(arg: LangArg) -> Self {
        match arg {
            LangArg::En => LegendLanguage::En,
            LangArg::Es => LegendLanguage::Es,
            LangArg::De => LegendLanguage::De,
            LangArg::Math => LegendLanguage::Math,
            LangArg::Nerd => LegendLanguage::Nerd,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let separator = match cli.separator.as_bytes() {
        [b] => *b,
        _ => anyhow::bail!("--separator must be a single byte"),
    };

    let template = storage::load_template(&cli.template)?;
    let data = storage::load_csv(&cli.data_file, separator, &template)?;
    let aliases = cli.aliases.as_ref().map(storage::load_aliases).transpose()?;
    let directory = match cli.palettes.as_ref() {
        Some(path) => storage::load_palettes(path)?,
        None => PaletteDirectory::builtin().clone(),
    };

    let config = MapConfig {
        task: cli.task.parse().context("parse --task")?,
        regions: RegionSelection::parse(&cli.regions)?,
        smart: cli.smart,
        palette: cli.palette,
        invert_palette: cli.invert,
        fallback_family: cli.fallback.to_family(),
        missing_color: cli.missing,
        ocean_color: cli.ocean,
        legend: cli.legend.into(),
        aliases,
        language: cli.language.into(),
        decimals: cli.decimals,
        used_bins_only: cli.used_only,
        caption: cli.caption,
    };

    let (document, diagnostics) = compose_map(&data, &config, &template, &directory)?;
    for diagnostic in &diagnostics {
        eprintln!("warning: {diagnostic}");
    }

    let out = cli.out.unwrap_or_else(|| {
        let stem = cli
            .data_file
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| "my_map".into());
        PathBuf::from(stem).with_extension("svg")
    });
    storage::save_svg(&document, &out)?;
    eprintln!("Wrote map for {} countries to {}", data.len(), out.display());
    Ok(())
}
