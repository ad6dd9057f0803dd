//! choromap
//!
//! A choropleth compiler: turns country/value data into a colored SVG
//! world map. Pairs with the `choromap` CLI.
//!
//! ### Features
//! - Threshold tasks: distinct values, equal-width bins, explicit
//!   boundaries, sign, mean, median or standard deviation
//! - ColorBrewer palette resolution with smart fallbacks and a
//!   synthesized last-resort ramp
//! - Continental crops with an auto-placed, auto-scaled legend
//! - Magnitude-suffixed numbers (`1.5k`, `2M`) on both ends
//!
//! ### Example
//! ```no_run
//! use choromap::{MapConfig, MapTemplate, PaletteDirectory};
//!
//! let template = MapTemplate::parse(&std::fs::read_to_string("World.svg")?)?;
//! let data = choromap::storage::load_csv("gdp.csv", b',', &template)?;
//! let config = MapConfig {
//!     task: "b:5".parse()?,
//!     ..MapConfig::default()
//! };
//! let (document, diagnostics) =
//!     choromap::compose_map(&data, &config, &template, PaletteDirectory::builtin())?;
//! for d in &diagnostics {
//!     eprintln!("{d}");
//! }
//! choromap::storage::save_svg(&document, "gdp.svg")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod color;
pub mod error;
pub mod layout;
pub mod models;
pub mod numfmt;
pub mod palette;
pub mod stats;
pub mod storage;
pub mod svg;
pub mod thresholds;
pub mod wrap;

pub use error::{MapError, PaletteError};
pub use layout::RegionSelection;
pub use models::{
    CountryCode, Diagnostic, LegendLanguage, LegendMode, MapConfig, PaletteFamily, ValueMap,
};
pub use palette::PaletteDirectory;
pub use svg::{MapTemplate, compose_map};
pub use thresholds::Task;
