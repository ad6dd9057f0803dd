//! Map layout: continent selection, crop box and scale.
//!
//! The base template is a fixed 1000 x 507.209 world projection. A
//! region selection is resolved against a static table of continent
//! bounding boxes, merged into one crop box, grown for the legend and
//! caption, padded with an aspect-weighted margin and clamped back to
//! the world. The vertical crop ratio becomes the `scale` every legend
//! and caption measurement is multiplied by.

use crate::error::{MapError, Result};
use crate::numfmt::{Rounding, round_dp};
use std::str::FromStr;

/// Axis-aligned box, top-left `(x0, y0)` to bottom-right `(x1, y1)` in
/// template units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl LayoutBox {
    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    fn hull(self, other: LayoutBox) -> LayoutBox {
        LayoutBox::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }
}

/// Bounds of the whole template.
pub const WORLD: LayoutBox = LayoutBox::new(0.0, 0.0, 1000.0, 507.209);

/// Continents of the base template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Region {
    Africa,
    Antarctica,
    Asia,
    Europe,
    NorthAmerica,
    Oceania,
    SouthAmerica,
    World,
}

/// The seven continents, in CSS class order.
pub const CONTINENTS: [Region; 7] = [
    Region::Africa,
    Region::Antarctica,
    Region::Asia,
    Region::Europe,
    Region::NorthAmerica,
    Region::Oceania,
    Region::SouthAmerica,
];

impl Region {
    /// CSS class used for this continent's territories in the base
    /// template.
    pub fn css_name(self) -> &'static str {
        match self {
            Region::Africa => "africa",
            Region::Antarctica => "antarctica",
            Region::Asia => "asia",
            Region::Europe => "europe",
            Region::NorthAmerica => "north_america",
            Region::Oceania => "oceania",
            Region::SouthAmerica => "south_america",
            Region::World => "world",
        }
    }
}

/// One region token: a continent, optionally extended (`*` suffix) to
/// include intercontinental territory. Only Asia and Europe have a
/// distinct extended box (both grow into Russia); for every other
/// region the marker is accepted and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSpec {
    pub region: Region,
    pub extended: bool,
}

impl FromStr for RegionSpec {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim().to_lowercase();
        let (name, extended) = match token.strip_suffix('*') {
            Some(base) => (base.to_string(), true),
            None => (token, false),
        };
        let region = match name.as_str() {
            "africa" => Region::Africa,
            "antarctica" => Region::Antarctica,
            "asia" => Region::Asia,
            "europe" => Region::Europe,
            "north_america" => Region::NorthAmerica,
            "oceania" => Region::Oceania,
            "south_america" => Region::SouthAmerica,
            "world" => Region::World,
            _ => return Err(MapError::UnknownRegionToken(s.to_string())),
        };
        Ok(Self { region, extended })
    }
}

impl RegionSpec {
    /// Bounding box in template units. The coordinates come from the
    /// outermost territories of each continent in the base template
    /// (e.g. Cabo Verde on the west of Africa, Mauritius on the east).
    fn bounds(self) -> LayoutBox {
        match (self.region, self.extended) {
            (Region::Africa, _) => LayoutBox::new(403.011, 136.133, 630.677, 362.914),
            (Region::Antarctica, _) => LayoutBox::new(194.460, 405.910, 818.338, 507.134),
            (Region::Asia, false) => LayoutBox::new(564.185, 86.178, 863.661, 287.894),
            (Region::Asia, true) => LayoutBox::new(522.679, 11.540, 876.918, 287.894),
            (Region::Europe, false) => LayoutBox::new(399.800, 13.748, 573.056, 166.599),
            (Region::Europe, true) => LayoutBox::new(399.800, 11.540, 603.163, 166.599),
            (Region::NorthAmerica, _) => LayoutBox::new(36.947, 8.303, 462.990, 236.687),
            (Region::Oceania, _) => LayoutBox::new(775.712, 203.210, 996.932, 422.850),
            (Region::SouthAmerica, _) => LayoutBox::new(179.160, 214.463, 375.768, 427.896),
            (Region::World, _) => WORLD,
        }
    }
}

/// The set of regions to keep visible. Empty means the whole world.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionSelection(Vec<RegionSpec>);

impl RegionSelection {
    pub fn parse<S: AsRef<str>>(tokens: impl IntoIterator<Item = S>) -> Result<Self> {
        tokens
            .into_iter()
            .map(|t| t.as_ref().parse())
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    pub fn specs(&self) -> &[RegionSpec] {
        &self.0
    }

    /// Whether the selection collapses to the full world view.
    pub fn is_world(&self) -> bool {
        self.0.is_empty() || self.0.iter().any(|s| s.region == Region::World)
    }
}

/// Pad a box by `add` units on the narrow axis and proportionally more
/// on the wide one, keeping the result inside `limits`. Padded edges
/// are floored (top-left) and ceiled (bottom-right) at 3 decimals so
/// the crop never clips content.
pub fn add_margins(bbox: LayoutBox, add: f64, limits: LayoutBox) -> Result<LayoutBox> {
    if limits.x1 <= limits.x0 || limits.y1 <= limits.y0 {
        return Err(MapError::InvalidLayoutBounds {
            x0: limits.x0,
            y0: limits.y0,
            x1: limits.x1,
            y1: limits.y1,
        });
    }
    let (width, height) = (bbox.width(), bbox.height());
    let (wratio, hratio) = if width > height {
        (width / height, 1.0)
    } else {
        (1.0, height / width)
    };
    Ok(LayoutBox::new(
        round_dp(bbox.x0 - add * wratio, 3, Rounding::Floor).max(limits.x0),
        round_dp(bbox.y0 - add * hratio, 3, Rounding::Floor).max(limits.y0),
        round_dp(bbox.x1 + add * wratio, 3, Rounding::Ceil).min(limits.x1),
        round_dp(bbox.y1 + add * hratio, 3, Rounding::Ceil).min(limits.y1),
    ))
}

/// Resolved geometry of one map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    /// Final crop box, margins applied.
    pub crop: LayoutBox,
    /// Top-left corner of the legend block.
    pub legend_anchor: (f64, f64),
    /// Vertical crop ratio, rounded to 3 decimals. All legend and
    /// caption measurements are multiplied by this.
    pub scale: f64,
}

/// Compute the crop box, legend anchor and scale for a selection.
/// `with_legend` and `with_caption` grow the crop so those blocks are
/// never cut off.
pub fn compute(
    selection: &RegionSelection,
    with_legend: bool,
    with_caption: bool,
) -> Result<Layout> {
    if selection.is_world() {
        return Ok(Layout {
            crop: WORLD,
            legend_anchor: (80.0, 400.0),
            scale: round_dp(1.0, 3, Rounding::Nearest),
        });
    }
    let mut crop = selection
        .specs()
        .iter()
        .map(|s| s.bounds())
        .reduce(LayoutBox::hull)
        .unwrap_or(WORLD);
    // Anchored left of the selection, but never off the world and
    // never below the bottom 100 units.
    let legend_anchor = (
        (WORLD.x0 + 80.0).max(crop.x0 - 20.0),
        (WORLD.y1 - 100.0).min(crop.y1 - 20.0),
    );
    if with_legend {
        crop.x0 = crop.x0.min(legend_anchor.0);
        crop.y1 = crop.y1.max(legend_anchor.1);
    }
    if with_caption {
        let ratio = round_dp(crop.height() / WORLD.height(), 3, Rounding::Nearest);
        crop.y1 = WORLD.y1.min(crop.y1 + 60.0 * ratio);
    }
    let crop = add_margins(crop, 10.0, WORLD)?;
    Ok(Layout {
        crop,
        legend_anchor,
        scale: round_dp(crop.height() / WORLD.height(), 3, Rounding::Nearest),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_tokens_parse_with_markers() {
        let spec: RegionSpec = "Asia*".parse().unwrap();
        assert_eq!(spec.region, Region::Asia);
        assert!(spec.extended);
        assert!("atlantis".parse::<RegionSpec>().is_err());
    }

    #[test]
    fn empty_selection_is_the_world() {
        let layout = compute(&RegionSelection::default(), true, true).unwrap();
        assert_eq!(layout.crop, WORLD);
        assert_eq!(layout.legend_anchor, (80.0, 400.0));
        assert_eq!(layout.scale, 1.0);
    }

    #[test]
    fn world_token_shortcuts_any_selection() {
        let sel = RegionSelection::parse(["africa", "world"]).unwrap();
        assert!(sel.is_world());
        assert_eq!(compute(&sel, false, false).unwrap().crop, WORLD);
    }

    #[test]
    fn africa_crop_and_scale() {
        let sel = RegionSelection::parse(["africa"]).unwrap();
        let layout = compute(&sel, false, false).unwrap();
        assert_eq!(
            layout.crop,
            LayoutBox::new(392.971, 126.133, 640.717, 372.914)
        );
        assert_eq!(layout.scale, 0.487);
        assert_eq!(layout.legend_anchor, (383.011, 342.914));
    }

    #[test]
    fn legend_growth_extends_the_crop_left() {
        let sel = RegionSelection::parse(["africa"]).unwrap();
        let bare = compute(&sel, false, false).unwrap();
        let with_legend = compute(&sel, true, false).unwrap();
        assert!(with_legend.crop.x0 < bare.crop.x0);
        assert!(with_legend.crop.x0 <= with_legend.legend_anchor.0);
    }

    #[test]
    fn caption_growth_extends_the_crop_down_but_not_past_the_world() {
        let sel = RegionSelection::parse(["africa"]).unwrap();
        let bare = compute(&sel, false, false).unwrap();
        let with_caption = compute(&sel, false, true).unwrap();
        assert!(with_caption.crop.y1 > bare.crop.y1);
        assert!(with_caption.crop.y1 <= WORLD.y1);
    }

    #[test]
    fn merged_selection_is_the_hull() {
        let sel = RegionSelection::parse(["africa", "south_america"]).unwrap();
        let layout = compute(&sel, false, false).unwrap();
        // South America gives the west and south edges, Africa the rest.
        assert!(layout.crop.x0 < 403.011 - 10.0 && layout.crop.x0 > 150.0);
        assert!(layout.crop.y1 > 427.896);
        assert!(layout.crop.x1 > 630.677);
    }

    #[test]
    fn extended_europe_reaches_further_east() {
        let plain = compute(&RegionSelection::parse(["europe"]).unwrap(), false, false).unwrap();
        let starred = compute(&RegionSelection::parse(["europe*"]).unwrap(), false, false).unwrap();
        assert!(starred.crop.x1 > plain.crop.x1);
        assert!(starred.crop.y0 < plain.crop.y0);
    }

    #[test]
    fn crop_is_always_inside_the_world() {
        for tokens in [vec!["antarctica"], vec!["oceania"], vec!["north_america"]] {
            let sel = RegionSelection::parse(tokens).unwrap();
            let c = compute(&sel, true, true).unwrap().crop;
            assert!(c.x0 >= WORLD.x0 && c.y0 >= WORLD.y0);
            assert!(c.x1 <= WORLD.x1 && c.y1 <= WORLD.y1);
        }
    }

    #[test]
    fn degenerate_limits_are_rejected() {
        let bad = LayoutBox::new(10.0, 0.0, 10.0, 5.0);
        assert!(matches!(
            add_margins(WORLD, 10.0, bad),
            Err(MapError::InvalidLayoutBounds { .. })
        ));
    }
}
