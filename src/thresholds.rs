//! Threshold construction and bin classification.
//!
//! A [`Task`] describes how bin boundaries are derived from the data;
//! the classifier then places every country into a bin by counting how
//! many ascending thresholds its value reaches.

use crate::error::{MapError, Result};
use crate::models::{Diagnostic, IntensityMap, ValueMap};
use crate::numfmt::parse_magnitude;
use crate::stats::{self, Summary};
use std::str::FromStr;

/// Threshold construction method. Closed enumeration: unknown task
/// tokens fail at parse time instead of falling through.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// One bin per distinct value present in the data.
    Values,
    /// N equal-width bins spanning `[min, max]`.
    Bins(usize),
    /// Explicit boundaries, kept sorted ascending.
    Explicit(Vec<f64>),
    /// A single boundary at zero.
    Sign,
    /// A single boundary at the mean.
    Mean,
    /// A single boundary at the median.
    Median,
    /// Boundaries at mean - std, mean, mean + std.
    Std,
}

impl FromStr for Task {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        if let Some(count) = token.strip_prefix("b:") {
            let n = parse_magnitude(count)
                .filter(|n| *n >= 1.0)
                .ok_or_else(|| MapError::InvalidTaskSpec(s.to_string()))?;
            return Ok(Task::Bins(n as usize));
        }
        if let Some(list) = token.strip_prefix("t:") {
            // Unparseable entries default to 0, as the magnitude grammar
            // has no sign support.
            let mut bounds: Vec<f64> = list
                .replace(' ', "")
                .split(',')
                .map(|t| parse_magnitude(t).unwrap_or(0.0))
                .collect();
            bounds.sort_by(|a, b| a.partial_cmp(b).expect("finite thresholds"));
            return Ok(Task::Explicit(bounds));
        }
        match token {
            "values" => Ok(Task::Values),
            "sign" => Ok(Task::Sign),
            "mean" | "average" => Ok(Task::Mean),
            "median" => Ok(Task::Median),
            "std" => Ok(Task::Std),
            _ => Err(MapError::InvalidTaskSpec(s.to_string())),
        }
    }
}

/// Number of distinct values present, for the `values` task.
fn distinct_values(data: &ValueMap) -> usize {
    let mut vals: Vec<f64> = data.values().copied().collect();
    vals.sort_by(|a, b| a.partial_cmp(b).expect("finite values"));
    vals.dedup();
    vals.len()
}

fn equal_width(stats: &Summary, bins: usize) -> Vec<f64> {
    if stats.min == stats.max {
        return Vec::new();
    }
    let width = (stats.max - stats.min) / bins as f64;
    (1..bins).map(|i| stats.min + width * i as f64).collect()
}

/// Build the ordered threshold list for a task. With `smart_clean`,
/// boundaries outside `(min, max]` are dropped, since they could only
/// produce bins no value can reach; each drop is reported through
/// `diagnostics`.
pub fn make_thresholds(
    task: &Task,
    data: &ValueMap,
    smart_clean: bool,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<f64> {
    let stats = stats::describe(data);
    let mut thresholds = match task {
        Task::Values => equal_width(&stats, distinct_values(data).max(1)),
        Task::Bins(n) => equal_width(&stats, (*n).max(1)),
        Task::Explicit(bounds) => bounds.clone(),
        Task::Sign => vec![0.0],
        Task::Mean => vec![stats.mean],
        Task::Median => vec![stats.median],
        Task::Std => vec![
            stats.mean - stats.std,
            stats.mean,
            stats.mean + stats.std,
        ],
    };
    if smart_clean {
        let reachable = |t: &f64| stats.min < *t && *t <= stats.max;
        let dropped: Vec<f64> = thresholds.iter().copied().filter(|t| !reachable(t)).collect();
        if !dropped.is_empty() {
            let requested = format!("thresholds {thresholds:?}");
            thresholds.retain(reachable);
            let diagnostic = Diagnostic {
                requested,
                substitute: format!("thresholds {thresholds:?}"),
                detail: format!(
                    "boundaries outside ({}, {}] can contain no value and were dropped: {dropped:?}",
                    stats.min, stats.max
                ),
            };
            log::warn!("{diagnostic}");
            diagnostics.push(diagnostic);
        }
    }
    thresholds
}

/// Bin index for a value: the number of ascending thresholds it
/// reaches. Values equal to a boundary land in the upper bin; the
/// generated legend phrases ("between X and Y") assume exactly this.
pub fn bin_index(value: f64, thresholds: &[f64]) -> usize {
    thresholds.iter().take_while(|t| value >= **t).count()
}

/// Assign every country to its bin. All indices in
/// `0..=thresholds.len()` are present, including empty bins.
pub fn classify(data: &ValueMap, thresholds: &[f64]) -> IntensityMap {
    let mut bins: IntensityMap = (0..=thresholds.len()).map(|i| (i, Vec::new())).collect();
    for (country, value) in data {
        bins.entry(bin_index(*value, thresholds))
            .or_default()
            .push(*country);
    }
    bins
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CountryCode;

    fn data(vals: &[(&str, f64)]) -> ValueMap {
        vals.iter()
            .map(|(c, v)| (CountryCode::parse(c).unwrap(), *v))
            .collect()
    }

    #[test]
    fn task_parses_grammar() {
        assert_eq!("values".parse::<Task>().unwrap(), Task::Values);
        assert_eq!("b:4".parse::<Task>().unwrap(), Task::Bins(4));
        assert_eq!("b:2k".parse::<Task>().unwrap(), Task::Bins(2000));
        assert_eq!(
            "t:3, 1.5k, 2".parse::<Task>().unwrap(),
            Task::Explicit(vec![2.0, 3.0, 1500.0])
        );
        assert_eq!("average".parse::<Task>().unwrap(), Task::Mean);
        assert!("quartiles".parse::<Task>().is_err());
        assert!("b:zero".parse::<Task>().is_err());
    }

    #[test]
    fn equal_width_bins_are_interior_and_increasing() {
        let d = data(&[("us", 0.0), ("cn", 10.0)]);
        let t = make_thresholds(&Task::Bins(4), &d, false, &mut Vec::new());
        assert_eq!(t, vec![2.5, 5.0, 7.5]);
        assert!(t.windows(2).all(|w| w[0] < w[1]));
        assert!(t.iter().all(|x| 0.0 < *x && *x < 10.0));
    }

    #[test]
    fn degenerate_range_has_no_thresholds() {
        let d = data(&[("us", 5.0), ("cn", 5.0)]);
        assert!(make_thresholds(&Task::Bins(7), &d, false, &mut Vec::new()).is_empty());
        let bins = classify(&d, &[]);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[&0].len(), 2);
    }

    #[test]
    fn smart_clean_drops_unreachable_bounds() {
        let d = data(&[("us", 1.0), ("cn", 5.0)]);
        let task = Task::Explicit(vec![0.0, 1.0, 3.0, 5.0, 9.0]);
        assert_eq!(
            make_thresholds(&task, &d, true, &mut Vec::new()),
            vec![3.0, 5.0]
        );
        // Non-smart mode never filters.
        assert_eq!(
            make_thresholds(&task, &d, false, &mut Vec::new()),
            vec![0.0, 1.0, 3.0, 5.0, 9.0]
        );
    }

    #[test]
    fn smart_clean_reports_every_dropped_bound() {
        let d = data(&[("us", 1.0), ("cn", 5.0)]);
        let task = Task::Explicit(vec![0.0, 1.0, 3.0, 5.0, 9.0]);
        let mut diagnostics = Vec::new();
        make_thresholds(&task, &d, true, &mut diagnostics);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].detail.contains("[0.0, 1.0, 9.0]"));
        assert!(diagnostics[0].substitute.contains("[3.0, 5.0]"));
        // No drops, no report.
        let mut clean = Vec::new();
        make_thresholds(&Task::Explicit(vec![3.0]), &d, true, &mut clean);
        assert!(clean.is_empty());
    }

    #[test]
    fn std_task_yields_three_bounds() {
        let d = data(&[("us", 1.0), ("cn", 2.0), ("de", 3.0)]);
        let t = make_thresholds(&Task::Std, &d, false, &mut Vec::new());
        assert_eq!(t.len(), 3);
        assert_eq!(t[1], 2.0);
        assert!(t[0] < t[1] && t[1] < t[2]);
    }

    #[test]
    fn classifier_partitions_and_is_monotone() {
        let d = data(&[("us", 1.0), ("cn", 2.0), ("de", 3.0), ("fr", 2.0)]);
        let thresholds = vec![1.5, 2.5];
        let bins = classify(&d, &thresholds);
        let total: usize = bins.values().map(Vec::len).sum();
        assert_eq!(total, 4);
        assert!(bins.keys().all(|i| *i <= thresholds.len()));
        assert!(bin_index(1.0, &thresholds) <= bin_index(2.0, &thresholds));
        assert!(bin_index(2.0, &thresholds) <= bin_index(3.0, &thresholds));
    }

    #[test]
    fn boundary_values_go_to_the_upper_bin() {
        assert_eq!(bin_index(1.5, &[1.5, 2.5]), 1);
        assert_eq!(bin_index(2.5, &[1.5, 2.5]), 2);
        assert_eq!(bin_index(0.0, &[1.5, 2.5]), 0);
    }

    #[test]
    fn values_task_one_bin_per_distinct_value() {
        let d = data(&[("us", 1.0), ("cn", 2.0), ("de", 3.0)]);
        let t = make_thresholds(&Task::Values, &d, false, &mut Vec::new());
        assert_eq!(t.len(), 2);
        let bins = classify(&d, &t);
        assert!(bins.values().all(|c| c.len() == 1));
    }
}
