use crate::models::ValueMap;
use serde::{Deserialize, Serialize};

/// Summary statistics of a value set, computed once per compilation.
/// `std` is the population standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
    pub median: f64,
}

/// Describe the values of a map. Empty input yields a zeroed summary.
pub fn describe(data: &ValueMap) -> Summary {
    let mut vals: Vec<f64> = data.values().copied().collect();
    vals.sort_by(|a, b| a.partial_cmp(b).expect("finite values"));
    let count = vals.len();
    if count == 0 {
        return Summary {
            count: 0,
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            std: 0.0,
            median: 0.0,
        };
    }
    let min = vals[0];
    let max = vals[count - 1];
    let mean = vals.iter().sum::<f64>() / count as f64;
    let var = vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    let median = if count % 2 == 1 {
        vals[count / 2]
    } else {
        (vals[count / 2 - 1] + vals[count / 2]) / 2.0
    };
    Summary {
        count,
        min,
        max,
        mean,
        std: var.sqrt(),
        median,
    }
}
