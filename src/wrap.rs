//! Caption paragraph balancing.
//!
//! Captions are broken into a fixed number of lines whose lengths are
//! as similar as possible. Candidate line splits are enumerated from a
//! bounded window around the mean words-per-line, scored by the summed
//! pairwise length differences, and the first minimum wins. The search
//! is deliberately bounded rather than exact: the window keeps the
//! candidate count small for any realistic caption.

/// Search window radius around the mean words-per-line.
const WINDOW: isize = 5;

/// Break `text` into balanced lines. `line_width` bounds the line
/// length in characters and only determines the line count; passing
/// `n_lines` overrides it. Texts that fit one line come back unchanged.
pub fn center_paragraph(text: &str, line_width: usize, n_lines: Option<usize>) -> String {
    let text_len = text.chars().count();
    let n_lines =
        n_lines.unwrap_or_else(|| (text_len as f64 / line_width as f64).ceil() as usize);
    if n_lines < 2 {
        return text.to_string();
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    let mean = words.len() as f64 / n_lines as f64;
    let lo = (mean.floor() as isize - WINDOW).max(1) as usize;
    let hi = (mean.ceil() as usize + WINDOW as usize)
        .min(words.len().saturating_sub(n_lines).max(text_len / n_lines));

    // One word per line is always a candidate, and being first it wins
    // ties against any windowed split.
    let mut best_cuts = vec![1usize; words.len()];
    let mut best_metric = imbalance(&line_lengths(&words, &best_cuts));
    for cuts in BoundedCuts::new(lo, hi, n_lines, words.len()) {
        let metric = imbalance(&line_lengths(&words, &cuts));
        if metric < best_metric {
            best_metric = metric;
            best_cuts = cuts;
        }
    }

    let mut lines = Vec::with_capacity(best_cuts.len());
    let mut start = 0;
    for k in best_cuts {
        lines.push(words[start..start + k].join(" "));
        start += k;
    }
    lines.join("\n")
}

/// Character length of each line produced by a cut list (words joined
/// by single spaces).
fn line_lengths(words: &[&str], cuts: &[usize]) -> Vec<usize> {
    let mut lengths = Vec::with_capacity(cuts.len());
    let mut start = 0;
    for &k in cuts {
        let line = &words[start..start + k];
        let chars: usize = line.iter().map(|w| w.chars().count()).sum();
        lengths.push(chars + k.saturating_sub(1));
        start += k;
    }
    lengths
}

/// Summed pairwise length difference over the full cross product.
fn imbalance(lengths: &[usize]) -> u64 {
    lengths
        .iter()
        .flat_map(|a| lengths.iter().map(move |b| a.abs_diff(*b) as u64))
        .sum()
}

/// Odometer over `n` digits in `lo..hi`, yielding only combinations
/// that distribute exactly `total` words. Last digit varies fastest,
/// which fixes the tie-breaking order.
struct BoundedCuts {
    lo: usize,
    hi: usize,
    total: usize,
    digits: Vec<usize>,
    done: bool,
}

impl BoundedCuts {
    fn new(lo: usize, hi: usize, n: usize, total: usize) -> Self {
        Self {
            lo,
            hi,
            total,
            digits: vec![lo; n],
            done: lo >= hi || n == 0,
        }
    }

    fn advance(&mut self) {
        let mut i = self.digits.len();
        loop {
            if i == 0 {
                self.done = true;
                return;
            }
            i -= 1;
            self.digits[i] += 1;
            if self.digits[i] < self.hi {
                return;
            }
            self.digits[i] = self.lo;
        }
    }
}

impl Iterator for BoundedCuts {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        while !self.done {
            let hit = self.digits.iter().sum::<usize>() == self.total;
            let item = hit.then(|| self.digits.clone());
            self.advance();
            if item.is_some() {
                return item;
            }
        }
        None
    }
}
