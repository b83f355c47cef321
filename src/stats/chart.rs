//! Text charts for terminal output.

use std::fmt::Write;

use serde::Serialize;

/// Default number of histogram bins.
pub const DEFAULT_BINS: usize = 10;

/// Width of the longest bar, in characters.
pub const BAR_WIDTH: usize = 40;

const BAR_CHAR: char = '#';

/// Equal-width histogram of a numeric series.
///
/// Bins span `[min, max]`; every bin is half-open except the last, which
/// also includes `max`. A series with a single distinct value is centred
/// in a range of width 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `bins + 1` bin edges, ascending.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `values`. Returns `None` for an empty series or zero bins.
    pub fn of(values: &[f64], bins: usize) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() || bins == 0 {
            return None;
        }

        let mut lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

        let mut counts = vec![0; bins];
        for value in finite {
            let idx = (((value - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Some(Self { edges, counts })
    }

    /// Render one line per bin: range, bar, count.
    pub fn render(&self) -> String {
        let labels: Vec<String> = self
            .edges
            .windows(2)
            .map(|w| format!("{:>10.2} - {:<10.2}", w[0], w[1]))
            .collect();
        let values: Vec<f64> = self.counts.iter().map(|c| *c as f64).collect();

        render_rows(&labels, &values, |v| format!("{}", v as usize))
    }
}

/// Horizontal bar chart of labelled values, scaled to the largest value.
pub fn render_bar_chart(rows: &[(String, f64)]) -> String {
    let width = rows
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0);
    let labels: Vec<String> = rows
        .iter()
        .map(|(label, _)| format!("{:<width$}", label, width = width))
        .collect();
    let values: Vec<f64> = rows.iter().map(|(_, v)| *v).collect();

    render_rows(&labels, &values, |v| format!("{:.2}", v))
}

fn render_rows(labels: &[String], values: &[f64], fmt_value: impl Fn(f64) -> String) -> String {
    let top = values.iter().copied().fold(0.0, f64::max);

    let mut out = String::new();
    for (label, value) in labels.iter().zip(values) {
        let len = if top > 0.0 && *value > 0.0 {
            ((value / top) * BAR_WIDTH as f64).round().max(1.0) as usize
        } else {
            0
        };
        let bar: String = std::iter::repeat(BAR_CHAR).take(len).collect();
        let _ = writeln!(out, "{} | {:<w$} {}", label, bar, fmt_value(*value), w = BAR_WIDTH);
    }
    out
}
