//! Descriptive statistics over numeric series.
//!
//! Empty input has a mean and median of 0 and no mode.

use std::cmp::Ordering;

use serde::Serialize;

/// Summary of one numeric series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// `None` when no single value is the most frequent.
    pub mode: Option<f64>,
    /// 0 for an empty series.
    pub min: f64,
    /// 0 for an empty series.
    pub max: f64,
}

impl NumericSummary {
    pub fn of(values: &[f64]) -> Self {
        Self {
            count: values.len(),
            mean: mean(values),
            median: median(values),
            mode: mode(values),
            min: values.iter().copied().reduce(f64::min).unwrap_or(0.0),
            max: values.iter().copied().reduce(f64::max).unwrap_or(0.0),
        }
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Middle value of a sorted copy, or the mean of the two middle values.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let sorted = sorted_copy(values);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// The most frequent value, if exactly one value has the top frequency.
pub fn mode(values: &[f64]) -> Option<f64> {
    let sorted = sorted_copy(values);

    let mut best: Option<(f64, usize)> = None;
    let mut tied = false;
    let mut i = 0;
    while i < sorted.len() {
        let value = sorted[i];
        let run = sorted[i..].iter().take_while(|v| **v == value).count().max(1);

        match best {
            Some((_, top)) if run == top => tied = true,
            Some((_, top)) if run < top => {}
            _ => {
                best = Some((value, run));
                tied = false;
            }
        }
        i += run;
    }

    match best {
        Some((value, _)) if !tied => Some(value),
        _ => None,
    }
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}
