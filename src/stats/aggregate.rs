//! Aggregations over loaded tables.
//!
//! Everything here is a pure function of the records passed in. Levels
//! come from the level stored on each rating or access record, never from
//! the current catalog.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::{AccessRecord, Gender, Level, Rating, User};
use crate::stats::summary::{mean, NumericSummary};
use crate::util::round_hundredths;

/// Ratings of one course.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseRatingSummary {
    pub count: usize,
    pub mean: f64,
    pub min: u8,
    pub max: u8,
}

/// Ratings of one level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelRatingSummary {
    pub count: usize,
    pub mean: f64,
}

/// Visit counts and durations, summarized independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessSummary {
    pub visits: NumericSummary,
    pub durations: NumericSummary,
}

/// Access totals for a course or level.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccessTotals {
    /// Number of (user, course) records.
    pub records: usize,
    pub visits: u64,
    /// Seconds, rounded to hundredths.
    pub duration: f64,
}

impl AccessTotals {
    fn add(&mut self, record: &AccessRecord) {
        self.records += 1;
        self.visits += u64::from(record.visits);
        self.duration = round_hundredths(self.duration + record.duration);
    }
}

/// Count, mean, min and max score per course. Unrated courses are absent.
pub fn per_course_rating_summary(ratings: &[Rating]) -> BTreeMap<String, CourseRatingSummary> {
    let mut scores: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    for rating in ratings {
        scores
            .entry(rating.course.clone())
            .or_default()
            .push(rating.score.value());
    }

    scores
        .into_iter()
        .map(|(course, scores)| {
            let summary = CourseRatingSummary {
                count: scores.len(),
                mean: mean(&as_f64(&scores)),
                min: scores.iter().copied().min().unwrap_or_default(),
                max: scores.iter().copied().max().unwrap_or_default(),
            };
            (course, summary)
        })
        .collect()
}

/// Count and mean score per level.
pub fn per_level_rating_summary(ratings: &[Rating]) -> BTreeMap<Level, LevelRatingSummary> {
    let mut scores: BTreeMap<Level, Vec<u8>> = BTreeMap::new();
    for rating in ratings {
        scores
            .entry(rating.level)
            .or_default()
            .push(rating.score.value());
    }

    scores
        .into_iter()
        .map(|(level, scores)| {
            let summary = LevelRatingSummary {
                count: scores.len(),
                mean: mean(&as_f64(&scores)),
            };
            (level, summary)
        })
        .collect()
}

pub fn access_summary(records: &[AccessRecord]) -> AccessSummary {
    let visits: Vec<f64> = records.iter().map(|r| f64::from(r.visits)).collect();
    let durations: Vec<f64> = records.iter().map(|r| r.duration).collect();

    AccessSummary {
        visits: NumericSummary::of(&visits),
        durations: NumericSummary::of(&durations),
    }
}

pub fn per_course_access_summary(records: &[AccessRecord]) -> BTreeMap<String, AccessTotals> {
    let mut totals: BTreeMap<String, AccessTotals> = BTreeMap::new();
    for record in records {
        totals.entry(record.course.clone()).or_default().add(record);
    }
    totals
}

pub fn per_level_access_summary(records: &[AccessRecord]) -> BTreeMap<Level, AccessTotals> {
    let mut totals: BTreeMap<Level, AccessTotals> = BTreeMap::new();
    for record in records {
        totals.entry(record.level).or_default().add(record);
    }
    totals
}

/// Users per gender, matching stored values exactly. Other spellings and
/// missing values are not counted.
pub fn gender_distribution(users: &[User]) -> BTreeMap<Gender, usize> {
    let mut counts = BTreeMap::new();
    for gender in users.iter().filter_map(User::recognized_gender) {
        *counts.entry(gender).or_insert(0) += 1;
    }
    counts
}

/// Ages of the users that have one.
pub fn age_summary(users: &[User]) -> NumericSummary {
    let ages: Vec<f64> = users
        .iter()
        .filter_map(|u| u.age)
        .map(f64::from)
        .collect();
    NumericSummary::of(&ages)
}

fn as_f64(scores: &[u8]) -> Vec<f64> {
    scores.iter().copied().map(f64::from).collect()
}
