//! Stats command for Campus.
//!
//! Displays user, access and rating statistics, with optional text charts.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cli::admin::AdminCredentials;
use crate::cli::{format_output, Context, OutputOptions};
use crate::core::{AccessTracker, Gender, Level, RatingLedger};
use crate::error::Result;
use crate::stats::{
    access_summary, age_summary, gender_distribution, per_course_access_summary,
    per_course_rating_summary, per_level_access_summary, per_level_rating_summary,
    render_bar_chart, AccessSummary, AccessTotals, CourseRatingSummary, Histogram,
    LevelRatingSummary, NumericSummary, DEFAULT_BINS,
};

/// Which statistics to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsTopic {
    Users,
    Accesses,
    Ratings,
}

/// Options for the stats command.
#[derive(Debug, Clone)]
pub struct StatsOptions {
    pub output: OutputOptions,
    pub credentials: AdminCredentials,
    pub topic: StatsTopic,
    /// Render text charts.
    pub chart: bool,
}

/// User demographics.
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub ages: NumericSummary,
    pub genders: BTreeMap<Gender, usize>,
}

/// Access statistics.
#[derive(Debug, Clone, Serialize)]
pub struct AccessStats {
    pub summary: AccessSummary,
    pub per_course: BTreeMap<String, AccessTotals>,
    pub per_level: BTreeMap<Level, AccessTotals>,
}

/// Rating statistics.
#[derive(Debug, Clone, Serialize)]
pub struct RatingStats {
    pub per_course: BTreeMap<String, CourseRatingSummary>,
    pub per_level: BTreeMap<Level, LevelRatingSummary>,
}

/// A rendered text chart.
#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub title: String,
    pub body: String,
}

/// Output format for the stats command.
#[derive(Debug, Clone, Serialize)]
pub struct StatsOutput {
    pub success: bool,
    pub topic: StatsTopic,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<UserStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accesses: Option<AccessStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings: Option<RatingStats>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub charts: Vec<Chart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatsOutput {
    fn empty(topic: StatsTopic) -> Self {
        Self {
            success: true,
            topic,
            users: None,
            accesses: None,
            ratings: None,
            charts: Vec::new(),
            error: None,
        }
    }

    fn failure(topic: StatsTopic, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::empty(topic)
        }
    }
}

/// The stats command implementation.
pub struct StatsCommand<'a> {
    ctx: &'a Context,
}

impl<'a> StatsCommand<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    pub fn run(&self, options: &StatsOptions) -> StatsOutput {
        match self.collect(options) {
            Ok(output) => output,
            Err(e) => StatsOutput::failure(options.topic, e.to_string()),
        }
    }

    fn collect(&self, options: &StatsOptions) -> Result<StatsOutput> {
        options.credentials.authenticate(self.ctx)?;

        let mut output = StatsOutput::empty(options.topic);
        match options.topic {
            StatsTopic::Users => {
                let users = self.ctx.users().users();
                let stats = UserStats {
                    ages: age_summary(&users),
                    genders: gender_distribution(&users),
                };
                if options.chart {
                    let ages: Vec<f64> = users.iter().filter_map(|u| u.age).map(f64::from).collect();
                    push_histogram(&mut output.charts, "Age distribution", &ages);
                    let rows: Vec<(String, f64)> = stats
                        .genders
                        .iter()
                        .map(|(g, n)| (g.to_string(), *n as f64))
                        .collect();
                    push_bars(&mut output.charts, "Gender distribution", &rows);
                }
                output.users = Some(stats);
            }
            StatsTopic::Accesses => {
                let records = AccessTracker::new(
                    &self.ctx.store,
                    self.ctx.clock.as_ref(),
                    self.ctx.admin_log.as_ref(),
                )
                .records();
                if options.chart {
                    let visits: Vec<f64> = records.iter().map(|r| f64::from(r.visits)).collect();
                    let durations: Vec<f64> = records.iter().map(|r| r.duration).collect();
                    push_histogram(&mut output.charts, "Number of accesses", &visits);
                    push_histogram(&mut output.charts, "Access time (seconds)", &durations);
                }
                output.accesses = Some(AccessStats {
                    summary: access_summary(&records),
                    per_course: per_course_access_summary(&records),
                    per_level: per_level_access_summary(&records),
                });
            }
            StatsTopic::Ratings => {
                let ratings = RatingLedger::new(
                    &self.ctx.store,
                    self.ctx.clock.as_ref(),
                    self.ctx.admin_log.as_ref(),
                )
                .ratings();
                let stats = RatingStats {
                    per_course: per_course_rating_summary(&ratings),
                    per_level: per_level_rating_summary(&ratings),
                };
                if options.chart {
                    let rows: Vec<(String, f64)> = stats
                        .per_course
                        .iter()
                        .map(|(course, s)| (course.clone(), s.mean))
                        .collect();
                    push_bars(&mut output.charts, "Mean score per course", &rows);
                }
                output.ratings = Some(stats);
            }
        }

        Ok(output)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &StatsOutput, options: &StatsOptions) -> String {
        format_output(output, &options.output, format_human_readable)
    }
}

fn push_histogram(charts: &mut Vec<Chart>, title: &str, values: &[f64]) {
    if let Some(histogram) = Histogram::of(values, DEFAULT_BINS) {
        charts.push(Chart {
            title: title.to_string(),
            body: histogram.render(),
        });
    }
}

fn push_bars(charts: &mut Vec<Chart>, title: &str, rows: &[(String, f64)]) {
    if !rows.is_empty() {
        charts.push(Chart {
            title: title.to_string(),
            body: render_bar_chart(rows),
        });
    }
}

fn fmt_mode(mode: Option<f64>) -> String {
    match mode {
        Some(value) => format!("{}", value),
        None => "no mode".to_string(),
    }
}

fn push_summary(lines: &mut Vec<String>, label: &str, summary: &NumericSummary) {
    lines.push(format!("   Mean {}: {:.2}", label, summary.mean));
    lines.push(format!("   Median {}: {}", label, summary.median));
    lines.push(format!("   Mode {}: {}", label, fmt_mode(summary.mode)));
}

fn format_human_readable(output: &StatsOutput) -> String {
    if !output.success {
        return format!(
            "Stats failed: {}",
            output.error.as_deref().unwrap_or("unknown error")
        );
    }

    let mut lines = Vec::new();

    if let Some(users) = &output.users {
        lines.push("=== User statistics ===".to_string());
        if users.ages.count == 0 {
            lines.push("   No age data to show.".to_string());
        } else {
            push_summary(&mut lines, "age", &users.ages);
        }
        if users.genders.is_empty() {
            lines.push("   No gender data to show.".to_string());
        } else {
            lines.push("   Gender count:".to_string());
            for (gender, count) in &users.genders {
                lines.push(format!("     {}: {}", gender, count));
            }
        }
    }

    if let Some(accesses) = &output.accesses {
        lines.push("=== Access statistics ===".to_string());
        if accesses.summary.visits.count == 0 {
            lines.push("   No access data to show.".to_string());
        } else {
            push_summary(&mut lines, "accesses", &accesses.summary.visits);
            push_summary(&mut lines, "access time", &accesses.summary.durations);
            lines.push("   Per level:".to_string());
            for (level, totals) in &accesses.per_level {
                lines.push(format!(
                    "     {}: {} accesses, {:.2} seconds",
                    level, totals.visits, totals.duration
                ));
            }
            lines.push("   Per course:".to_string());
            for (course, totals) in &accesses.per_course {
                lines.push(format!(
                    "     {}: {} accesses by {} users, {:.2} seconds",
                    course, totals.visits, totals.records, totals.duration
                ));
            }
        }
    }

    if let Some(ratings) = &output.ratings {
        lines.push("=== Rating statistics per course ===".to_string());
        if ratings.per_course.is_empty() {
            lines.push("   No ratings to show.".to_string());
        }
        for (course, summary) in &ratings.per_course {
            lines.push(format!("Course: {}", course));
            lines.push(format!("   Ratings: {}", summary.count));
            lines.push(format!("   Mean score: {:.2}", summary.mean));
            lines.push(format!("   Highest score: {}", summary.max));
            lines.push(format!("   Lowest score: {}", summary.min));
        }
        if !ratings.per_level.is_empty() {
            lines.push("   Per level:".to_string());
            for (level, summary) in &ratings.per_level {
                lines.push(format!(
                    "     {}: {} ratings, mean {:.2}",
                    level, summary.count, summary.mean
                ));
            }
        }
    }

    for chart in &output.charts {
        lines.push(String::new());
        lines.push(format!("--- {} ---", chart.title));
        lines.push(chart.body.trim_end().to_string());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::cli::test_support::{test_context_with, TestContext};
    use crate::config::Config;
    use crate::core::CourseCatalog;

    fn setup() -> TestContext {
        let mut config = Config::default();
        config.admin.password_hash = Some(hash_password("admin123").unwrap());
        let t = test_context_with(config);

        let users = t.ctx.users();
        users.register("ana", "segredo123", "feminino", 20).unwrap();
        users.register("bia", "segredo123", "feminino", 30).unwrap();
        users.register("caio", "segredo123", "masculino", 30).unwrap();

        CourseCatalog::new(&t.ctx.store, t.ctx.admin_log.as_ref(), &t.ctx.config.catalog)
            .add("Rust", Level::Beginner, "")
            .unwrap();
        t
    }

    fn options(topic: StatsTopic, chart: bool) -> StatsOptions {
        StatsOptions {
            output: OutputOptions::default(),
            credentials: AdminCredentials::new("admin", "admin123"),
            topic,
            chart,
        }
    }

    #[test]
    fn test_user_stats() {
        let t = setup();
        let cmd = StatsCommand::new(&t.ctx);
        let options = options(StatsTopic::Users, false);

        let output = cmd.run(&options);

        let users = output.users.as_ref().unwrap();
        assert_eq!(users.ages.count, 3);
        assert_eq!(users.ages.mode, Some(30.0));
        assert_eq!(users.genders[&Gender::Female], 2);
        assert!(output.charts.is_empty());

        let text = cmd.format_output(&output, &options);
        assert!(text.contains("Mean age: 26.67"));
        assert!(text.contains("feminino: 2"));
    }

    #[test]
    fn test_access_stats() {
        let t = setup();
        let tracker = AccessTracker::new(&t.ctx.store, t.ctx.clock.as_ref(), t.ctx.user_log.as_ref());
        tracker.record_access("ana", "Rust", Level::Beginner, 10.0).unwrap();
        tracker.record_access("ana", "Rust", Level::Beginner, 5.0).unwrap();
        tracker.record_access("bia", "Rust", Level::Beginner, 1.5).unwrap();
        let cmd = StatsCommand::new(&t.ctx);
        let options = options(StatsTopic::Accesses, true);

        let output = cmd.run(&options);

        let accesses = output.accesses.as_ref().unwrap();
        assert_eq!(accesses.summary.visits.count, 2);
        assert_eq!(accesses.summary.visits.mean, 1.5);
        assert_eq!(accesses.summary.visits.mode, None);
        assert_eq!(accesses.per_course["Rust"].visits, 3);
        assert_eq!(accesses.per_course["Rust"].duration, 16.5);
        assert_eq!(output.charts.len(), 2);

        let text = cmd.format_output(&output, &options);
        assert!(text.contains("Mode accesses: no mode"));
        assert!(text.contains("--- Number of accesses ---"));
    }

    #[test]
    fn test_rating_stats_with_chart() {
        let t = setup();
        let ledger = RatingLedger::new(&t.ctx.store, t.ctx.clock.as_ref(), t.ctx.user_log.as_ref());
        ledger.submit_rating("ana", "Rust", Level::Beginner, 5).unwrap();
        ledger.submit_rating("bia", "Rust", Level::Beginner, 2).unwrap();
        let cmd = StatsCommand::new(&t.ctx);
        let options = options(StatsTopic::Ratings, true);

        let output = cmd.run(&options);

        let ratings = output.ratings.as_ref().unwrap();
        assert_eq!(ratings.per_course["Rust"].count, 2);
        assert_eq!(ratings.per_course["Rust"].mean, 3.5);
        assert_eq!(ratings.per_level[&Level::Beginner].count, 2);

        let text = cmd.format_output(&output, &options);
        assert!(text.contains("Course: Rust\n   Ratings: 2\n   Mean score: 3.50"));
        assert!(text.contains("--- Mean score per course ---"));
    }

    #[test]
    fn test_empty_tables() {
        let mut config = Config::default();
        config.admin.password_hash = Some(hash_password("admin123").unwrap());
        let t = test_context_with(config);
        let cmd = StatsCommand::new(&t.ctx);

        for topic in [StatsTopic::Users, StatsTopic::Accesses, StatsTopic::Ratings] {
            let options = options(topic, true);
            let output = cmd.run(&options);
            assert!(output.success);
            assert!(output.charts.is_empty());
            assert!(cmd.format_output(&output, &options).contains("No "));
        }
    }

    #[test]
    fn test_requires_admin() {
        let t = setup();
        let cmd = StatsCommand::new(&t.ctx);
        let mut options = options(StatsTopic::Users, false);
        options.credentials.password = "nope".to_string();

        let output = cmd.run(&options);
        assert!(!output.success);
        assert!(output.users.is_none());
    }

    #[test]
    fn test_json_output() {
        let t = setup();
        let cmd = StatsCommand::new(&t.ctx);
        let mut options = options(StatsTopic::Users, false);
        options.output.json = true;

        let output = cmd.run(&options);
        let json: serde_json::Value =
            serde_json::from_str(&cmd.format_output(&output, &options)).unwrap();
        assert_eq!(json["topic"], "users");
        assert_eq!(json["users"]["genders"]["masculino"], 1);
    }
}
