//! Statistics over users, accesses and ratings.
//!
//! All functions here are pure: callers load the tables through the
//! record store and pass the records in.

pub mod aggregate;
pub mod chart;
pub mod summary;

pub use aggregate::{
    access_summary, age_summary, gender_distribution, per_course_access_summary,
    per_course_rating_summary, per_level_access_summary, per_level_rating_summary, AccessSummary,
    AccessTotals, CourseRatingSummary, LevelRatingSummary,
};
pub use chart::{render_bar_chart, Histogram, BAR_WIDTH, DEFAULT_BINS};
pub use summary::{mean, median, mode, NumericSummary};
