//! Campus - course catalog, access tracking and rating statistics
//!
//! Campus keeps users, courses, access records and ratings in flat JSON
//! tables. Learners browse and read courses, and every visit is tallied
//! per (user, course). Learners rate each course once. Admins maintain
//! the catalog and read aggregated statistics.

pub mod audit;
pub mod auth;
pub mod cli;
pub mod clock;
pub mod config;
pub mod core;
pub mod error;
pub mod stats;
pub mod storage;
pub mod util;

pub use audit::{AuditLevel, AuditLog, FileAuditLog, MemoryAuditLog};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use core::{
    AccessRecord, AccessTracker, Course, CourseCatalog, CourseChanges, Gender, Level, Rating,
    RatingLedger, Score, User, UserDirectory,
};
pub use error::{CampusError, Result};
pub use stats::{
    access_summary, age_summary, gender_distribution, per_course_access_summary,
    per_course_rating_summary, per_level_access_summary, per_level_rating_summary,
    NumericSummary,
};
pub use storage::{JsonFileStore, MemoryRecordStore, RecordStore, Table};

// CLI commands
pub use cli::{
    AdminCommand, CoursesCommand, LoginCommand, ProfileCommand, RateCommand, RegisterCommand,
    StatsCommand, ViewCommand,
};
