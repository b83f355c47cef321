//! Domain records and the components that maintain them.
//!
//! Each component borrows a [`RecordStore`](crate::storage::RecordStore)
//! and the collaborators it needs (audit log, clock) for the duration of
//! one command.

pub mod access;
pub mod course;
pub mod level;
pub mod rating;
pub mod user;

pub use access::{AccessRecord, AccessTracker};
pub use course::{CatalogWrite, Course, CourseCatalog, CourseChanges};
pub use level::{Gender, Level};
pub use rating::{Rating, RatingLedger, Score};
pub use user::{User, UserDirectory};
