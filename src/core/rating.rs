//! Course ratings.
//!
//! A user rates a course at most once, and ratings never change after
//! they are written.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::audit::AuditLog;
use crate::clock::Clock;
use crate::core::Level;
use crate::error::{CampusError, Result};
use crate::storage::{RecordStore, Table};

/// A rating score, always within `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = CampusError;

    fn try_from(value: i64) -> Result<Self> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(CampusError::validation(format!(
                "score must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One user's rating of one course, as stored in `avaliacoes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    #[serde(rename = "usuario")]
    pub user: String,
    #[serde(rename = "curso")]
    pub course: String,
    #[serde(rename = "nivel")]
    pub level: Level,
    #[serde(rename = "nota")]
    pub score: Score,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,
}

/// Appends ratings to the `avaliacoes` table.
pub struct RatingLedger<'a, S: RecordStore> {
    store: &'a S,
    clock: &'a dyn Clock,
    audit: &'a dyn AuditLog,
}

impl<'a, S: RecordStore> RatingLedger<'a, S> {
    pub fn new(store: &'a S, clock: &'a dyn Clock, audit: &'a dyn AuditLog) -> Self {
        Self {
            store,
            clock,
            audit,
        }
    }

    /// All ratings in submission order.
    pub fn ratings(&self) -> Vec<Rating> {
        self.store.load(Table::Ratings)
    }

    /// Whether `user` already rated `course`.
    pub fn has_rated(&self, user: &str, course: &str) -> bool {
        self.ratings()
            .iter()
            .any(|r| r.user == user && r.course == course)
    }

    /// Record `user`'s score for `course`.
    ///
    /// # Errors
    ///
    /// A validation error for a score outside `1..=5`, a duplicate error if
    /// the user already rated the course. Neither touches the table.
    pub fn submit_rating(
        &self,
        user: &str,
        course: &str,
        level: Level,
        score: i64,
    ) -> Result<Rating> {
        let score = Score::try_from(score)?;

        let mut ratings = self.ratings();
        if ratings.iter().any(|r| r.user == user && r.course == course) {
            return Err(CampusError::duplicate(format!(
                "'{}' has already rated '{}'",
                user, course
            )));
        }

        let rating = Rating {
            user: user.to_string(),
            course: course.to_string(),
            level,
            score,
            timestamp: Some(self.clock.now()),
        };
        ratings.push(rating.clone());
        self.store.save(Table::Ratings, &ratings)?;
        self.audit.info(&format!(
            "User '{}' rated course '{}' with {}.",
            user, course, score
        ));

        Ok(rating)
    }
}
