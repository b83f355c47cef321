//! Per-(user, course) access accounting.
//!
//! Each pair owns one [`AccessRecord`] that accumulates visits and time
//! spent. The level is a snapshot taken on the first visit; later catalog
//! edits do not rewrite it.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::audit::AuditLog;
use crate::clock::Clock;
use crate::core::Level;
use crate::error::Result;
use crate::storage::{RecordStore, Table};
use crate::util::round_hundredths;

/// Aggregated visits of one user to one course, as stored in `acessos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRecord {
    #[serde(rename = "usuario")]
    pub user: String,
    #[serde(rename = "curso")]
    pub course: String,
    #[serde(rename = "nivel")]
    pub level: Level,
    #[serde(rename = "quantidade")]
    pub visits: u32,
    /// Cumulative time spent, in seconds.
    #[serde(rename = "tempo")]
    pub duration: f64,
    #[serde(rename = "primeiro_acesso")]
    pub first_access: NaiveDateTime,
    #[serde(rename = "ultimo_acesso")]
    pub last_access: NaiveDateTime,
}

impl AccessRecord {
    fn is_for(&self, user: &str, course: &str) -> bool {
        self.user == user && self.course == course
    }
}

/// Records course visits into the `acessos` table.
pub struct AccessTracker<'a, S: RecordStore> {
    store: &'a S,
    clock: &'a dyn Clock,
    audit: &'a dyn AuditLog,
}

impl<'a, S: RecordStore> AccessTracker<'a, S> {
    pub fn new(store: &'a S, clock: &'a dyn Clock, audit: &'a dyn AuditLog) -> Self {
        Self {
            store,
            clock,
            audit,
        }
    }

    /// All access records in stored order.
    pub fn records(&self) -> Vec<AccessRecord> {
        self.store.load(Table::Accesses)
    }

    /// Count one visit of `user` to `course` lasting `duration` seconds.
    pub fn record_access(
        &self,
        user: &str,
        course: &str,
        level: Level,
        duration: f64,
    ) -> Result<AccessRecord> {
        let duration = sanitize_duration(duration);
        let now = self.clock.now();
        let mut records = self.records();

        let record = match records.iter_mut().find(|r| r.is_for(user, course)) {
            Some(existing) => {
                existing.visits = existing.visits.saturating_add(1);
                existing.duration = round_hundredths(existing.duration + duration);
                existing.last_access = now;
                existing.clone()
            }
            None => {
                let created = AccessRecord {
                    user: user.to_string(),
                    course: course.to_string(),
                    level,
                    visits: 1,
                    duration,
                    first_access: now,
                    last_access: now,
                };
                records.push(created.clone());
                created
            }
        };

        self.store.save(Table::Accesses, &records)?;
        tracing::debug!(user, course, visits = record.visits, "access recorded");
        self.audit.info(&format!(
            "User '{}' viewed course '{}' for {:.2} seconds.",
            user, course, duration
        ));

        Ok(record)
    }
}

/// Round to hundredths; negative or non-finite values count as zero.
pub fn sanitize_duration(duration: f64) -> f64 {
    if !duration.is_finite() || duration < 0.0 {
        tracing::warn!(duration, "invalid access duration, counting as 0");
        return 0.0;
    }
    round_hundredths(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditLog;
    use crate::clock::FixedClock;
    use crate::error::CampusError;
    use crate::storage::MemoryRecordStore;
    use chrono::{Duration, NaiveDate};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_first_access_creates_record() {
        let store = MemoryRecordStore::new();
        let clock = FixedClock::new(start());
        let audit = MemoryAuditLog::new();
        let tracker = AccessTracker::new(&store, &clock, &audit);

        let record = tracker
            .record_access("ana", "Rust", Level::Beginner, 12.345)
            .unwrap();

        assert_eq!(record.visits, 1);
        assert_eq!(record.duration, 12.35);
        assert_eq!(record.first_access, start());
        assert_eq!(record.last_access, start());
        assert_eq!(tracker.records(), vec![record]);
        assert!(audit.contains("User 'ana' viewed course 'Rust' for 12.35 seconds."));
    }

    #[test]
    fn test_repeat_access_accumulates() {
        let store = MemoryRecordStore::new();
        let clock = FixedClock::new(start());
        let audit = MemoryAuditLog::new();
        let tracker = AccessTracker::new(&store, &clock, &audit);

        tracker
            .record_access("ana", "Rust", Level::Beginner, 10.5)
            .unwrap();
        clock.advance(Duration::minutes(5));
        let record = tracker
            .record_access("ana", "Rust", Level::Advanced, 4.25)
            .unwrap();

        assert_eq!(tracker.records().len(), 1);
        assert_eq!(record.visits, 2);
        assert_eq!(record.duration, 14.75);
        assert_eq!(record.first_access, start());
        assert_eq!(record.last_access, start() + Duration::minutes(5));
        // Level stays the one seen on the first visit
        assert_eq!(record.level, Level::Beginner);
    }

    #[test]
    fn test_pairs_are_tracked_separately() {
        let store = MemoryRecordStore::new();
        let clock = FixedClock::new(start());
        let audit = MemoryAuditLog::new();
        let tracker = AccessTracker::new(&store, &clock, &audit);

        tracker
            .record_access("ana", "Rust", Level::Beginner, 1.0)
            .unwrap();
        tracker
            .record_access("ana", "Go", Level::Beginner, 1.0)
            .unwrap();
        tracker
            .record_access("bia", "Rust", Level::Beginner, 1.0)
            .unwrap();

        let records = tracker.records();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.visits == 1));
    }

    #[test]
    fn test_invalid_durations_clamped() {
        let store = MemoryRecordStore::new();
        let clock = FixedClock::new(start());
        let audit = MemoryAuditLog::new();
        let tracker = AccessTracker::new(&store, &clock, &audit);

        for bad in [-3.0, f64::NAN, f64::INFINITY] {
            tracker
                .record_access("ana", "Rust", Level::Beginner, bad)
                .unwrap();
        }

        let records = tracker.records();
        assert_eq!(records[0].visits, 3);
        assert_eq!(records[0].duration, 0.0);
    }

    #[test]
    fn test_stored_field_names() {
        let store = MemoryRecordStore::new();
        let clock = FixedClock::new(start());
        let audit = MemoryAuditLog::new();
        let tracker = AccessTracker::new(&store, &clock, &audit);
        tracker
            .record_access("ana", "Rust", Level::Intermediate, 2.0)
            .unwrap();

        let document = store.read_table(Table::Accesses).unwrap().unwrap();
        assert_eq!(
            document,
            serde_json::json!([{
                "usuario": "ana",
                "curso": "Rust",
                "nivel": "intermediário",
                "quantidade": 1,
                "tempo": 2.0,
                "primeiro_acesso": "2025-06-01T10:00:00",
                "ultimo_acesso": "2025-06-01T10:00:00",
            }])
        );
    }

    #[test]
    fn test_write_failure_propagates() {
        let store = MemoryRecordStore::new();
        let clock = FixedClock::new(start());
        let audit = MemoryAuditLog::new();
        let tracker = AccessTracker::new(&store, &clock, &audit);
        store.set_read_only(true);

        let err = tracker
            .record_access("ana", "Rust", Level::Beginner, 1.0)
            .unwrap_err();
        assert!(matches!(err, CampusError::Storage { .. }));
        assert!(audit.entries().is_empty());
    }
}
