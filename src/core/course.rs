//! Courses and the admin-maintained course catalog.
//!
//! Course names are unique case-insensitively. Each level holds at most
//! `max_courses_per_level` courses, and content longer than
//! `max_content_chars` is cut at the limit.

use serde::{Deserialize, Serialize};

use crate::audit::AuditLog;
use crate::config::CatalogConfig;
use crate::core::Level;
use crate::error::{CampusError, Result};
use crate::storage::{RecordStore, Table};
use crate::util::truncate_chars;

/// A course, as stored in the `cursos` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "conteudo")]
    pub content: String,
    #[serde(rename = "nivel")]
    pub level: Level,
}

impl Course {
    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

/// Requested changes to an existing course. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct CourseChanges {
    pub name: Option<String>,
    pub content: Option<String>,
    pub level: Option<Level>,
}

/// Result of adding or editing a course.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogWrite {
    pub course: Course,
    /// Whether the content was cut to the configured limit.
    pub truncated: bool,
}

/// Admin operations over the `cursos` table.
pub struct CourseCatalog<'a, S: RecordStore> {
    store: &'a S,
    audit: &'a dyn AuditLog,
    limits: &'a CatalogConfig,
}

impl<'a, S: RecordStore> CourseCatalog<'a, S> {
    pub fn new(store: &'a S, audit: &'a dyn AuditLog, limits: &'a CatalogConfig) -> Self {
        Self {
            store,
            audit,
            limits,
        }
    }

    /// Courses in stored order, optionally restricted to one level.
    pub fn list(&self, level: Option<Level>) -> Vec<Course> {
        let courses: Vec<Course> = self.store.load(Table::Courses);
        match level {
            Some(level) => courses.into_iter().filter(|c| c.level == level).collect(),
            None => courses,
        }
    }

    /// Look up a course by name, ignoring case.
    pub fn find(&self, name: &str) -> Option<Course> {
        self.list(None).into_iter().find(|c| c.is_named(name))
    }

    /// Add a new course.
    pub fn add(&self, name: &str, level: Level, content: &str) -> Result<CatalogWrite> {
        let name = validate_name(name)?;
        let mut courses = self.list(None);

        self.check_capacity(&courses, level, None)?;
        if courses.iter().any(|c| c.is_named(&name)) {
            return Err(CampusError::duplicate(format!(
                "course '{}' already exists",
                name
            )));
        }

        let (content, truncated) = truncate_chars(content, self.limits.max_content_chars);
        let course = Course {
            name,
            content,
            level,
        };

        courses.push(course.clone());
        self.store.save(Table::Courses, &courses)?;
        self.audit
            .info(&format!("Course added: {} ({})", course.name, course.level));

        Ok(CatalogWrite { course, truncated })
    }

    /// Edit an existing course. Any rejected change leaves the table as it was.
    pub fn edit(&self, name: &str, changes: CourseChanges) -> Result<CatalogWrite> {
        let mut courses = self.list(None);
        let idx = courses
            .iter()
            .position(|c| c.is_named(name))
            .ok_or_else(|| CampusError::not_found(format!("course '{}'", name.trim())))?;

        let mut course = courses[idx].clone();
        let mut truncated = false;

        if let Some(new_name) = changes.name {
            let new_name = validate_name(&new_name)?;
            let taken = courses
                .iter()
                .enumerate()
                .any(|(i, c)| i != idx && c.is_named(&new_name));
            if taken {
                return Err(CampusError::duplicate(format!(
                    "course '{}' already exists",
                    new_name
                )));
            }
            course.name = new_name;
        }

        if let Some(content) = changes.content {
            let (content, cut) = truncate_chars(&content, self.limits.max_content_chars);
            course.content = content;
            truncated = cut;
        }

        if let Some(level) = changes.level {
            if level != course.level {
                self.check_capacity(&courses, level, Some(idx))?;
                course.level = level;
            }
        }

        courses[idx] = course.clone();
        self.store.save(Table::Courses, &courses)?;
        self.audit
            .info(&format!("Course edited: {} ({})", course.name, course.level));

        Ok(CatalogWrite { course, truncated })
    }

    /// Delete a course. Its ratings and access records are kept.
    pub fn delete(&self, name: &str) -> Result<Course> {
        let mut courses = self.list(None);
        let idx = courses
            .iter()
            .position(|c| c.is_named(name))
            .ok_or_else(|| CampusError::not_found(format!("course '{}'", name.trim())))?;

        let removed = courses.remove(idx);
        self.store.save(Table::Courses, &courses)?;
        self.audit.info(&format!("Course deleted: {}", removed.name));

        Ok(removed)
    }

    /// Reject a course landing on a full level. `skip` excludes the course
    /// being moved from the count.
    fn check_capacity(&self, courses: &[Course], level: Level, skip: Option<usize>) -> Result<()> {
        let used = courses
            .iter()
            .enumerate()
            .filter(|(i, c)| Some(*i) != skip && c.level == level)
            .count();

        if used >= self.limits.max_courses_per_level {
            return Err(CampusError::validation(format!(
                "level '{}' already has the maximum of {} courses",
                level, self.limits.max_courses_per_level
            )));
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CampusError::validation("course name must not be empty"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditLog;
    use crate::storage::MemoryRecordStore;

    fn limits() -> CatalogConfig {
        CatalogConfig::default()
    }

    #[test]
    fn test_add_and_list() {
        let store = MemoryRecordStore::new();
        let audit = MemoryAuditLog::new();
        let limits = limits();
        let catalog = CourseCatalog::new(&store, &audit, &limits);

        catalog.add("Rust", Level::Beginner, "ownership").unwrap();
        catalog.add("Tokio", Level::Advanced, "async").unwrap();

        assert_eq!(catalog.list(None).len(), 2);
        let advanced = catalog.list(Some(Level::Advanced));
        assert_eq!(advanced.len(), 1);
        assert_eq!(advanced[0].name, "Tokio");
        assert!(catalog.list(Some(Level::Intermediate)).is_empty());
        assert!(audit.contains("Course added: Rust (iniciante)"));
    }

    #[test]
    fn test_add_rejects_case_insensitive_duplicate() {
        let store = MemoryRecordStore::new();
        let audit = MemoryAuditLog::new();
        let limits = limits();
        let catalog = CourseCatalog::new(&store, &audit, &limits);
        catalog.add("Rust", Level::Beginner, "").unwrap();

        let err = catalog.add("  rUST ", Level::Advanced, "").unwrap_err();
        assert!(matches!(err, CampusError::Duplicate { .. }));
        assert_eq!(catalog.list(None).len(), 1);
    }

    #[test]
    fn test_add_rejects_empty_name() {
        let store = MemoryRecordStore::new();
        let audit = MemoryAuditLog::new();
        let limits = limits();
        let catalog = CourseCatalog::new(&store, &audit, &limits);

        let err = catalog.add("   ", Level::Beginner, "").unwrap_err();
        assert!(matches!(err, CampusError::Validation { .. }));
    }

    #[test]
    fn test_level_cap() {
        let store = MemoryRecordStore::new();
        let audit = MemoryAuditLog::new();
        let limits = limits();
        let catalog = CourseCatalog::new(&store, &audit, &limits);

        for i in 0..7 {
            catalog
                .add(&format!("Curso {}", i), Level::Beginner, "")
                .unwrap();
        }

        let err = catalog.add("Curso 7", Level::Beginner, "").unwrap_err();
        assert!(matches!(err, CampusError::Validation { .. }));
        assert!(err.to_string().contains("maximum of 7"));

        // Other levels are unaffected
        catalog.add("Curso 7", Level::Intermediate, "").unwrap();
    }

    #[test]
    fn test_content_truncated_to_limit() {
        let store = MemoryRecordStore::new();
        let audit = MemoryAuditLog::new();
        let limits = CatalogConfig {
            max_content_chars: 10,
            ..CatalogConfig::default()
        };
        let catalog = CourseCatalog::new(&store, &audit, &limits);

        let written = catalog
            .add("Rust", Level::Beginner, "0123456789abcdef")
            .unwrap();
        assert!(written.truncated);
        assert_eq!(written.course.content, "0123456789");

        let written = catalog.add("Go", Level::Beginner, "short").unwrap();
        assert!(!written.truncated);
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let store = MemoryRecordStore::new();
        let audit = MemoryAuditLog::new();
        let limits = limits();
        let catalog = CourseCatalog::new(&store, &audit, &limits);
        catalog.add("Rust Básico", Level::Beginner, "").unwrap();

        assert_eq!(catalog.find("rust básico").unwrap().name, "Rust Básico");
        assert!(catalog.find("rust").is_none());
    }

    #[test]
    fn test_edit_name_content_level() {
        let store = MemoryRecordStore::new();
        let audit = MemoryAuditLog::new();
        let limits = limits();
        let catalog = CourseCatalog::new(&store, &audit, &limits);
        catalog.add("Rust", Level::Beginner, "v1").unwrap();

        let written = catalog
            .edit(
                "rust",
                CourseChanges {
                    name: Some("Rust 2024".to_string()),
                    content: Some("v2".to_string()),
                    level: Some(Level::Intermediate),
                },
            )
            .unwrap();

        assert_eq!(
            written.course,
            Course {
                name: "Rust 2024".to_string(),
                content: "v2".to_string(),
                level: Level::Intermediate,
            }
        );
        assert_eq!(catalog.list(None), vec![written.course]);
        assert!(audit.contains("Course edited: Rust 2024 (intermediário)"));
    }

    #[test]
    fn test_edit_can_change_case_of_own_name() {
        let store = MemoryRecordStore::new();
        let audit = MemoryAuditLog::new();
        let limits = limits();
        let catalog = CourseCatalog::new(&store, &audit, &limits);
        catalog.add("rust", Level::Beginner, "").unwrap();

        let written = catalog
            .edit(
                "rust",
                CourseChanges {
                    name: Some("Rust".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(written.course.name, "Rust");
    }

    #[test]
    fn test_edit_rejections_leave_table_untouched() {
        let store = MemoryRecordStore::new();
        let audit = MemoryAuditLog::new();
        let limits = CatalogConfig {
            max_courses_per_level: 1,
            ..CatalogConfig::default()
        };
        let catalog = CourseCatalog::new(&store, &audit, &limits);
        catalog.add("Rust", Level::Beginner, "a").unwrap();
        catalog.add("Go", Level::Advanced, "b").unwrap();
        let before = catalog.list(None);

        let dup = catalog
            .edit(
                "Rust",
                CourseChanges {
                    name: Some("GO".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(dup, CampusError::Duplicate { .. }));

        let full = catalog
            .edit(
                "Rust",
                CourseChanges {
                    content: Some("changed".to_string()),
                    level: Some(Level::Advanced),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(full, CampusError::Validation { .. }));

        let missing = catalog.edit("Java", CourseChanges::default()).unwrap_err();
        assert!(matches!(missing, CampusError::NotFound { .. }));

        assert_eq!(catalog.list(None), before);
    }

    #[test]
    fn test_edit_keeping_level_does_not_count_itself() {
        let store = MemoryRecordStore::new();
        let audit = MemoryAuditLog::new();
        let limits = CatalogConfig {
            max_courses_per_level: 1,
            ..CatalogConfig::default()
        };
        let catalog = CourseCatalog::new(&store, &audit, &limits);
        catalog.add("Rust", Level::Beginner, "").unwrap();

        catalog
            .edit(
                "Rust",
                CourseChanges {
                    level: Some(Level::Beginner),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    #[test]
    fn test_delete() {
        let store = MemoryRecordStore::new();
        let audit = MemoryAuditLog::new();
        let limits = limits();
        let catalog = CourseCatalog::new(&store, &audit, &limits);
        catalog.add("Rust", Level::Beginner, "").unwrap();
        catalog.add("Go", Level::Beginner, "").unwrap();

        let removed = catalog.delete("RUST").unwrap();
        assert_eq!(removed.name, "Rust");
        assert_eq!(catalog.list(None).len(), 1);
        assert!(audit.contains("Course deleted: Rust"));

        let err = catalog.delete("Rust").unwrap_err();
        assert!(matches!(err, CampusError::NotFound { .. }));
    }

    #[test]
    fn test_write_failure_propagates() {
        let store = MemoryRecordStore::new();
        let audit = MemoryAuditLog::new();
        let limits = limits();
        let catalog = CourseCatalog::new(&store, &audit, &limits);
        store.set_read_only(true);

        let err = catalog.add("Rust", Level::Beginner, "").unwrap_err();
        assert!(matches!(err, CampusError::Storage { .. }));
        assert!(audit.entries().is_empty());
    }
}
