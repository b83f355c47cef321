//! Admin command: course catalog maintenance.

use serde::Serialize;

use crate::auth::authenticate_admin;
use crate::cli::{format_output, Context, OutputOptions};
use crate::core::{Course, CourseCatalog, CourseChanges, Level};
use crate::error::{CampusError, Result};

/// Admin handle and password, as given on the command line.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Check against the configured admin account, auditing the attempt.
    pub fn authenticate(&self, ctx: &Context) -> Result<()> {
        match authenticate_admin(&ctx.config.admin, &self.username, &self.password) {
            Ok(()) => {
                ctx.admin_log
                    .info(&format!("Admin '{}' authenticated.", self.username));
                Ok(())
            }
            Err(e) => {
                ctx.admin_log.warning("Invalid admin login attempt.");
                Err(e)
            }
        }
    }
}

/// Catalog operation to perform.
#[derive(Debug, Clone)]
pub enum AdminAction {
    Add {
        name: String,
        level: Level,
        content: String,
    },
    Show {
        name: String,
    },
    Edit {
        name: String,
        changes: CourseChanges,
    },
    Delete {
        name: String,
    },
}

/// Options for the admin command.
#[derive(Debug, Clone)]
pub struct AdminOptions {
    pub output: OutputOptions,
    pub credentials: AdminCredentials,
    pub action: AdminAction,
}

/// Output format for the admin command.
#[derive(Debug, Clone, Serialize)]
pub struct AdminOutput {
    pub success: bool,
    /// What was done: `added`, `shown`, `edited` or `deleted`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<Course>,
    /// Whether the content was cut to the configured limit.
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AdminOutput {
    fn done(action: &'static str, course: Course, truncated: bool) -> Self {
        Self {
            success: true,
            action: Some(action),
            course: Some(course),
            truncated,
            error: None,
        }
    }

    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            action: None,
            course: None,
            truncated: false,
            error: Some(error.into()),
        }
    }
}

/// The admin command implementation.
pub struct AdminCommand<'a> {
    ctx: &'a Context,
}

impl<'a> AdminCommand<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    pub fn run(&self, options: &AdminOptions) -> AdminOutput {
        match self.apply(options) {
            Ok(output) => output,
            Err(e) => AdminOutput::failure(e.to_string()),
        }
    }

    fn apply(&self, options: &AdminOptions) -> Result<AdminOutput> {
        options.credentials.authenticate(self.ctx)?;

        let catalog = CourseCatalog::new(
            &self.ctx.store,
            self.ctx.admin_log.as_ref(),
            &self.ctx.config.catalog,
        );

        let output = match &options.action {
            AdminAction::Add {
                name,
                level,
                content,
            } => {
                let written = catalog.add(name, *level, content)?;
                AdminOutput::done("added", written.course, written.truncated)
            }
            AdminAction::Show { name } => {
                let course = catalog
                    .find(name)
                    .ok_or_else(|| CampusError::not_found(format!("course '{}'", name)))?;
                AdminOutput::done("shown", course, false)
            }
            AdminAction::Edit { name, changes } => {
                let written = catalog.edit(name, changes.clone())?;
                AdminOutput::done("edited", written.course, written.truncated)
            }
            AdminAction::Delete { name } => {
                AdminOutput::done("deleted", catalog.delete(name)?, false)
            }
        };

        Ok(output)
    }

    pub fn format_output(&self, output: &AdminOutput, options: &AdminOptions) -> String {
        format_output(output, &options.output, |output| {
            let (Some(action), Some(course)) = (output.action, &output.course) else {
                return format!(
                    "Admin command failed: {}",
                    output.error.as_deref().unwrap_or("unknown error")
                );
            };

            if action == "shown" {
                return format!(
                    "Course '{}' ({}):\n{}",
                    course.name, course.level, course.content
                );
            }

            let mut text = format!("Course '{}' ({}) {}.", course.name, course.level, action);
            if output.truncated {
                text.push_str(&format!(
                    "\nContent was truncated to {} characters.",
                    self.ctx.config.catalog.max_content_chars
                ));
            }
            text
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::cli::test_support::{test_context_with, TestContext};
    use crate::config::Config;

    fn admin_context() -> TestContext {
        let mut config = Config::default();
        config.admin.password_hash = Some(hash_password("admin123").unwrap());
        config.catalog.max_content_chars = 20;
        test_context_with(config)
    }

    fn options(action: AdminAction) -> AdminOptions {
        AdminOptions {
            output: OutputOptions::default(),
            credentials: AdminCredentials::new("admin", "admin123"),
            action,
        }
    }

    fn add(name: &str, level: Level, content: &str) -> AdminAction {
        AdminAction::Add {
            name: name.to_string(),
            level,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_add_course() {
        let t = admin_context();
        let cmd = AdminCommand::new(&t.ctx);
        let options = options(add("Rust", Level::Beginner, "ownership"));

        let output = cmd.run(&options);

        assert!(output.success);
        assert!(!output.truncated);
        assert_eq!(
            cmd.format_output(&output, &options),
            "Course 'Rust' (iniciante) added."
        );
        assert!(t.admin_log.0.contains("Admin 'admin' authenticated."));
        assert!(t.admin_log.0.contains("Course added: Rust (iniciante)"));
    }

    #[test]
    fn test_add_truncates_content() {
        let t = admin_context();
        let cmd = AdminCommand::new(&t.ctx);
        let options = options(add("Rust", Level::Beginner, &"x".repeat(50)));

        let output = cmd.run(&options);

        assert!(output.truncated);
        assert_eq!(output.course.as_ref().unwrap().content.len(), 20);
        assert!(cmd
            .format_output(&output, &options)
            .ends_with("Content was truncated to 20 characters."));
    }

    #[test]
    fn test_show_edit_delete() {
        let t = admin_context();
        let cmd = AdminCommand::new(&t.ctx);
        cmd.run(&options(add("Rust", Level::Beginner, "v1")));

        let show = options(AdminAction::Show {
            name: "rust".to_string(),
        });
        let output = cmd.run(&show);
        assert_eq!(
            cmd.format_output(&output, &show),
            "Course 'Rust' (iniciante):\nv1"
        );

        let output = cmd.run(&options(AdminAction::Edit {
            name: "Rust".to_string(),
            changes: CourseChanges {
                level: Some(Level::Advanced),
                ..Default::default()
            },
        }));
        assert_eq!(output.course.unwrap().level, Level::Advanced);

        let output = cmd.run(&options(AdminAction::Delete {
            name: "Rust".to_string(),
        }));
        assert_eq!(output.action, Some("deleted"));
        assert!(cmd.run(&show).error.unwrap().contains("not found"));
    }

    #[test]
    fn test_bad_admin_password() {
        let t = admin_context();
        let cmd = AdminCommand::new(&t.ctx);
        let mut options = options(add("Rust", Level::Beginner, ""));
        options.credentials.password = "wrong".to_string();

        let output = cmd.run(&options);

        assert!(!output.success);
        assert!(t.admin_log.0.contains("WARNING - Invalid admin login attempt."));
        assert!(CourseCatalog::new(&t.ctx.store, t.ctx.admin_log.as_ref(), &t.ctx.config.catalog)
            .list(None)
            .is_empty());
    }

    #[test]
    fn test_admin_not_configured() {
        let t = crate::cli::test_support::test_context();
        let cmd = AdminCommand::new(&t.ctx);

        let output = cmd.run(&options(add("Rust", Level::Beginner, "")));
        assert!(output.error.unwrap().contains("not configured"));
    }
}
