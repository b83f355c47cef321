//! View command: read a course and record the visit.

use serde::Serialize;

use crate::cli::{format_output, Context, Credentials, OutputOptions};
use crate::core::access::sanitize_duration;
use crate::core::{AccessTracker, Course, CourseCatalog, Level};
use crate::error::{CampusError, Result};

/// Options for the view command.
#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub output: OutputOptions,
    pub credentials: Credentials,
    /// Course name, case-insensitive.
    pub course: String,
    /// Include the course content in the formatted output.
    pub include_content: bool,
}

/// Output format for the view command.
#[derive(Debug, Clone, Serialize)]
pub struct ViewOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Seconds spent in this visit.
    pub duration: f64,
    /// Visits of this user to this course so far.
    pub visits: u32,
    /// Seconds spent on this course so far.
    pub total_duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ViewOutput {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            course: None,
            level: None,
            content: None,
            duration: 0.0,
            visits: 0,
            total_duration: 0.0,
            error: Some(error.into()),
        }
    }
}

/// The view command implementation.
pub struct ViewCommand<'a> {
    ctx: &'a Context,
}

impl<'a> ViewCommand<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Run the command. `read` is handed the course once it is found and
    /// returns how many seconds the user spent on it.
    pub fn run(&self, options: &ViewOptions, read: impl FnOnce(&Course) -> f64) -> ViewOutput {
        match self.visit(options, read) {
            Ok(output) => output,
            Err(e) => ViewOutput::failure(e.to_string()),
        }
    }

    fn visit(&self, options: &ViewOptions, read: impl FnOnce(&Course) -> f64) -> Result<ViewOutput> {
        let user = options.credentials.authenticate(self.ctx)?;

        let catalog = CourseCatalog::new(
            &self.ctx.store,
            self.ctx.user_log.as_ref(),
            &self.ctx.config.catalog,
        );
        let course = catalog
            .find(&options.course)
            .ok_or_else(|| CampusError::not_found(format!("course '{}'", options.course)))?;

        let duration = sanitize_duration(read(&course));

        let tracker = AccessTracker::new(
            &self.ctx.store,
            self.ctx.clock.as_ref(),
            self.ctx.user_log.as_ref(),
        );
        let record = tracker.record_access(&user.handle, &course.name, course.level, duration)?;

        Ok(ViewOutput {
            success: true,
            course: Some(course.name),
            level: Some(course.level),
            content: Some(course.content),
            duration,
            visits: record.visits,
            total_duration: record.duration,
            error: None,
        })
    }

    pub fn format_output(&self, output: &ViewOutput, options: &ViewOptions) -> String {
        format_output(output, &options.output, |output| {
            if !output.success {
                return format!(
                    "View failed: {}",
                    output.error.as_deref().unwrap_or("unknown error")
                );
            }

            let name = output.course.as_deref().unwrap_or_default();
            let mut lines = Vec::new();
            if options.include_content {
                lines.push(format!("Content of course '{}':", name));
                lines.push(output.content.clone().unwrap_or_default());
                lines.push(String::new());
            }
            lines.push(format!(
                "Access recorded: {}, duration {:.2} seconds (visit {}, {:.2} seconds in total).",
                name, output.duration, output.visits, output.total_duration
            ));
            lines.join("\n")
        })
    }
}
