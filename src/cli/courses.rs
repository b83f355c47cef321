//! Courses command: list the catalog, optionally for one level.

use serde::Serialize;

use crate::cli::{format_output, Context, OutputOptions};
use crate::core::{Course, CourseCatalog, Level};

/// Options for the courses command.
#[derive(Debug, Clone, Default)]
pub struct CoursesOptions {
    pub output: OutputOptions,
    /// Only list courses of this level.
    pub level: Option<Level>,
}

/// Catalog entry for output; content is summarized by its length.
#[derive(Debug, Clone, Serialize)]
pub struct CourseInfo {
    pub name: String,
    pub level: Level,
    pub content_chars: usize,
}

impl From<&Course> for CourseInfo {
    fn from(course: &Course) -> Self {
        Self {
            name: course.name.clone(),
            level: course.level,
            content_chars: course.content.chars().count(),
        }
    }
}

/// Output format for the courses command.
#[derive(Debug, Clone, Serialize)]
pub struct CoursesOutput {
    pub success: bool,
    pub count: usize,
    pub courses: Vec<CourseInfo>,
}

/// The courses command implementation.
pub struct CoursesCommand<'a> {
    ctx: &'a Context,
}

impl<'a> CoursesCommand<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    pub fn run(&self, options: &CoursesOptions) -> CoursesOutput {
        let catalog = CourseCatalog::new(
            &self.ctx.store,
            self.ctx.admin_log.as_ref(),
            &self.ctx.config.catalog,
        );
        let mut courses = catalog.list(options.level);
        courses.sort_by_key(|c| c.level);

        CoursesOutput {
            success: true,
            count: courses.len(),
            courses: courses.iter().map(CourseInfo::from).collect(),
        }
    }

    pub fn format_output(&self, output: &CoursesOutput, options: &CoursesOptions) -> String {
        format_output(output, &options.output, |output| {
            if output.courses.is_empty() {
                return match options.level {
                    Some(level) => format!("No courses for level {}.", level),
                    None => "No courses available.".to_string(),
                };
            }

            let mut lines = Vec::new();
            let mut current: Option<Level> = None;
            for course in &output.courses {
                if current != Some(course.level) {
                    if current.is_some() {
                        lines.push(String::new());
                    }
                    lines.push(format!("[{}] {}", course.level.code(), course.level));
                    current = Some(course.level);
                }
                lines.push(format!("  - {}", course.name));
            }
            lines.join("\n")
        })
    }
}
