//! Rate command: score a course from 1 to 5, once.

use serde::Serialize;

use crate::cli::{format_output, Context, Credentials, OutputOptions};
use crate::core::{CourseCatalog, Level, RatingLedger};
use crate::error::{CampusError, Result};

/// Options for the rate command.
#[derive(Debug, Clone)]
pub struct RateOptions {
    pub output: OutputOptions,
    pub credentials: Credentials,
    /// Course name, case-insensitive.
    pub course: String,
    pub score: i64,
}

/// Output format for the rate command.
#[derive(Debug, Clone, Serialize)]
pub struct RateOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The rate command implementation.
pub struct RateCommand<'a> {
    ctx: &'a Context,
}

impl<'a> RateCommand<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    pub fn run(&self, options: &RateOptions) -> RateOutput {
        match self.rate(options) {
            Ok(output) => output,
            Err(e) => RateOutput {
                success: false,
                course: None,
                level: None,
                score: None,
                error: Some(e.to_string()),
            },
        }
    }

    fn rate(&self, options: &RateOptions) -> Result<RateOutput> {
        let user = options.credentials.authenticate(self.ctx)?;

        let catalog = CourseCatalog::new(
            &self.ctx.store,
            self.ctx.user_log.as_ref(),
            &self.ctx.config.catalog,
        );
        let course = catalog
            .find(&options.course)
            .ok_or_else(|| CampusError::not_found(format!("course '{}'", options.course)))?;

        let ledger = RatingLedger::new(
            &self.ctx.store,
            self.ctx.clock.as_ref(),
            self.ctx.user_log.as_ref(),
        );
        let rating = ledger.submit_rating(&user.handle, &course.name, course.level, options.score)?;

        Ok(RateOutput {
            success: true,
            course: Some(rating.course),
            level: Some(rating.level),
            score: Some(rating.score.value()),
            error: None,
        })
    }

    pub fn format_output(&self, output: &RateOutput, options: &RateOptions) -> String {
        format_output(output, &options.output, |output| {
            match (&output.course, output.score) {
                (Some(course), Some(score)) => {
                    format!("Rating registered: {} rated {}/5.", course, score)
                }
                _ => format!(
                    "Rating failed: {}",
                    output.error.as_deref().unwrap_or("unknown error")
                ),
            }
        })
    }
}
