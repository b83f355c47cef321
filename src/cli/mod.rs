//! CLI commands for Campus.
//!
//! Commands are organized into:
//! - **Account commands**: register, login, profile
//! - **Learner commands**: courses, view, rate
//! - **Admin commands**: admin course maintenance, stats
//!
//! Every command returns a serializable output that is printed either as
//! human-readable text or as JSON.

use serde::Serialize;

use crate::audit::{AuditLog, FileAuditLog};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::core::{User, UserDirectory};
use crate::error::Result;
use crate::storage::JsonFileStore;

// Account commands
pub mod account;
pub mod profile;

// Learner commands
pub mod courses;
pub mod rate;
pub mod view;

// Admin commands
pub mod admin;
pub mod stats;

pub use account::{LoginCommand, RegisterCommand};
pub use admin::AdminCommand;
pub use courses::CoursesCommand;
pub use profile::ProfileCommand;
pub use rate::RateCommand;
pub use stats::StatsCommand;
pub use view::ViewCommand;

/// Everything a command needs: configuration, tables, clock and the two
/// audit logs.
pub struct Context {
    pub config: Config,
    pub store: JsonFileStore,
    pub clock: Box<dyn Clock>,
    pub user_log: Box<dyn AuditLog>,
    pub admin_log: Box<dyn AuditLog>,
}

impl Context {
    /// Build the production context: file store, system clock, file logs.
    pub fn from_config(config: Config) -> Result<Self> {
        let store = JsonFileStore::from_config(&config)?;
        let user_log = FileAuditLog::new(config.user_log_path());
        let admin_log = FileAuditLog::new(config.admin_log_path());

        Ok(Self {
            config,
            store,
            clock: Box::new(SystemClock),
            user_log: Box::new(user_log),
            admin_log: Box::new(admin_log),
        })
    }

    /// The user directory, auditing to the user log.
    pub fn users(&self) -> UserDirectory<'_, JsonFileStore> {
        UserDirectory::new(&self.store, self.user_log.as_ref())
    }
}

/// A user's handle and password, as given on the command line.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub handle: String,
    pub password: String,
}

impl Credentials {
    pub fn new(handle: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            password: password.into(),
        }
    }

    /// Check the credentials against the user directory.
    pub fn authenticate(&self, ctx: &Context) -> Result<User> {
        ctx.users().authenticate(&self.handle, &self.password)
    }
}

/// Output switches shared by every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Render a command output as JSON or, via `human`, as text.
pub fn format_output<T: Serialize>(
    output: &T,
    options: &OutputOptions,
    human: impl FnOnce(&T) -> String,
) -> String {
    if options.quiet {
        return String::new();
    }

    if options.json {
        serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
    } else {
        human(output)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        success: bool,
    }

    #[test]
    fn test_format_output_modes() {
        let sample = Sample { success: true };

        let quiet = OutputOptions {
            json: true,
            quiet: true,
        };
        assert_eq!(format_output(&sample, &quiet, |_| "text".into()), "");

        let json = OutputOptions {
            json: true,
            quiet: false,
        };
        assert!(format_output(&sample, &json, |_| "text".into()).contains("\"success\": true"));

        let human = OutputOptions::default();
        assert_eq!(format_output(&sample, &human, |_| "text".into()), "text");
    }

    #[test]
    fn test_credentials_authenticate() {
        let t = test_support::test_context();
        let creds = test_support::register(&t.ctx, "ana", "segredo123");

        assert_eq!(creds.authenticate(&t.ctx).unwrap().handle, "ana");
        assert!(Credentials::new("ana", "wrong-pass")
            .authenticate(&t.ctx)
            .is_err());
    }
}
