//! Profile command: show, edit or delete the signed-in account.

use serde::Serialize;

use crate::cli::account::AccountInfo;
use crate::cli::{format_output, Context, Credentials, OutputOptions};
use crate::error::{CampusError, Result};

/// What to do with the account.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileAction {
    Show,
    Rename(String),
    Password(String),
    Age(i64),
    Gender(String),
    /// Delete the account. Refused unless `confirmed`.
    Delete { confirmed: bool },
}

/// Options for the profile command.
#[derive(Debug, Clone)]
pub struct ProfileOptions {
    pub output: OutputOptions,
    pub credentials: Credentials,
    pub action: ProfileAction,
}

/// Output format for the profile command.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileOutput {
    pub success: bool,
    /// The account after the action; absent after deletion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountInfo>,
    /// Whether the account was deleted.
    pub deleted: bool,
    /// Where the users table was backed up before deletion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProfileOutput {
    fn account(account: AccountInfo) -> Self {
        Self {
            success: true,
            account: Some(account),
            deleted: false,
            backup: None,
            error: None,
        }
    }

    fn deleted(backup: String) -> Self {
        Self {
            success: true,
            account: None,
            deleted: true,
            backup: Some(backup),
            error: None,
        }
    }

    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            account: None,
            deleted: false,
            backup: None,
            error: Some(error.into()),
        }
    }
}

/// The profile command implementation.
pub struct ProfileCommand<'a> {
    ctx: &'a Context,
}

impl<'a> ProfileCommand<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    pub fn run(&self, options: &ProfileOptions) -> ProfileOutput {
        match self.apply(options) {
            Ok(output) => output,
            Err(e) => ProfileOutput::failure(e.to_string()),
        }
    }

    fn apply(&self, options: &ProfileOptions) -> Result<ProfileOutput> {
        let user = options.credentials.authenticate(self.ctx)?;
        let users = self.ctx.users();

        let updated = match &options.action {
            ProfileAction::Show => user,
            ProfileAction::Rename(new_handle) => users.rename(&user.handle, new_handle)?,
            ProfileAction::Password(new_password) => {
                users.change_password(&user.handle, new_password)?
            }
            ProfileAction::Age(age) => users.change_age(&user.handle, *age)?,
            ProfileAction::Gender(gender) => users.change_gender(&user.handle, gender)?,
            ProfileAction::Delete { confirmed } => {
                if !confirmed {
                    return Err(CampusError::validation(
                        "account deletion must be confirmed with --yes",
                    ));
                }
                let backup = users.delete(&user.handle)?;
                return Ok(ProfileOutput::deleted(backup));
            }
        };

        Ok(ProfileOutput::account(AccountInfo::from(&updated)))
    }

    pub fn format_output(&self, output: &ProfileOutput, options: &ProfileOptions) -> String {
        format_output(output, &options.output, |output| {
            if !output.success {
                return format!(
                    "Profile update failed: {}",
                    output.error.as_deref().unwrap_or("unknown error")
                );
            }

            if output.deleted {
                return format!(
                    "Account '{}' deleted (backup: {}).",
                    options.credentials.handle,
                    output.backup.as_deref().unwrap_or("none")
                );
            }

            let Some(account) = &output.account else {
                return String::new();
            };
            let mut lines = Vec::new();
            if options.action != ProfileAction::Show {
                lines.push("Profile updated.".to_string());
            }
            lines.push(format!("  Handle: {}", account.handle));
            lines.push(format!(
                "  Gender: {}",
                account.gender.as_deref().unwrap_or("-")
            ));
            lines.push(format!(
                "  Age: {}",
                account
                    .age
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| "-".to_string())
            ));
            lines.join("\n")
        })
    }
}
