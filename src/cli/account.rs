//! Register and login commands.

use serde::Serialize;

use crate::cli::{format_output, Context, Credentials, OutputOptions};
use crate::core::User;

/// Account details safe to print (never the password hash).
#[derive(Debug, Clone, Serialize)]
pub struct AccountInfo {
    pub handle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
}

impl From<&User> for AccountInfo {
    fn from(user: &User) -> Self {
        Self {
            handle: user.handle.clone(),
            gender: user.gender.clone(),
            age: user.age,
        }
    }
}

/// Output of the register and login commands.
#[derive(Debug, Clone, Serialize)]
pub struct AccountOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AccountOutput {
    fn success(user: &User) -> Self {
        Self {
            success: true,
            account: Some(AccountInfo::from(user)),
            error: None,
        }
    }

    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            account: None,
            error: Some(error.into()),
        }
    }
}

/// Options for the register command.
#[derive(Debug, Clone)]
pub struct RegisterOptions {
    pub output: OutputOptions,
    pub handle: String,
    pub password: String,
    pub gender: String,
    pub age: i64,
}

/// The register command implementation.
pub struct RegisterCommand<'a> {
    ctx: &'a Context,
}

impl<'a> RegisterCommand<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    pub fn run(&self, options: &RegisterOptions) -> AccountOutput {
        match self.ctx.users().register(
            &options.handle,
            &options.password,
            &options.gender,
            options.age,
        ) {
            Ok(user) => AccountOutput::success(&user),
            Err(e) => AccountOutput::failure(e.to_string()),
        }
    }

    pub fn format_output(&self, output: &AccountOutput, options: &RegisterOptions) -> String {
        format_output(output, &options.output, |output| match &output.account {
            Some(account) => format!("User '{}' registered.", account.handle),
            None => failure_text("Registration", output),
        })
    }
}

/// Options for the login command.
#[derive(Debug, Clone)]
pub struct LoginOptions {
    pub output: OutputOptions,
    pub credentials: Credentials,
}

/// The login command implementation.
///
/// Checks credentials and shows the account; every other user command
/// authenticates on its own.
pub struct LoginCommand<'a> {
    ctx: &'a Context,
}

impl<'a> LoginCommand<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    pub fn run(&self, options: &LoginOptions) -> AccountOutput {
        match options.credentials.authenticate(self.ctx) {
            Ok(user) => AccountOutput::success(&user),
            Err(e) => AccountOutput::failure(e.to_string()),
        }
    }

    pub fn format_output(&self, output: &AccountOutput, options: &LoginOptions) -> String {
        format_output(output, &options.output, |output| match &output.account {
            Some(account) => {
                let mut lines = vec![format!("Welcome, {}!", account.handle)];
                if let Some(gender) = &account.gender {
                    lines.push(format!("  Gender: {}", gender));
                }
                if let Some(age) = account.age {
                    lines.push(format!("  Age: {}", age));
                }
                lines.join("\n")
            }
            None => failure_text("Login", output),
        })
    }
}

fn failure_text(action: &str, output: &AccountOutput) -> String {
    format!(
        "{} failed: {}",
        action,
        output.error.as_deref().unwrap_or("unknown error")
    )
}
