//! Campus - course catalog and learning statistics
//!
//! CLI entry point with global panic handler.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use campus::auth::hash_password;
use campus::cli::{Context, Credentials, OutputOptions};
use campus::config::{campus_home, Config};
use campus::core::{Course, CourseChanges, Level};
use campus::error::exit_codes;
use campus::util::read_to_string_limited;

/// Environment variable holding the user password for non-interactive use.
const PASSWORD_ENV: &str = "CAMPUS_PASSWORD";
/// Environment variable holding the new password for `profile password`.
const NEW_PASSWORD_ENV: &str = "CAMPUS_NEW_PASSWORD";
/// Environment variable holding the admin password.
const ADMIN_PASSWORD_ENV: &str = "CAMPUS_ADMIN_PASSWORD";
/// Environment variable with the tracing filter directives.
const LOG_ENV: &str = "CAMPUS_LOG";

// =============================================================================
// CLI Definition
// =============================================================================

/// Campus - course catalog, access tracking and rating statistics
#[derive(Parser)]
#[command(name = "campus")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new user account
    Register {
        /// Handle (at least 3 characters, no spaces)
        handle: String,
        /// masculino or feminino
        #[arg(long, short)]
        gender: String,
        /// Age in years
        #[arg(long, short, allow_negative_numbers = true)]
        age: i64,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Check credentials and show the account
    Login {
        /// Handle to sign in as
        handle: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// List available courses
    Courses {
        /// Only this level (1/2/3 or its name)
        #[arg(long, short)]
        level: Option<Level>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Read a course and record the time spent on it
    View {
        /// Course name
        course: String,
        /// Handle to sign in as
        #[arg(long, short)]
        user: String,
        /// Record this many seconds instead of waiting for Enter
        #[arg(long, short)]
        duration: Option<f64>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Rate a course from 1 to 5
    Rate {
        /// Course name
        course: String,
        /// Score from 1 to 5
        #[arg(allow_negative_numbers = true)]
        score: i64,
        /// Handle to sign in as
        #[arg(long, short)]
        user: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show, edit or delete your account
    Profile {
        /// Handle to sign in as
        #[arg(long, short)]
        user: String,
        /// Action to perform
        #[command(subcommand)]
        action: ProfileAction,
        /// Output as JSON
        #[arg(long, short, global = true)]
        json: bool,
        /// Suppress output
        #[arg(long, short, global = true)]
        quiet: bool,
    },

    /// [Admin] Maintain the course catalog and read statistics
    Admin {
        /// Admin handle (defaults to the configured one)
        #[arg(long)]
        admin: Option<String>,
        /// Action to perform
        #[command(subcommand)]
        action: AdminAction,
        /// Output as JSON
        #[arg(long, short, global = true)]
        json: bool,
        /// Suppress output
        #[arg(long, short, global = true)]
        quiet: bool,
    },

    /// Hash a password read from stdin, for admin.password_hash
    HashPassword,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show the account
    Show,
    /// Change the handle
    Rename {
        /// New handle
        new_handle: String,
    },
    /// Change the password (read from CAMPUS_NEW_PASSWORD or stdin)
    Password,
    /// Change the age
    Age {
        /// New age in years
        #[arg(allow_negative_numbers = true)]
        age: i64,
    },
    /// Change the gender
    Gender {
        /// masculino or feminino
        gender: String,
    },
    /// Delete the account (the users table is backed up first)
    Delete {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Add a course
    Add {
        /// Course name
        name: String,
        /// Level (1/2/3 or its name)
        #[arg(long, short)]
        level: Level,
        #[command(flatten)]
        content: ContentArgs,
    },
    /// Show a course with its content
    Show {
        /// Course name
        name: String,
    },
    /// Edit a course
    Edit {
        /// Current course name
        name: String,
        /// New course name
        #[arg(long)]
        new_name: Option<String>,
        /// New level (1/2/3 or its name)
        #[arg(long, short)]
        level: Option<Level>,
        #[command(flatten)]
        content: ContentArgs,
    },
    /// Delete a course (its ratings and accesses are kept)
    Delete {
        /// Course name
        name: String,
    },
    /// Show statistics
    Stats {
        /// Which statistics
        #[arg(value_enum)]
        topic: StatsTopicArg,
        /// Render text charts
        #[arg(long, short)]
        chart: bool,
    },
}

#[derive(Args)]
struct ContentArgs {
    /// Course content
    #[arg(long, conflicts_with = "content_file")]
    content: Option<String>,
    /// Read the course content from a file
    #[arg(long)]
    content_file: Option<PathBuf>,
}

impl ContentArgs {
    fn read(&self) -> campus::Result<Option<String>> {
        match (&self.content, &self.content_file) {
            (Some(text), _) => Ok(Some(text.clone())),
            (None, Some(path)) => read_to_string_limited(path).map(Some),
            (None, None) => Ok(None),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StatsTopicArg {
    Users,
    Accesses,
    Ratings,
}

impl From<StatsTopicArg> for campus::cli::stats::StatsTopic {
    fn from(topic: StatsTopicArg) -> Self {
        match topic {
            StatsTopicArg::Users => Self::Users,
            StatsTopicArg::Accesses => Self::Accesses,
            StatsTopicArg::Ratings => Self::Ratings,
        }
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();
    init_tracing();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("campus error: {}", e);
            ExitCode::from(exit_codes::FAILURE as u8)
        }
    }
}

/// Set up the global panic handler.
///
/// On panic, logs to <campus home>/crash.log and exits with code 3.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("campus panic: {}", info);

        if let Some(home) = campus_home() {
            let crash_log = home.join("crash.log");
            let _ = std::fs::create_dir_all(&home);
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

/// Install the stderr subscriber, filtered by `CAMPUS_LOG` (default `warn`).
fn init_tracing() {
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Commands::HashPassword = cli.command {
        return run_hash_password();
    }

    let cwd = std::env::current_dir()?;
    let config = Config::load_from_cwd(&cwd);
    let ctx = Context::from_config(config)?;

    match cli.command {
        Commands::Register {
            handle,
            gender,
            age,
            json,
            quiet,
        } => run_register(&ctx, handle, gender, age, OutputOptions { json, quiet }),
        Commands::Login {
            handle,
            json,
            quiet,
        } => run_login(&ctx, handle, OutputOptions { json, quiet }),
        Commands::Courses { level, json, quiet } => {
            run_courses(&ctx, level, OutputOptions { json, quiet })
        }
        Commands::View {
            course,
            user,
            duration,
            json,
            quiet,
        } => run_view(&ctx, course, user, duration, OutputOptions { json, quiet }),
        Commands::Rate {
            course,
            score,
            user,
            json,
            quiet,
        } => run_rate(&ctx, course, score, user, OutputOptions { json, quiet }),
        Commands::Profile {
            user,
            action,
            json,
            quiet,
        } => run_profile(&ctx, user, action, OutputOptions { json, quiet }),
        Commands::Admin {
            admin,
            action,
            json,
            quiet,
        } => run_admin(&ctx, admin, action, OutputOptions { json, quiet }),
        Commands::HashPassword => run_hash_password(),
    }
}

/// Convert a success boolean to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::SUCCESS as u8)
    } else {
        ExitCode::from(exit_codes::FAILURE as u8)
    }
}

fn print_output(formatted: &str) {
    if !formatted.is_empty() {
        println!("{}", formatted);
    }
}

/// Read a secret from `env_var`, or prompt on stderr and read a line.
fn read_secret(env_var: &str, prompt: &str) -> io::Result<String> {
    if let Ok(value) = std::env::var(env_var) {
        if !value.is_empty() {
            return Ok(value);
        }
    }

    eprint!("{}", prompt);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn user_credentials(handle: String) -> io::Result<Credentials> {
    let password = read_secret(PASSWORD_ENV, "Password: ")?;
    Ok(Credentials::new(handle, password))
}

fn run_register(
    ctx: &Context,
    handle: String,
    gender: String,
    age: i64,
    output: OutputOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use campus::cli::account::{RegisterCommand, RegisterOptions};

    let password = read_secret(PASSWORD_ENV, "Password (at least 6 characters): ")?;
    let options = RegisterOptions {
        output,
        handle,
        password,
        gender,
        age,
    };

    let cmd = RegisterCommand::new(ctx);
    let result = cmd.run(&options);
    print_output(&cmd.format_output(&result, &options));

    Ok(success_to_exit_code(result.success))
}

fn run_login(
    ctx: &Context,
    handle: String,
    output: OutputOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use campus::cli::account::{LoginCommand, LoginOptions};

    let options = LoginOptions {
        output,
        credentials: user_credentials(handle)?,
    };

    let cmd = LoginCommand::new(ctx);
    let result = cmd.run(&options);
    print_output(&cmd.format_output(&result, &options));

    Ok(success_to_exit_code(result.success))
}

fn run_courses(
    ctx: &Context,
    level: Option<Level>,
    output: OutputOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use campus::cli::courses::{CoursesCommand, CoursesOptions};

    let options = CoursesOptions { output, level };

    let cmd = CoursesCommand::new(ctx);
    let result = cmd.run(&options);
    print_output(&cmd.format_output(&result, &options));

    Ok(success_to_exit_code(result.success))
}

fn run_view(
    ctx: &Context,
    course: String,
    user: String,
    duration: Option<f64>,
    output: OutputOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use campus::cli::view::{ViewCommand, ViewOptions};

    let options = ViewOptions {
        output,
        credentials: user_credentials(user)?,
        course,
        include_content: duration.is_some(),
    };

    let cmd = ViewCommand::new(ctx);
    let result = match duration {
        Some(seconds) => cmd.run(&options, |_| seconds),
        None => cmd.run(&options, |course| read_interactively(course, &output)),
    };
    print_output(&cmd.format_output(&result, &options));

    Ok(success_to_exit_code(result.success))
}

/// Show the content and time how long it takes until Enter is pressed.
fn read_interactively(course: &Course, output: &OutputOptions) -> f64 {
    if !output.json && !output.quiet {
        println!("Content of course '{}':", course.name);
        println!("{}", course.content);
    }
    eprint!("\nPress Enter when you are done reading.");
    let _ = io::stderr().flush();

    let start = Instant::now();
    let mut line = String::new();
    if let Err(e) = io::stdin().lock().read_line(&mut line) {
        tracing::warn!(error = %e, "could not read from stdin");
    }
    start.elapsed().as_secs_f64()
}

fn run_rate(
    ctx: &Context,
    course: String,
    score: i64,
    user: String,
    output: OutputOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use campus::cli::rate::{RateCommand, RateOptions};

    let options = RateOptions {
        output,
        credentials: user_credentials(user)?,
        course,
        score,
    };

    let cmd = RateCommand::new(ctx);
    let result = cmd.run(&options);
    print_output(&cmd.format_output(&result, &options));

    Ok(success_to_exit_code(result.success))
}

fn run_profile(
    ctx: &Context,
    user: String,
    action: ProfileAction,
    output: OutputOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use campus::cli::profile::{ProfileAction as Action, ProfileCommand, ProfileOptions};

    let credentials = user_credentials(user)?;
    let action = match action {
        ProfileAction::Show => Action::Show,
        ProfileAction::Rename { new_handle } => Action::Rename(new_handle),
        ProfileAction::Password => Action::Password(read_secret(
            NEW_PASSWORD_ENV,
            "New password (at least 6 characters): ",
        )?),
        ProfileAction::Age { age } => Action::Age(age),
        ProfileAction::Gender { gender } => Action::Gender(gender),
        ProfileAction::Delete { yes } => Action::Delete { confirmed: yes },
    };
    let options = ProfileOptions {
        output,
        credentials,
        action,
    };

    let cmd = ProfileCommand::new(ctx);
    let result = cmd.run(&options);
    print_output(&cmd.format_output(&result, &options));

    Ok(success_to_exit_code(result.success))
}

fn run_admin(
    ctx: &Context,
    admin: Option<String>,
    action: AdminAction,
    output: OutputOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use campus::cli::admin::{
        AdminAction as Action, AdminCommand, AdminCredentials, AdminOptions,
    };
    use campus::cli::stats::{StatsCommand, StatsOptions};

    let username = admin.unwrap_or_else(|| ctx.config.admin.username.clone());
    let password = read_secret(ADMIN_PASSWORD_ENV, "Admin password: ")?;
    let credentials = AdminCredentials::new(username, password);

    let action = match action {
        AdminAction::Stats { topic, chart } => {
            let options = StatsOptions {
                output,
                credentials,
                topic: topic.into(),
                chart,
            };
            let cmd = StatsCommand::new(ctx);
            let result = cmd.run(&options);
            print_output(&cmd.format_output(&result, &options));
            return Ok(success_to_exit_code(result.success));
        }
        AdminAction::Add {
            name,
            level,
            content,
        } => Action::Add {
            name,
            level,
            content: content.read()?.unwrap_or_default(),
        },
        AdminAction::Show { name } => Action::Show { name },
        AdminAction::Edit {
            name,
            new_name,
            level,
            content,
        } => Action::Edit {
            name,
            changes: CourseChanges {
                name: new_name,
                content: content.read()?,
                level,
            },
        },
        AdminAction::Delete { name } => Action::Delete { name },
    };
    let options = AdminOptions {
        output,
        credentials,
        action,
    };

    let cmd = AdminCommand::new(ctx);
    let result = cmd.run(&options);
    print_output(&cmd.format_output(&result, &options));

    Ok(success_to_exit_code(result.success))
}

fn run_hash_password() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let password = read_secret(PASSWORD_ENV, "Password to hash: ")?;
    if password.is_empty() {
        eprintln!("campus error: empty password");
        return Ok(ExitCode::from(exit_codes::FAILURE as u8));
    }

    println!("{}", hash_password(&password)?);
    Ok(ExitCode::from(exit_codes::SUCCESS as u8))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_codes::SUCCESS, 0);
        assert_eq!(exit_codes::FAILURE, 1);
        assert_eq!(exit_codes::CRASH, 3);
    }

    #[test]
    fn test_success_to_exit_code() {
        assert_eq!(
            success_to_exit_code(true),
            ExitCode::from(exit_codes::SUCCESS as u8)
        );
        assert_eq!(
            success_to_exit_code(false),
            ExitCode::from(exit_codes::FAILURE as u8)
        );
    }

    #[test]
    fn test_cli_parse_register() {
        let cli =
            Cli::try_parse_from(["campus", "register", "ana", "--gender", "feminino", "--age", "28"])
                .unwrap();
        match cli.command {
            Commands::Register {
                handle, gender, age, ..
            } => {
                assert_eq!(handle, "ana");
                assert_eq!(gender, "feminino");
                assert_eq!(age, 28);
            }
            _ => panic!("Expected Register command"),
        }
    }

    #[test]
    fn test_cli_parse_register_negative_age() {
        // Rejected later by validation, not by the parser
        let cli =
            Cli::try_parse_from(["campus", "register", "ana", "-g", "feminino", "-a", "-3"])
                .unwrap();
        assert!(matches!(cli.command, Commands::Register { age: -3, .. }));
    }

    #[test]
    fn test_cli_parse_courses_level() {
        let cli = Cli::try_parse_from(["campus", "courses", "--level", "2"]).unwrap();
        match cli.command {
            Commands::Courses { level, .. } => assert_eq!(level, Some(Level::Intermediate)),
            _ => panic!("Expected Courses command"),
        }

        let cli = Cli::try_parse_from(["campus", "courses", "-l", "avançado", "--json"]).unwrap();
        match cli.command {
            Commands::Courses { level, json, .. } => {
                assert_eq!(level, Some(Level::Advanced));
                assert!(json);
            }
            _ => panic!("Expected Courses command"),
        }

        assert!(Cli::try_parse_from(["campus", "courses", "--level", "9"]).is_err());
    }

    #[test]
    fn test_cli_parse_view() {
        let cli = Cli::try_parse_from([
            "campus",
            "view",
            "Rust Básico",
            "--user",
            "ana",
            "--duration",
            "12.5",
        ])
        .unwrap();
        match cli.command {
            Commands::View {
                course,
                user,
                duration,
                ..
            } => {
                assert_eq!(course, "Rust Básico");
                assert_eq!(user, "ana");
                assert_eq!(duration, Some(12.5));
            }
            _ => panic!("Expected View command"),
        }
    }

    #[test]
    fn test_cli_parse_rate() {
        let cli = Cli::try_parse_from(["campus", "rate", "Rust", "5", "-u", "ana"]).unwrap();
        match cli.command {
            Commands::Rate {
                course,
                score,
                user,
                ..
            } => {
                assert_eq!(course, "Rust");
                assert_eq!(score, 5);
                assert_eq!(user, "ana");
            }
            _ => panic!("Expected Rate command"),
        }
    }

    #[test]
    fn test_cli_parse_profile() {
        let cli =
            Cli::try_parse_from(["campus", "profile", "--user", "ana", "age", "41", "--json"])
                .unwrap();
        match cli.command {
            Commands::Profile {
                user, action, json, ..
            } => {
                assert_eq!(user, "ana");
                assert!(json);
                assert!(matches!(action, ProfileAction::Age { age: 41 }));
            }
            _ => panic!("Expected Profile command"),
        }

        let cli =
            Cli::try_parse_from(["campus", "profile", "-u", "ana", "delete", "--yes"]).unwrap();
        match cli.command {
            Commands::Profile { action, .. } => {
                assert!(matches!(action, ProfileAction::Delete { yes: true }));
            }
            _ => panic!("Expected Profile command"),
        }
    }

    #[test]
    fn test_cli_parse_admin_add() {
        let cli = Cli::try_parse_from([
            "campus",
            "admin",
            "add",
            "Rust",
            "--level",
            "iniciante",
            "--content",
            "ownership",
        ])
        .unwrap();
        match cli.command {
            Commands::Admin {
                admin,
                action: AdminAction::Add {
                    name,
                    level,
                    content,
                },
                ..
            } => {
                assert_eq!(admin, None);
                assert_eq!(name, "Rust");
                assert_eq!(level, Level::Beginner);
                assert_eq!(content.read().unwrap().as_deref(), Some("ownership"));
            }
            _ => panic!("Expected Admin add command"),
        }
    }

    #[test]
    fn test_cli_parse_admin_content_conflict() {
        let result = Cli::try_parse_from([
            "campus",
            "admin",
            "add",
            "Rust",
            "-l",
            "1",
            "--content",
            "x",
            "--content-file",
            "x.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_admin_edit() {
        let cli = Cli::try_parse_from([
            "campus",
            "admin",
            "--admin",
            "root",
            "edit",
            "Rust",
            "--new-name",
            "Rust 2024",
            "--level",
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Admin {
                admin,
                action:
                    AdminAction::Edit {
                        name,
                        new_name,
                        level,
                        content,
                    },
                ..
            } => {
                assert_eq!(admin.as_deref(), Some("root"));
                assert_eq!(name, "Rust");
                assert_eq!(new_name.as_deref(), Some("Rust 2024"));
                assert_eq!(level, Some(Level::Advanced));
                assert_eq!(content.read().unwrap(), None);
            }
            _ => panic!("Expected Admin edit command"),
        }
    }

    #[test]
    fn test_cli_parse_admin_stats() {
        let cli =
            Cli::try_parse_from(["campus", "admin", "stats", "ratings", "--chart", "--json"])
                .unwrap();
        match cli.command {
            Commands::Admin {
                action: AdminAction::Stats { topic, chart },
                json,
                ..
            } => {
                assert!(matches!(topic, StatsTopicArg::Ratings));
                assert!(chart);
                assert!(json);
            }
            _ => panic!("Expected Admin stats command"),
        }
    }

    #[test]
    fn test_cli_parse_hash_password() {
        let cli = Cli::try_parse_from(["campus", "hash-password"]).unwrap();
        assert!(matches!(cli.command, Commands::HashPassword));
    }

    #[test]
    fn test_content_file_read() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("content.txt");
        std::fs::write(&path, "from file").unwrap();

        let args = ContentArgs {
            content: None,
            content_file: Some(path),
        };
        assert_eq!(args.read().unwrap().as_deref(), Some("from file"));

        let missing = ContentArgs {
            content: None,
            content_file: Some(temp.path().join("missing.txt")),
        };
        assert!(missing.read().is_err());
    }
}
