//! Users and the user directory.
//!
//! Handles are unique and compared case-sensitively, so `Ana` and `ana`
//! are two different accounts.

use serde::{Deserialize, Serialize};

use crate::audit::AuditLog;
use crate::auth::{hash_password, is_legacy_hash, verify_password};
use crate::core::Gender;
use crate::error::{CampusError, Result};
use crate::storage::{RecordStore, Table};

/// Minimum handle length, in characters.
pub const MIN_HANDLE_CHARS: usize = 3;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Account kind written for self-registered users.
pub const USER_KIND: &str = "usuario";

fn default_kind() -> String {
    USER_KIND.to_string()
}

/// A registered user, as stored in the `usuario` table.
///
/// Gender is kept as the raw stored string: older documents may carry
/// values outside [`Gender`], and those must survive a load/save cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "usuario")]
    pub handle: String,
    #[serde(rename = "senha")]
    pub password_hash: String,
    #[serde(rename = "tipo", default = "default_kind")]
    pub kind: String,
    #[serde(rename = "genero", default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(rename = "idade", default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
}

impl User {
    /// The stored gender, if it is exactly one of the recognized values.
    pub fn recognized_gender(&self) -> Option<Gender> {
        self.gender.as_deref().and_then(Gender::from_stored)
    }
}

fn validate_handle(handle: &str) -> Result<()> {
    if handle.chars().count() < MIN_HANDLE_CHARS || handle.chars().any(char::is_whitespace) {
        return Err(CampusError::validation(format!(
            "handle must have at least {} characters and no spaces",
            MIN_HANDLE_CHARS
        )));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(CampusError::validation(format!(
            "password must have at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }
    Ok(())
}

fn validate_gender(gender: &str) -> Result<Gender> {
    Gender::parse(gender).ok_or_else(|| {
        CampusError::validation(format!(
            "unknown gender '{}' (expected masculino or feminino)",
            gender.trim()
        ))
    })
}

fn validate_age(age: i64) -> Result<u32> {
    match u32::try_from(age) {
        Ok(age) if age > 0 => Ok(age),
        _ => Err(CampusError::validation("age must be a positive integer")),
    }
}

/// Registration, authentication and profile maintenance over the
/// `usuario` table.
pub struct UserDirectory<'a, S: RecordStore> {
    store: &'a S,
    audit: &'a dyn AuditLog,
}

impl<'a, S: RecordStore> UserDirectory<'a, S> {
    pub fn new(store: &'a S, audit: &'a dyn AuditLog) -> Self {
        Self { store, audit }
    }

    /// All users, in stored order.
    pub fn users(&self) -> Vec<User> {
        self.store.load(Table::Users)
    }

    /// Look up a user by exact handle.
    pub fn find(&self, handle: &str) -> Option<User> {
        self.users().into_iter().find(|u| u.handle == handle)
    }

    /// Register a new user.
    pub fn register(&self, handle: &str, password: &str, gender: &str, age: i64) -> Result<User> {
        let handle = handle.trim();
        validate_handle(handle)?;

        let mut users = self.users();
        if self.handle_taken(handle) {
            return Err(CampusError::duplicate(format!(
                "user '{}' is already registered",
                handle
            )));
        }

        validate_password(password)?;
        let gender = validate_gender(gender)?;
        let age = validate_age(age)?;

        let user = User {
            handle: handle.to_string(),
            password_hash: hash_password(password)?,
            kind: default_kind(),
            gender: Some(gender.as_str().to_string()),
            age: Some(age),
        };

        users.push(user.clone());
        self.store.save(Table::Users, &users)?;
        self.audit.info(&format!("User '{}' registered.", user.handle));

        Ok(user)
    }

    /// Check credentials and return the matching user.
    ///
    /// Unknown handles and wrong passwords produce the same error.
    pub fn authenticate(&self, handle: &str, password: &str) -> Result<User> {
        match self.find(handle.trim()) {
            Some(user) if verify_password(password, &user.password_hash) => {
                self.audit
                    .info(&format!("User '{}' authenticated.", user.handle));
                Ok(self.upgrade_legacy_hash(user, password))
            }
            _ => {
                self.audit.warning("Invalid user login attempt.");
                Err(CampusError::authentication("invalid credentials"))
            }
        }
    }

    /// Change a user's handle.
    ///
    /// Access records and ratings keep the old handle; they are historical.
    pub fn rename(&self, handle: &str, new_handle: &str) -> Result<User> {
        let new_handle = new_handle.trim();
        validate_handle(new_handle)?;

        if new_handle != handle && self.handle_taken(new_handle) {
            return Err(CampusError::duplicate(format!(
                "user '{}' is already registered",
                new_handle
            )));
        }

        let new_handle = new_handle.to_string();
        self.update(handle, |user| {
            user.handle = new_handle;
            Ok(())
        })
    }

    /// Replace a user's password.
    pub fn change_password(&self, handle: &str, new_password: &str) -> Result<User> {
        validate_password(new_password)?;
        let password_hash = hash_password(new_password)?;
        self.update(handle, |user| {
            user.password_hash = password_hash;
            Ok(())
        })
    }

    /// Replace a user's age.
    pub fn change_age(&self, handle: &str, age: i64) -> Result<User> {
        let age = validate_age(age)?;
        self.update(handle, |user| {
            user.age = Some(age);
            Ok(())
        })
    }

    /// Replace a user's gender.
    pub fn change_gender(&self, handle: &str, gender: &str) -> Result<User> {
        let gender = validate_gender(gender)?;
        self.update(handle, |user| {
            user.gender = Some(gender.as_str().to_string());
            Ok(())
        })
    }

    /// Delete an account after backing up the users table.
    ///
    /// Returns the backup location. If the backup cannot be taken, nothing
    /// is deleted.
    pub fn delete(&self, handle: &str) -> Result<String> {
        let mut users = self.users();
        let before = users.len();
        users.retain(|u| u.handle != handle);
        if users.len() == before {
            return Err(CampusError::not_found(format!("user '{}'", handle)));
        }

        let backup = match self.store.backup(Table::Users) {
            Ok(location) => location,
            Err(e) => {
                self.audit
                    .error(&format!("Backup failed before deleting '{}': {}", handle, e));
                return Err(e);
            }
        };
        self.audit.info(&format!("Backup created: {}", backup));

        self.store.save(Table::Users, &users)?;
        self.audit.info(&format!("User '{}' deleted.", handle));

        Ok(backup)
    }

    /// Whether a handle is used, counting rows kept on disk that do not
    /// load as a [`User`].
    fn handle_taken(&self, handle: &str) -> bool {
        let (users, skipped) = self.store.load_rows::<User>(Table::Users);
        users.iter().any(|u| u.handle == handle)
            || skipped
                .iter()
                .any(|(row, _)| row.get("usuario").and_then(|v| v.as_str()) == Some(handle))
    }

    /// Replace a verified bcrypt hash with an argon2 one. If that fails the
    /// old hash stays and the login still succeeds.
    fn upgrade_legacy_hash(&self, user: User, password: &str) -> User {
        if !is_legacy_hash(&user.password_hash) {
            return user;
        }

        let upgraded = hash_password(password).and_then(|hash| {
            self.update(&user.handle, move |u| {
                u.password_hash = hash;
                Ok(())
            })
        });

        match upgraded {
            Ok(updated) => {
                tracing::debug!(user = %updated.handle, "legacy password hash upgraded");
                updated
            }
            Err(e) => {
                tracing::warn!(user = %user.handle, error = %e, "could not upgrade legacy password hash");
                user
            }
        }
    }

    fn update(&self, handle: &str, apply: impl FnOnce(&mut User) -> Result<()>) -> Result<User> {
        let mut users = self.users();
        let user = users
            .iter_mut()
            .find(|u| u.handle == handle)
            .ok_or_else(|| CampusError::not_found(format!("user '{}'", handle)))?;

        apply(user)?;
        let updated = user.clone();

        self.store.save(Table::Users, &users)?;
        self.audit
            .info(&format!("User '{}' updated profile.", updated.handle));

        Ok(updated)
    }
}
