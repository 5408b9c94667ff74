//! Password input for sealed backups

use crate::crypto::Password;
use crate::error::{BackupError, BackupResult};

/// Environment variable consulted before prompting
pub const PASSWORD_ENV: &str = "MYBRAIN_BACKUP_PASSWORD";

/// Read the backup password from the environment, or prompt for it.
///
/// With `confirm` set, an interactive prompt asks twice.
pub fn read_password(confirm: bool) -> BackupResult<Password> {
    if let Ok(value) = std::env::var(PASSWORD_ENV) {
        return non_empty(Password::from(value));
    }

    let first = prompt("Backup password: ")?;
    if confirm {
        let second = prompt("Confirm password: ")?;
        if first.as_str() != second.as_str() {
            return Err(BackupError::Precondition(
                "Passwords do not match".to_string(),
            ));
        }
    }
    non_empty(first)
}

fn prompt(text: &str) -> BackupResult<Password> {
    rpassword::prompt_password(text)
        .map(Password::from)
        .map_err(|e| BackupError::Precondition(format!("Failed to read password: {}", e)))
}

fn non_empty(password: Password) -> BackupResult<Password> {
    if password.is_empty() {
        return Err(BackupError::Precondition(
            "Password must not be empty".to_string(),
        ));
    }
    Ok(password)
}
