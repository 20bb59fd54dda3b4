// ABOUTME: Masked terminal prompt for the database password
// ABOUTME: Accepts blank input and never retries

use anyhow::{Context, Result};
use dialoguer::Password;

pub fn password_prompt_text(user: &str) -> String {
    format!("Enter password for user {}", user)
}

/// Read the password for `user` with echo disabled
///
/// A blank entry is returned as an empty string.
pub fn prompt_password(user: &str) -> Result<String> {
    Password::new()
        .with_prompt(password_prompt_text(user))
        .allow_empty_password(true)
        .interact()
        .context("Failed to read password from terminal")
}
