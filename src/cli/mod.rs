//! CLI module: Clap argument parser, output helpers, file storage and
//! command implementations.

pub mod commands;
pub mod output;
pub mod storage;

use std::path::PathBuf;

use clap::Parser;

use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{KeychainError, Result};

/// Environment variable holding the master password (scripts and CI).
pub const PASSWORD_ENV: &str = "KEYCHAIN_PASSWORD";

/// Keychain CLI: encrypted password storage with hidden domain names.
#[derive(Parser)]
#[command(
    name = "keychain",
    about = "Encrypted, tamper-evident password keychain",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project directory holding .keychain.toml and the keychain files
    #[arg(long, default_value = ".", global = true)]
    pub dir: String,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new, empty keychain
    Init,

    /// Store a password for a domain (add or replace)
    Set {
        /// Domain name (e.g. example.com)
        domain: String,
        /// Password to store (omit for interactive prompt)
        password: Option<String>,
    },

    /// Print the password stored for a domain
    Get {
        /// Domain name
        domain: String,
    },

    /// Remove the password stored for a domain
    Remove {
        /// Domain name
        domain: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Show keychain file details
    Info,

    /// Run every integrity check without changing anything
    Verify,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Get the master password, trying in order:
/// 1. `KEYCHAIN_PASSWORD` env var (CI/CD)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter master password")
        .interact()
        .map_err(|e| KeychainError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new master password with confirmation (used by `init`).
///
/// Also respects `KEYCHAIN_PASSWORD` for scripted usage. Any non-empty
/// password is accepted; the keychain itself rejects an empty one.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Choose master password")
        .with_confirmation(
            "Confirm master password",
            "Passwords do not match, try again",
        )
        .interact()
        .map_err(|e| KeychainError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

fn password_from_env() -> Option<Zeroizing<String>> {
    match std::env::var(PASSWORD_ENV) {
        Ok(pw) if !pw.is_empty() => Some(Zeroizing::new(pw)),
        _ => None,
    }
}

/// Resolve the project directory from the CLI arguments.
pub fn project_dir(cli: &Cli) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(&cli.dir))
}

/// Resolve the project directory and load its settings.
pub fn load_context(cli: &Cli) -> Result<(PathBuf, Settings)> {
    let dir = project_dir(cli)?;
    let settings = Settings::load(&dir)?;
    Ok((dir, settings))
}
