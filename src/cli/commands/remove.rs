//! `keychain remove`: delete the password stored for a domain.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{load_context, prompt_password, storage, Cli};
use crate::errors::{KeychainError, Result};

/// Execute the `remove` command.
pub fn execute(cli: &Cli, domain: &str, force: bool) -> Result<()> {
    let (dir, settings) = load_context(cli)?;

    // Unless --force is set, ask for confirmation before removing.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove the password for '{domain}'?"))
            .default(false)
            .interact()
            .map_err(|e| KeychainError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    // Open the keychain (requires the master password).
    let master = prompt_password()?;
    let mut keychain = storage::open(&master, &settings, &dir)?;

    // Nothing changed, so nothing is written.
    if !keychain.remove(domain)? {
        return Err(KeychainError::NotFound);
    }
    storage::save(&keychain, &settings, &dir)?;

    output::success(&format!("Removed the password for '{domain}'"));

    Ok(())
}
