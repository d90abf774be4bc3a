//! `keychain init`: create a new, empty keychain.

use crate::cli::output;
use crate::cli::{load_context, prompt_new_password, storage, Cli};
use crate::errors::{KeychainError, Result};
use crate::keychain::Keychain;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (dir, settings) = load_context(cli)?;
    let keychain_path = settings.keychain_path(&dir);

    // 1. Refuse to overwrite an existing keychain.
    if keychain_path.exists() {
        output::tip("Use `keychain set` to add passwords to the existing keychain.");
        return Err(KeychainError::AlreadyInitialized);
    }

    // 2. Prompt for a new master password (with confirmation).
    let password = prompt_new_password()?;

    // 3. Derive keys, create an empty store and write both files.
    let mut keychain = Keychain::with_config(settings.keychain_config());
    keychain.init(&password)?;
    storage::save(&keychain, &settings, &dir)?;

    output::success(&format!("Keychain created at {}", keychain_path.display()));
    if settings.decoy_bucket > 0 {
        output::info(&format!(
            "Entry count is padded to multiples of {} with decoys.",
            settings.decoy_bucket
        ));
    }

    // 4. Show helpful tips.
    output::tip("Run `keychain set <DOMAIN>` to store a password.");
    output::tip("Keep the seal file next to the keychain: it guards against rollback.");

    Ok(())
}
