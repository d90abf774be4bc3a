//! `keychain get`: print the password stored for a domain.

use crate::cli::{load_context, prompt_password, storage, Cli};
use crate::errors::Result;

/// Execute the `get` command.
pub fn execute(cli: &Cli, domain: &str) -> Result<()> {
    let (dir, settings) = load_context(cli)?;

    // Open the keychain (requires the master password).
    let master = prompt_password()?;
    let keychain = storage::open(&master, &settings, &dir)?;

    // Decrypt and print the password to stdout.
    let password = zeroize::Zeroizing::new(keychain.get(domain)?);
    println!("{}", password.as_str());

    Ok(())
}
