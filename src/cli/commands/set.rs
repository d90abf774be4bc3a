//! `keychain set`: store a password for a domain.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{load_context, prompt_password, storage, Cli};
use crate::errors::{KeychainError, Result};

/// Execute the `set` command.
pub fn execute(cli: &Cli, domain: &str, password: Option<&str>) -> Result<()> {
    let (dir, settings) = load_context(cli)?;

    // Determine the password to store from one of three sources.
    let secret = if let Some(v) = password {
        // Source 1: Inline value on the command line.
        output::warning("Password provided on command line: it may appear in shell history.");
        Zeroizing::new(v.to_string())
    } else if !io::stdin().is_terminal() {
        // Source 2: Piped input (stdin is not a terminal).
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        // Drop only the line terminator; other trailing bytes belong to the password.
        let line = buf
            .strip_suffix("\r\n")
            .or_else(|| buf.strip_suffix('\n'))
            .unwrap_or(buf.as_str());
        Zeroizing::new(line.to_string())
    } else {
        // Source 3: Interactive secure prompt (default).
        Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt(format!("Password for {domain}"))
                .interact()
                .map_err(|e| KeychainError::CommandFailed(format!("input prompt: {e}")))?,
        )
    };

    // Open the keychain, store the password and save.
    let master = prompt_password()?;
    let mut keychain = storage::open(&master, &settings, &dir)?;

    let existed = keychain.contains(domain)?;
    keychain.set(domain, &secret)?;
    storage::save(&keychain, &settings, &dir)?;

    let verb = if existed { "updated" } else { "added" };
    output::success(&format!(
        "Password for '{domain}' {verb} ({} total)",
        keychain.len()?
    ));

    Ok(())
}
