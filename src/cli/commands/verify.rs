//! `keychain verify`: run every check without writing anything.

use crate::cli::output;
use crate::cli::{load_context, prompt_password, storage, Cli};
use crate::errors::Result;

/// Execute the `verify` command.
///
/// Opening already covers the checksum, the integrity tag, the sealed
/// reference and decryption of every entry; any failure propagates.
pub fn execute(cli: &Cli) -> Result<()> {
    let (dir, settings) = load_context(cli)?;

    let master = prompt_password()?;
    let keychain = storage::open(&master, &settings, &dir)?;
    keychain.verify_integrity()?;

    output::success(&format!(
        "Keychain verified: checksum, integrity tag and {} entries OK",
        keychain.len()?
    ));

    Ok(())
}
