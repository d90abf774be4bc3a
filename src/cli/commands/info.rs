//! `keychain info`: show keychain file details.

use crate::cli::output;
use crate::cli::{load_context, prompt_password, storage, Cli};
use crate::errors::Result;

/// Execute the `info` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (dir, settings) = load_context(cli)?;

    let master = prompt_password()?;
    let keychain = storage::open(&master, &settings, &dir)?;
    let seal = storage::read_seal(&settings.seal_path(&dir))?;

    let tag = keychain.integrity_tag()?.to_hex();
    let checksum = match &seal {
        Some(seal) => seal.checksum.clone(),
        None => "(no seal file)".to_string(),
    };

    output::print_properties(&[
        ("Keychain file", settings.keychain_path(&dir).display().to_string()),
        ("Seal file", settings.seal_path(&dir).display().to_string()),
        ("Entries", keychain.len()?.to_string()),
        ("Stored records", keychain.stored_len()?.to_string()),
        ("Checksum", checksum),
        ("Integrity tag", format!("{}…", &tag[..16])),
        ("Salt", hex::encode(keychain.salt()?)),
        ("PBKDF2 iterations", settings.pbkdf2_iterations.to_string()),
        ("Decoy bucket", settings.decoy_bucket.to_string()),
    ]);

    Ok(())
}
