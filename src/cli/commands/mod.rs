//! One module per `keychain` subcommand.

pub mod get;
pub mod info;
pub mod init;
pub mod remove;
pub mod set;
pub mod verify;
