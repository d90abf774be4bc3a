use clap::Parser;
use keychain::cli::{Cli, Commands};

fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => keychain::cli::commands::init::execute(&cli),
        Commands::Set {
            ref domain,
            ref password,
        } => keychain::cli::commands::set::execute(&cli, domain, password.as_deref()),
        Commands::Get { ref domain } => keychain::cli::commands::get::execute(&cli, domain),
        Commands::Remove { ref domain, force } => {
            keychain::cli::commands::remove::execute(&cli, domain, force)
        }
        Commands::Info => keychain::cli::commands::info::execute(&cli),
        Commands::Verify => keychain::cli::commands::verify::execute(&cli),
    };

    if let Err(e) = result {
        keychain::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Library diagnostics go to stderr, filtered by `KEYCHAIN_LOG`
/// (e.g. `KEYCHAIN_LOG=keychain=debug`).
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("KEYCHAIN_LOG")
        .unwrap_or_else(|_| EnvFilter::new("keychain=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
