use std::{
    io::{self, Write},
    path::PathBuf,
};

use asset_registry::{AssetRegistry, Invocation, LedgerError, MemoryLedger, Response};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "asset-registry", version, about = "Ledger-backed asset registry")]
struct Cli {
    /// Ledger snapshot file; created on first write
    #[arg(long, env = "ASSET_REGISTRY_STATE", default_value = "asset-ledger.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dispatch one registry function, e.g. `invoke queryAsset Asset0`
    Invoke {
        function: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Print ledger height and state root
    Root,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "asset_registry=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "ledger unavailable");
            eprintln!("error: {err}");
            2
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32, LedgerError> {
    let mut ledger = MemoryLedger::load(&cli.state)?;
    let registry = AssetRegistry::new();
    if ledger.height() == 0 {
        // fresh ledger: run the instantiation hook once
        registry.init();
        tracing::debug!(path = %cli.state.display(), "registry instantiated");
    }

    match cli.command {
        Command::Invoke { function, args } => {
            let height = ledger.height();
            match registry.invoke(&mut ledger, Invocation::new(function, args)) {
                Response::Success(payload) => {
                    if ledger.height() != height {
                        ledger.store(&cli.state)?;
                        tracing::debug!(path = %cli.state.display(), height = ledger.height(), "snapshot written");
                    }
                    let mut stdout = io::stdout().lock();
                    if !payload.is_empty() {
                        stdout.write_all(&payload)?;
                        stdout.write_all(b"\n")?;
                    }
                    stdout.flush()?;
                    Ok(0)
                }
                Response::Error(message) => {
                    eprintln!("error: {message}");
                    Ok(1)
                }
            }
        }
        Command::Root => {
            println!("height {}", ledger.height());
            println!("root   {}", hex::encode(ledger.state_root()));
            Ok(0)
        }
    }
}
