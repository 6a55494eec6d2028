#[macro_use]
extern crate tracing;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use roost_core::error::RoostResult;
use roost_core::package_full;
use tracing_subscriber::EnvFilter;

mod cli;
mod pages;

#[derive(Parser)]
#[clap(name = "roost", version, about = "The Roost rental front desk")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// starts main server
    Server,
    /// generate or refresh the session cookie key
    GenKeys {
        /// key directory to use
        key_directory: PathBuf,
    },
}

fn main() -> RoostResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    use tokio::runtime::Builder;
    let runtime = Builder::new_multi_thread()
        .worker_threads(8)
        .thread_name_fn(|| {
            use std::sync::atomic::{AtomicUsize, Ordering};
            static ATOMIC_ID: AtomicUsize = AtomicUsize::new(0);
            let id = ATOMIC_ID.fetch_add(1, Ordering::SeqCst);
            format!("roost-{}", id)
        })
        .enable_all()
        .build()
        .expect("could not build runtime");

    let args = Cli::parse();
    match args.command {
        Command::Server => {
            info!("Starting {}", package_full());
            runtime.block_on(async move {
                tokio::spawn(async move { crate::cli::server::server_start().await }).await
            })??;
            runtime.shutdown_timeout(std::time::Duration::from_secs(10));
            Ok(())
        }
        Command::GenKeys { key_directory } => {
            if !key_directory.exists() {
                info!("Creating keys directory...");
                std::fs::create_dir_all(&key_directory)?;
            }
            let rng = ring::rand::SystemRandom::new();
            let sessionkeypath = key_directory.join("session.key");
            if !sessionkeypath.exists() {
                info!("Generating session key");
                let random_key: [u8; 64] = ring::rand::generate(&rng)?.expose();
                std::fs::write(&sessionkeypath, random_key.as_ref())?;
                warn!("Key generated, you are ready to roll.");
                error!("MAKE BACKUPS OF THE {} DIRECTORY", key_directory.display());
            } else {
                info!("Session key already present, leaving it alone");
            }
            Ok(())
        }
    }
}
