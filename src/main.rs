use std::io::Read;
use std::process::ExitCode;

use clap::Parser;
use clipshare_lib::auth::hash_password;
use clipshare_lib::config::{Cli, Command};

fn run_hash_password() -> std::io::Result<()> {
    let mut password = String::new();
    std::io::stdin().read_to_string(&mut password)?;
    let password = password.trim_end_matches(['\r', '\n']);

    println!("{}", hash_password(password));
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Some(Command::HashPassword) => run_hash_password().map_err(Into::into),
        None => clipshare_lib::run(cli).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "fatal");
            ExitCode::FAILURE
        }
    }
}
