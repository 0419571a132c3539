mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, LogLevel};

fn initialize_tracing(log_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    initialize_tracing(cli.log_level);

    let base_dir = cli.base_dir;
    let mods_dir = cli.mods_dir;
    let filesystem = || commands::filesystem(base_dir.clone(), mods_dir.clone());

    let ok = match cli.command {
        Commands::List { save_type } => commands::list(&filesystem()?, save_type)?,
        Commands::Show { id, save_type } => commands::show(&filesystem()?, &id, save_type)?,
        Commands::Download {
            ids,
            save_type,
            all,
            jobs,
            timeout,
        } => commands::download(&filesystem()?, ids, save_type, all, jobs, timeout).await?,
        Commands::Export {
            id,
            save_type,
            output,
        } => commands::export(&filesystem()?, &id, save_type, output)?,
        Commands::Import { pak } => commands::import(&filesystem()?, &pak)?,
        Commands::Verify {
            pak,
            id,
            save_type,
            legacy,
        } => match pak {
            Some(path) => commands::verify_pak(&path)?,
            None => commands::verify_installed(&filesystem()?, id, save_type, legacy)?,
        },
        Commands::Prefs {
            mod_location,
            tts_location,
            validate,
            reset,
        } => commands::prefs(mod_location, tts_location, validate, reset)?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
