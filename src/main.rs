use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use chunked_file_storage::cli::commands::handle_cli;
use chunked_file_storage::cli::{Cli, Commands, ShellLine};
use chunked_file_storage::config::{Backend, Config};
use chunked_file_storage::db::{DocumentStore, FsStore, MemoryStore, RedisStore};
use chunked_file_storage::services::FileService;

fn open_store(cfg: &Config) -> Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match cfg.backend {
        Backend::Fs => {
            info!("Using filesystem store at {}", cfg.data_dir.display());
            Arc::new(FsStore::new(&cfg.data_dir))
        }
        Backend::Redis => {
            info!("Using redis store at {}", cfg.redis_url);
            Arc::new(RedisStore::new(&cfg.redis_url).context("open redis client")?)
        }
        Backend::Memory => {
            info!("Using in-memory store; nothing outlives this process");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}

async fn run_shell(service: &FileService, cfg: &Config) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("Welcome to the cfs interactive shell!");
    println!("Type 'help' for available commands, 'exit' to quit.");

    loop {
        match rl.readline("cfs> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                let args: Vec<&str> = line.split_whitespace().collect();
                match args.first().copied() {
                    None => continue,
                    Some("exit") | Some("quit") => break,
                    Some(_) => {}
                }

                let parsed = match ShellLine::try_parse_from(args.iter().copied()) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };
                if parsed.command == Commands::Shell {
                    println!("Already in the shell.");
                    continue;
                }
                if let Err(e) = handle_cli(parsed.command, service, cfg).await {
                    println!("Error: {:#}", e);
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = Config::from_env().context("load configuration")?;
    let store = open_store(&cfg)?;
    let service = FileService::from_config(store, &cfg);

    match cli.command {
        Commands::Shell => run_shell(&service, &cfg).await,
        cmd => handle_cli(cmd, &service, &cfg).await,
    }
}
