use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use recordstore::config::{self, Config};
use recordstore::logger::{error, init};
use recordstore::{Inspector, LoadOptions, Loader, Store};

#[derive(Parser, Debug)]
#[command(name = "recordstore", version, about = "Load a delimited file into a SQLite records table, or inspect it")]
struct Cli {
    /// YAML config file (defaults to config.yaml in the app config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the table contents with the rows of an input file
    Load {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        store: Option<PathBuf>,
        #[arg(long)]
        delimiter: Option<char>,
        #[arg(long)]
        quote: Option<char>,
        /// Treat the first line as data
        #[arg(long)]
        no_header: bool,
    },
    /// Print the first records of the table
    Inspect {
        #[arg(long)]
        store: Option<PathBuf>,
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    if let Ok(log_path) = config::log_path() {
        let _ = init(log_path);
    }

    let cli = Cli::parse();
    let result = run(cli);
    if let Err(err) = &result {
        error(&format!("fatal error: {:?}", err));
    }
    result
}

fn run(cli: Cli) -> Result<()> {
    let cfg = apply_flags(&cli.command, Config::load(cli.config.as_deref())?);

    match cli.command {
        Command::Load { .. } => {
            let loader = Loader::new(LoadOptions::try_from(&cfg.loader)?)?;
            let mut store = Store::open(&cfg.store.path)?;
            let report = loader.load(&cfg.loader.input, &mut store)?;
            store.close()?;

            println!(
                "Loaded {} records into {} ({} rows rejected)",
                report.inserted,
                cfg.store.path.display(),
                report.rejected
            );
            for row in &report.rejected_sample {
                println!("  rejected line {}: {} fields", row.line, row.field_count);
            }
        }
        Command::Inspect { .. } => {
            let store = Store::open_existing(&cfg.store.path)?;
            let mut out = std::io::stdout().lock();
            Inspector::new(cfg.inspector.limit).print(&store, &mut out)?;
            store.close()?;
        }
    }
    Ok(())
}

/// Flags given on the command line win over the loaded config.
fn apply_flags(command: &Command, mut cfg: Config) -> Config {
    match command {
        Command::Load { input, store, delimiter, quote, no_header } => {
            if let Some(p) = store {
                cfg.store.path = p.clone();
            }
            if let Some(p) = input {
                cfg.loader.input = p.clone();
            }
            if let Some(c) = delimiter {
                cfg.loader.delimiter = *c;
            }
            if let Some(c) = quote {
                cfg.loader.quote = *c;
            }
            if *no_header {
                cfg.loader.has_header = false;
            }
        }
        Command::Inspect { store, limit } => {
            if let Some(p) = store {
                cfg.store.path = p.clone();
            }
            if let Some(n) = limit {
                cfg.inspector.limit = *n;
            }
        }
    }
    cfg
}
