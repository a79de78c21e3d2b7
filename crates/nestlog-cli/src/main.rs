use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use nestlog_core::{DateOrder, NestlogConfig};
use tracing_subscriber::EnvFilter;

mod commands;
mod display;

#[derive(Parser)]
#[command(name = "nestlog", version)]
#[command(about = "Extract baby-care activity records from chat transcripts")]
struct Cli {
    /// Extra config file, layered above ./nestlog.toml
    #[arg(long, global = true, env = "NESTLOG_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for per-subject record files (overrides store.data_dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import an exported chat transcript
    Import {
        /// Transcript file (.txt export)
        file: PathBuf,
        #[arg(short, long)]
        subject: String,
        /// Reading of ambiguous dates such as 3/4/25 (overrides parse.date_order)
        #[arg(long, value_enum)]
        date_order: Option<DateOrderArg>,
        /// Extract and report without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Record one activity from free text, e.g. `nestlog add -s baby 4oz bottle at 2pm`
    Add {
        #[arg(short, long)]
        subject: String,
        #[arg(long)]
        sender: Option<String>,
        /// When it happened: YYYY-MM-DD HH:MM (default: time in the text, else now)
        #[arg(long)]
        at: Option<String>,
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Show how a message would be classified, without saving
    Classify {
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// List stored records for a subject
    List {
        #[arg(short, long)]
        subject: String,
        /// Earliest time, inclusive (YYYY-MM-DD or YYYY-MM-DD HH:MM)
        #[arg(long)]
        from: Option<String>,
        /// Latest time, inclusive (YYYY-MM-DD or YYYY-MM-DD HH:MM)
        #[arg(long)]
        to: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Export a subject's records to Parquet
    Export {
        #[arg(short, long)]
        subject: String,
        #[arg(short, long)]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DateOrderArg {
    DayFirst,
    MonthFirst,
}

impl From<DateOrderArg> for DateOrder {
    fn from(arg: DateOrderArg) -> Self {
        match arg {
            DateOrderArg::DayFirst => DateOrder::DayFirst,
            DateOrderArg::MonthFirst => DateOrder::MonthFirst,
        }
    }
}

fn main() {
    if let Err(error) = run() {
        eprintln!("nestlog: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        NestlogConfig::load_with(cli.config.as_deref()).context("loading configuration")?;
    if let Some(dir) = cli.data_dir {
        config.store.data_dir = dir;
    }
    init_tracing(&config.log.filter)?;
    tracing::debug!("nestlog v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Import {
            file,
            subject,
            date_order,
            dry_run,
        } => {
            if let Some(order) = date_order {
                config.parse.date_order = order.into();
            }
            commands::import(&config, &file, &subject, dry_run)
        }
        Commands::Add {
            subject,
            sender,
            at,
            text,
        } => commands::add(
            &config,
            &subject,
            &text.join(" "),
            sender.as_deref(),
            at.as_deref(),
        ),
        Commands::Classify { text } => {
            commands::classify(&config, &text.join(" "));
            Ok(())
        }
        Commands::List {
            subject,
            from,
            to,
            category,
        } => commands::list(
            &config,
            &subject,
            from.as_deref(),
            to.as_deref(),
            category.as_deref(),
        ),
        Commands::Export { subject, out } => commands::export(&config, &subject, &out),
    }
}

/// Logs go to stderr. `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}
