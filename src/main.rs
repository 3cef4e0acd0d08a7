#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use os_tips::config::AppConfig;
use os_tips::core::Medal;
use os_tips::storage::SnapshotFormat;
use os_tips::{TipsResult, athletes_cmd, backup_cmd, result_cmd, scoreboard_cmd, tip_cmd};

#[derive(Parser, Debug)]
#[command(name = "os-tips")]
#[command(about = "Medal tipping pool with durable, exportable state", long_about = None)]
struct Cli {
    /// Enable verbose logging (or set OS_TIPS_LOG)
    #[arg(long)]
    verbose: bool,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List sports, or athletes in one sport
    Athletes {
        #[arg(long)]
        sport: Option<String>,
    },

    /// Manage a player's tips
    Tip {
        #[command(subcommand)]
        action: TipAction,
    },

    /// Manage actual medal results
    Result {
        #[command(subcommand)]
        action: ResultAction,
    },

    /// Show the ranked scoreboard
    Scoreboard {
        /// Also write the scoreboard as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Export a backup of tips (or results)
    Export {
        #[arg(long)]
        out: PathBuf,
        /// json or csv (default: from file extension, else json)
        #[arg(long)]
        format: Option<SnapshotFormat>,
        /// Export the results table instead of tips
        #[arg(long)]
        results: bool,
    },

    /// Restore tips (or results) from a backup, replacing current state
    Import {
        #[arg(long)]
        input: PathBuf,
        /// json or csv (default: from file extension, else json)
        #[arg(long)]
        format: Option<SnapshotFormat>,
        /// Import the results table instead of tips
        #[arg(long)]
        results: bool,
    },

    /// Delete every saved tip
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum TipAction {
    /// Save or update a tip
    Set {
        #[arg(long)]
        player: String,
        #[arg(long)]
        athlete: String,
        /// None, Bronze, Silver or Gold
        #[arg(long)]
        medal: Medal,
        #[arg(long)]
        note: Option<String>,
    },
    /// Remove a tip
    Remove {
        #[arg(long)]
        player: String,
        #[arg(long)]
        athlete: String,
    },
    /// List a player's tips
    List {
        #[arg(long)]
        player: String,
        /// Also write the tips as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ResultAction {
    /// Record an athlete's actual medal
    Set {
        #[arg(long)]
        athlete: String,
        #[arg(long)]
        medal: Medal,
    },
    /// Show all results
    List,
}

fn init_tracing(verbose: bool) {
    let env = std::env::var("OS_TIPS_LOG").unwrap_or_else(|_| {
        if verbose { "os_tips=debug".to_string() } else { "os_tips=info".to_string() }
    });
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_env_filter(EnvFilter::new(env))
        .try_init();
}

fn dispatch(cli: Cli) -> TipsResult<()> {
    let cfg = AppConfig::load(cli.config.as_deref())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Athletes { sport } => athletes_cmd::run(&cfg, sport, &mut out),
        Commands::Tip { action } => match action {
            TipAction::Set { player, athlete, medal, note } => {
                tip_cmd::set(&cfg, player, athlete, medal, note, &mut out)
            }
            TipAction::Remove { player, athlete } => tip_cmd::remove(&cfg, player, athlete, &mut out),
            TipAction::List { player, json } => tip_cmd::list(&cfg, player, json, &mut out),
        },
        Commands::Result { action } => match action {
            ResultAction::Set { athlete, medal } => result_cmd::set(&cfg, athlete, medal, &mut out),
            ResultAction::List => result_cmd::list(&cfg, &mut out),
        },
        Commands::Scoreboard { json } => scoreboard_cmd::run(&cfg, json, &mut out),
        Commands::Export { out: path, format, results } => backup_cmd::export(&cfg, path, format, results),
        Commands::Import { input, format, results } => backup_cmd::import(&cfg, input, format, results),
        Commands::Reset { yes } => backup_cmd::reset(&cfg, yes, &mut out),
    }
}

fn main() {
    color_eyre::install().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = dispatch(cli) {
        eprintln!("{:#}", e);
        if e.is_retryable() {
            eprintln!("(the operation can be retried)");
        }
        std::process::exit(1);
    }
}
