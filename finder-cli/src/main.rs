use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use finder::{CliOverrides, Finder, SearchConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file layered over .finder.yaml and the global config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Directory, FTP path or zip archive to search in
    root: Option<PathBuf>,

    /// Regular expression tested against each name
    #[arg(short = 'p', long)]
    pattern: Option<String>,

    /// Levels below root to search (-1 for no limit)
    #[arg(short = 'd', long, allow_hyphen_values = true)]
    depth: Option<i32>,

    /// Report every match instead of stopping at the first
    #[arg(short = 'a', long)]
    all: bool,

    /// Match names case-insensitively
    #[arg(short = 'i', long)]
    ignore_case: bool,

    /// Folder names to skip (can be specified multiple times)
    #[arg(short = 'x', long = "exclude")]
    exclude: Vec<String>,

    /// Print results as a JSON array
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(flatten)]
    ftp: FtpArgs,
}

#[derive(Args, Debug, Clone)]
struct FtpArgs {
    /// Search an FTP server (host:port) instead of the local filesystem
    #[arg(long)]
    ftp: Option<String>,

    /// FTP user name
    #[arg(long, default_value = "anonymous")]
    user: String,

    /// FTP password
    #[arg(long, default_value = "")]
    password: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Find files whose name matches the pattern
    Files {
        #[command(flatten)]
        common: CommonArgs,

        /// Treat ROOT as a zip archive and search its entries
        #[arg(long, conflicts_with = "ftp")]
        zip: bool,
    },

    /// Find folders whose name matches the pattern
    Folders {
        #[command(flatten)]
        common: CommonArgs,

        /// Keep searching inside folders that already matched
        #[arg(long)]
        descend: bool,
    },
}

fn main() -> Result<()> {
    run()
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let (common, kind) = match cli.command {
        Commands::Files { common, zip } => (common, Kind::Files { zip }),
        Commands::Folders { common, descend } => (common, Kind::Folders { descend }),
    };

    let overrides = CliOverrides {
        root: common.root.clone(),
        pattern: common.pattern.clone(),
        depth: common.depth,
        all_matches: common.all,
        descend_into_matched_folder: matches!(kind, Kind::Folders { descend: true }),
        ignore_case: common.ignore_case,
        excluded_names: common.exclude.clone(),
        log_level: common.log_level.clone(),
        remote: common.ftp.ftp.is_some(),
    };
    let config = SearchConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?
        .merge_with_cli(overrides);

    init_logging(&config.log_level);

    let finder = Finder::new(config)?;
    let results = match &common.ftp.ftp {
        Some(address) => search_ftp(&finder, &common.ftp, address, kind)?,
        None => match kind {
            Kind::Files { zip: true } => finder.find_files_in_zip()?,
            Kind::Files { zip: false } => finder.find_files_in_dir()?,
            Kind::Folders { .. } => finder.find_folders_in_dir()?,
        },
    };

    print_results(&results, common.json)
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Files { zip: bool },
    Folders { descend: bool },
}

fn search_ftp(finder: &Finder, args: &FtpArgs, address: &str, kind: Kind) -> Result<Vec<String>> {
    if let Kind::Files { zip: true } = kind {
        bail!("--zip cannot be combined with --ftp");
    }

    let mut stream = suppaftp::FtpStream::connect(address)
        .with_context(|| format!("cannot connect to {}", address))?;
    stream
        .login(args.user.as_str(), args.password.as_str())
        .with_context(|| format!("login to {} failed", address))?;

    let results = match kind {
        Kind::Files { .. } => finder.find_files_in_ftp(&mut stream),
        Kind::Folders { .. } => finder.find_folders_in_ftp(&mut stream),
    };

    if let Err(e) = stream.quit() {
        tracing::warn!("Closing FTP session failed: {}", e);
    }
    Ok(results?)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_results(results: &[String], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    if results.is_empty() {
        eprintln!("{}", "No matches found".yellow());
        return Ok(());
    }
    for path in results {
        println!("{}", path.blue());
    }
    eprintln!("{}", format!("{} match(es)", results.len()).green());
    Ok(())
}
