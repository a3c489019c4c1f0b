use anyhow::{bail, Context, Result};
use cidrlist_set::config;
use cidrlist_set::{NetworkSet, QueryMode};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod batch;
mod report;

use batch::BatchProcessor;
use report::{CheckResult, EntryRow};

/// Check IP addresses against a list of CIDR networks and hosts
#[derive(Parser)]
#[command(name = "cidrlist")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    networks: NetworkArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct NetworkArgs {
    /// Network entry: host, addr/prefix, addr/netmask or addr/hostmask (repeatable)
    #[arg(short, long = "network", value_name = "ENTRY", global = true)]
    networks: Vec<String>,

    /// File with one network entry per line ('#' starts a comment)
    #[arg(short = 'f', long, value_name = "FILE", global = true)]
    networks_file: Option<PathBuf>,

    /// Skip invalid entries with a warning instead of failing
    #[arg(long, global = true)]
    lenient: bool,

    /// Parse every query as IPv4 (legacy behavior), except ::ffff:-prefixed ones
    #[arg(long, global = true)]
    ipv4_only: bool,
}

impl NetworkArgs {
    fn query_mode(&self) -> QueryMode {
        if self.ipv4_only {
            QueryMode::Ipv4Only
        } else {
            QueryMode::DualStack
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether addresses belong to the network set
    Check(CheckArgs),
    /// Check many addresses from a file or stdin in parallel
    Batch(BatchArgs),
    /// List the parsed networks in canonical form
    Show,
}

#[derive(Parser)]
struct CheckArgs {
    /// Addresses to check
    #[arg(value_name = "ADDRESS", required = true)]
    addresses: Vec<String>,
}

#[derive(Parser)]
struct BatchArgs {
    /// Input file with one address per line (use '-' for stdin)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short, long)]
    workers: Option<usize>,
}

#[derive(Debug, Clone, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output (pretty-printed)
    Json,
    /// JSON output (compact)
    JsonCompact,
    /// CSV output
    Csv,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let set = load_networks(&cli.networks)?;
    let mode = cli.networks.query_mode();

    match cli.command {
        Commands::Check(args) => handle_check(&set, args, mode, &cli.output),
        Commands::Batch(args) => handle_batch(set, args, mode, &cli.output),
        Commands::Show => handle_show(&set, &cli.output),
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Build the set from `--network` entries followed by `--networks-file` entries
fn load_networks(args: &NetworkArgs) -> Result<NetworkSet> {
    let document = match &args.networks_file {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read networks from {}", path.display()))?,
        ),
        None => None,
    };

    let mut set = if args.lenient {
        let (set, errors) = NetworkSet::parse_lenient(&args.networks);
        for err in &errors {
            eprintln!("{} {}", "warning:".yellow(), err);
        }
        set
    } else {
        NetworkSet::new(&args.networks).context("invalid --network entry")?
    };

    if let Some(document) = document {
        let from_file = if args.lenient {
            let (from_file, errors) = config::load_entries_lenient(&document);
            for err in &errors {
                eprintln!("{} {}", "warning:".yellow(), err);
            }
            from_file
        } else {
            config::load_entries(&document).context("invalid entry in networks file")?
        };
        set.extend(from_file);
    }

    if set.is_empty() {
        bail!("no networks given; use --network or --networks-file");
    }

    info!(entries = set.len(), "networks loaded");
    Ok(set)
}

fn handle_check(
    set: &NetworkSet,
    args: CheckArgs,
    mode: QueryMode,
    format: &OutputFormat,
) -> Result<ExitCode> {
    let results: Vec<CheckResult> = args
        .addresses
        .iter()
        .map(|address| report::check_address(set, address, mode))
        .collect();

    report::print_checks(&results, format)?;
    Ok(exit_code(&results))
}

fn handle_batch(
    set: NetworkSet,
    args: BatchArgs,
    mode: QueryMode,
    format: &OutputFormat,
) -> Result<ExitCode> {
    let addresses = batch::read_addresses(args.input.as_deref())?;
    if addresses.is_empty() {
        warn!("batch input is empty");
    }

    let processor = BatchProcessor::new(Arc::new(set), mode, args.workers)?;
    let results = processor.process(&addresses);

    report::print_checks(&results, format)?;
    Ok(exit_code(&results))
}

fn handle_show(set: &NetworkSet, format: &OutputFormat) -> Result<ExitCode> {
    let rows: Vec<EntryRow> = set.iter().map(EntryRow::from).collect();
    report::print_entries(&rows, format)?;
    Ok(ExitCode::SUCCESS)
}

/// Success only when every address is a member
fn exit_code(results: &[CheckResult]) -> ExitCode {
    if all_members(results) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn all_members(results: &[CheckResult]) -> bool {
    results.iter().all(CheckResult::is_member)
}
