mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    apply, check, from_message, instantiate, mot, mtt, new, roundtrip, ApplyArgs, CheckArgs, Context,
    FromMessageArgs, InstantiateArgs, MessageArgs, MttArgs, NewArgs,
};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// ordtree - message trees and editable prototypes
#[derive(Parser, Debug)]
#[command(name = "ordtree")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Schema file (overrides the config)
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the message type tree of a type
    Mtt(MttArgs),

    /// Print the message object tree of a message instance
    Mot(MessageArgs),

    /// Check that a message survives building and reducing its MOT
    Roundtrip(MessageArgs),

    /// Create a prototype document for a type
    New(NewArgs),

    /// Create a prototype document from a message instance
    FromMessage(FromMessageArgs),

    /// Apply a stream of operations to a prototype document
    Apply(ApplyArgs),

    /// Fill a prototype's placeholders and print the message
    Instantiate(InstantiateArgs),

    /// Report consistency problems in a prototype document
    Check(CheckArgs),
}

fn init_logging(verbose: bool, config: &Config) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if verbose => EnvFilter::new("debug"),
        Err(_) => EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = Config::load(&cwd)?;
    init_logging(cli.verbose, &config);

    let mut ctx = Context::new(cwd, config, cli.schema)?;
    match cli.command {
        Command::Mtt(args) => mtt(args, &mut ctx),
        Command::Mot(args) => mot(args, &mut ctx),
        Command::Roundtrip(args) => roundtrip(args, &mut ctx),
        Command::New(args) => new(args, &mut ctx),
        Command::FromMessage(args) => from_message(args, &mut ctx),
        Command::Apply(args) => apply(args, &mut ctx),
        Command::Instantiate(args) => instantiate(args, &mut ctx),
        Command::Check(args) => check(args, &mut ctx),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
