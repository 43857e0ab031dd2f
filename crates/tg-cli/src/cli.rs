use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tg",
    about = "Thunk gateway — remote execution front end for a content-addressed build store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file; environment variables override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the gateway HTTP server
    Serve(ServeArgs),
    /// Resolve a reduction cache entry
    Lookup(LookupArgs),
    /// Show size and mode of a stored blob
    Stat(StatArgs),
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Listen address, overriding configuration and PORT
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct LookupArgs {
    pub thunk: String,
    /// Output tag; omit for the thunk's default output
    #[arg(default_value = "")]
    pub tag: String,
}

#[derive(Args)]
pub struct StatArgs {
    pub hash: String,
}
