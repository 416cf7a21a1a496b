//! folge-provider: serves the Folge provider over gRPC.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use folge_provider::client::{RecorderMode, RetryPolicy, DEFAULT_MAX_RETRIES};
use folge_provider::{
    init_logging_with_default, serve, serve_on, CassetteOptions, FolgeProvider, ProviderOptions,
};

/// How the cassette is used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum CassetteMode {
    /// Record every interaction, overwriting the cassette.
    Record,
    /// Answer from the cassette only.
    Replay,
    /// Replay when the cassette exists, record otherwise.
    #[default]
    ReplayOrRecord,
}

impl From<CassetteMode> for RecorderMode {
    fn from(mode: CassetteMode) -> Self {
        match mode {
            CassetteMode::Record => RecorderMode::Record,
            CassetteMode::Replay => RecorderMode::Replay,
            CassetteMode::ReplayOrRecord => RecorderMode::ReplayOrRecord,
        }
    }
}

/// Folge provider plugin.
#[derive(Debug, Parser)]
#[command(name = "folge-provider", version, about)]
struct Args {
    /// Default the log level to debug, which includes API traffic
    #[arg(long)]
    debug: bool,

    /// Serve on this address instead of an ephemeral local port
    #[arg(long)]
    address: Option<SocketAddr>,

    /// Retries for failed API requests
    #[arg(long, env = "FOLGE_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    retries: u32,

    /// Record API traffic to, or replay it from, this cassette file
    #[arg(long, env = "FOLGE_CASSETTE")]
    cassette: Option<PathBuf>,

    /// How to use the cassette
    #[arg(long, value_enum, default_value_t)]
    cassette_mode: CassetteMode,
}

impl Args {
    fn provider_options(&self) -> ProviderOptions {
        ProviderOptions {
            retry: RetryPolicy::with_max_retries(self.retries),
            cassette: self.cassette.clone().map(|path| CassetteOptions {
                path,
                mode: self.cassette_mode.into(),
            }),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging_with_default(if args.debug { "debug" } else { "info" });

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Folge provider");
    let provider = FolgeProvider::new(args.provider_options());

    match args.address {
        Some(addr) => serve_on(provider, addr).await,
        None => serve(provider).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_cassette_options() {
        let args = Args::parse_from([
            "folge-provider",
            "--retries",
            "2",
            "--cassette",
            "session.yaml",
            "--cassette-mode",
            "replay",
        ]);
        let options = args.provider_options();

        assert_eq!(options.retry.max_retries, 2);
        let cassette = options.cassette.unwrap();
        assert_eq!(cassette.path, PathBuf::from("session.yaml"));
        assert_eq!(cassette.mode, RecorderMode::Replay);
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["folge-provider", "--address", "127.0.0.1:50051"]);
        assert!(!args.debug);
        assert_eq!(args.cassette_mode, CassetteMode::ReplayOrRecord);
        assert!(args.provider_options().cassette.is_none());
    }
}
