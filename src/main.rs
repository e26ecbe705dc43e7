use clap::Parser;
use coinwatch::cli::{Cli, run};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    run(Cli::parse())
}
