use anyhow::Result;
use clap::Parser;
use medtracker_cli::MedtrackerCli;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = MedtrackerCli::parse();
    let stdout = std::io::stdout();
    medtracker_cli::run(cli, &mut stdout.lock()).await
}
