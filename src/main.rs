use clap::Parser;
use tracing_subscriber::EnvFilter;

use timelytics::cli::{self, Cli};
use timelytics::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // --help and --version must work even when the environment is misconfigured.
    let cli = Cli::parse();

    let config = Config::from_env()?;
    init_tracing(config.log_json);

    cli::run(cli.command, &config).await
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("timelytics=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
