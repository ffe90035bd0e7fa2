use anyhow::Context;
use recall::cli::{commands, output::Output, Cli};
use recall::utils::config::{LogFormat, RecallConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let config = RecallConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    init_tracing(&config, cli.verbose);

    if let Err(e) = commands::run(cli.command, config, &output).await {
        output.error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

/// `RUST_LOG` wins, then `--verbose`, then `logging.level`. Logs go to
/// stderr so command output stays pipeable.
fn init_tracing(config: &RecallConfig, verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("info,recall=debug,recall_vector=debug")
        } else {
            EnvFilter::new(&config.logging.level)
        }
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}
