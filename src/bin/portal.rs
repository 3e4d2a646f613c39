use clap::Parser;
use portal_api::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let output_format = portal_api::cli::OutputFormat::from_cli(&cli);

    if let Err(e) = portal_api::cli::run(cli).await {
        let message = match std::env::var("CLI_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => format!("{e:?}"),
            _ => format!("{e}"),
        };
        portal_api::cli::utils::output_error(output_format, &message)?;
        std::process::exit(1);
    }

    Ok(())
}
