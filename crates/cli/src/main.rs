use anyhow::Context;
use atlas_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "atlas-cli", about = "Operate the bookshelf service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API until ctrl-c
    Serve,
    /// Print the merged OpenAPI document
    Openapi,
    /// Print the effective configuration with secrets redacted
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().context("failed to load settings")?;

    match cli.command {
        Command::Serve => {
            atlas_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "serving from atlas-cli");
            bookshelf::serve(settings).await
        }
        // No telemetry here so stdout carries only the document.
        Command::Openapi => {
            let registry = bookshelf::build_registry(&settings)?;
            let document = atlas_http::router::openapi_document(&registry);
            println!("{}", serde_json::to_string_pretty(&document)?);
            Ok(())
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&redacted(&settings))?);
            Ok(())
        }
    }
}

fn redacted(settings: &Settings) -> serde_json::Value {
    serde_json::json!({
        "environment": format!("{:?}", settings.environment).to_lowercase(),
        "server": {
            "host": settings.server.host,
            "port": settings.server.port,
            "request_timeout_ms": settings.server.request_timeout_ms,
        },
        "database": {
            "endpoint": settings.database.endpoint,
            "namespace": settings.database.namespace,
            "database": settings.database.database,
        },
        "telemetry": {
            "log_format": format!("{:?}", settings.telemetry.log_format).to_lowercase(),
            "log_level": settings.telemetry.log_level,
        },
        "auth": {
            "jwt_secret": "<redacted>",
            "token_ttl_secs": settings.auth.token_ttl_secs,
        },
    })
}
