use anyhow::Context;
use atlas_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load bookshelf settings")?;
    atlas_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.endpoint,
        "bookshelf starting"
    );

    bookshelf::serve(settings).await
}
