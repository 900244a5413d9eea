//! Bookshelf: books, reviews and user accounts served over the ATLAS
//! framework crates.

pub mod modules;
pub mod rules;
pub mod state;
pub mod store;
pub mod utils;

pub use state::AppState;

use atlas_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Open the stores described by `settings` and register every module
/// against them.
pub fn build_registry(settings: &Settings) -> anyhow::Result<ModuleRegistry> {
    let state = AppState::new(settings)?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &state)?;
    Ok(registry)
}

/// Run the API until ctrl-c: init and start modules, serve, then stop
/// modules in reverse order.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let registry = build_registry(&settings)?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = atlas_http::start_server(&registry, &settings).await;

    registry.stop_modules().await?;
    served
}
