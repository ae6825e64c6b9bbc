use eyre::Report;
use std::sync::Arc;
use storebot::config::AppConfig;
use storebot::models::{Product, Provider};
use storebot::store::MemoryStore;
use storebot::{logging, web, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Report> {
    dotenvy::dotenv().ok();
    logging::setup_logging();

    info!("Starting storebot...");

    let config = AppConfig::from_env()?;
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store, config)?;

    seed_catalog(&state).await?;

    web::serve(web::router(state)).await?;

    info!("storebot shut down gracefully");
    Ok(())
}

/// Seeds a sample product when the catalog is empty so a fresh install has
/// something to order.
async fn seed_catalog(state: &AppState) -> Result<(), Report> {
    if state.store.all_products().await?.is_empty() {
        state
            .store
            .upsert_product(Product {
                code: "TEST10".into(),
                name: "TEST Product 10K".into(),
                category: "pulsa".into(),
                price: 10_000,
                provider: Provider::Saldo,
                active: true,
            })
            .await?;
        info!("Seed sample product created: TEST10");
    }
    Ok(())
}
