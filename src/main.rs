// src/main.rs
use idol_planner::api;
use idol_planner::catalog::Catalog;
use idol_planner::config::AppConfig;

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let api_config = app_config.api.clone();
    let optimizer_config = app_config.optimizer.clone();

    println!("🚀 Idol planner starting...");
    let catalog = match app_config.catalog.path() {
        Some(path) => match Catalog::load(path) {
            Ok(catalog) => {
                println!(
                    "📦 Loaded {} modifiers from {}",
                    catalog.modifier_count(),
                    path.display()
                );
                catalog
            }
            Err(err) => {
                eprintln!(
                    "⚠️ Could not load catalog from {}: {}. Using standard footprints without modifiers.",
                    path.display(),
                    err
                );
                Catalog::empty()
            }
        },
        None => {
            println!("⚠️ IDOL_PLANNER_CATALOG_PATH not set. Using standard footprints without modifiers.");
            Catalog::empty()
        }
    };

    api::start_api_server(api_config, optimizer_config, catalog).await;
}
