use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use mongodb::Client;
use tracing_subscriber::EnvFilter;

use splitledger::config::Config;
use splitledger::routes::{self, AppState};
use splitledger::store::{MongoStore, Store};

// Seeded category lookup table, inserted only when the collection is empty.
const CATEGORIES: [&str; 8] = [
    "Viagem",
    "Casa",
    "Evento",
    "Projeto",
    "Investimento",
    "Churrasco",
    "Rolê",
    "Outro",
];

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let client = Client::with_uri_str(&config.mongodb_uri)
        .await
        .expect("failed to connect");
    let store: Arc<dyn Store> = Arc::new(MongoStore::new(client, &config.database));
    store
        .seed_categories(&CATEGORIES)
        .await
        .expect("failed to seed categories");
    tracing::info!(port = config.port, database = %config.database, "connected, serving");

    let state = web::Data::new(AppState {
        store,
        secret: config.secret.clone(),
    });
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await
}
