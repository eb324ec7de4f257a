// src/main.rs

use axum::{
    Router,
    routing::{get, post},
};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Deklaracje modułów
mod auth; // dla src/auth.rs
mod auth_models; // dla src/auth_models.rs
mod errors; // dla src/errors.rs
mod filters; // dla src/filters.rs
mod handlers; // dla src/handlers.rs
#[cfg(test)]
mod memory_store; // dla src/memory_store.rs (tylko testy)
mod middleware; // dla src/middleware.rs
mod models; // dla src/models.rs
mod pagination; // dla src/pagination.rs
mod repository; // dla src/repository.rs
mod services; // dla src/services.rs
mod sorting; // dla src/sorting.rs
mod state; // dla src/state.rs

// Importy z własnych modułów
use crate::handlers::*;
use crate::repository::PgOrderStore;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();

    // Inicjalizacja systemu logowania (tracing)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "order_checkout_service=debug,tower_http=debug".into()), // np. RUST_LOG=info cargo run
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Inicjalizacja serwera...");

    // --- Połączenie z bazą danych ---
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
        .unwrap_or_else(|_| "5".to_string())
        .parse::<u32>()
        .expect("DATABASE_MAX_CONNECTIONS must be a valid number");
    let pool = match PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("Pomyślnie połączono z bazą danych");
            pool
        }
        Err(err) => {
            tracing::error!("Nie można połączyć z bazą danych: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!("Nie udało się uruchomić migracji: {:?}", err);
        std::process::exit(1);
    }

    // --- Konfiguracja JWT ---
    let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

    let port = env::var("SERVER_PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .expect("SERVER_PORT must be a valid port number");

    // Definicja AppState
    let app_state = Arc::new(AppState {
        store: Arc::new(PgOrderStore::new(pool)),
        jwt_secret,
    });

    // Definicja routingu aplikacji
    let app = Router::new()
        .route("/api/orders", get(list_orders_handler))
        .route("/api/orders/{order_id}", get(get_order_details_handler))
        .route(
            "/api/orders/{order_id}/checkout",
            post(checkout_order_handler),
        )
        .route("/api/orders/{order_id}/cancel", post(cancel_order_handler))
        .route("/api/saved-products", get(list_saved_products_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Nasłuchuj na wszystkich interfejsach
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Serwer nasłuchuje na {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Nie można powiązać adresu {}: {}", addr, e);
            return; // Zakończ, jeśli nie można uruchomić serwera
        }
    };

    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        tracing::error!("Błąd serwera: {}", e);
    }
}
