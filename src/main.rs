//! Spoonful Backend
//!
//! REST backend for the Spoonful recipe sharing app, with SQLite persistence,
//! a live recipe feed and an ingredient calorie calculator.

mod api;
mod auth;
mod catalog;
mod config;
mod db;
mod errors;
mod filter;
mod models;
mod photos;
mod state;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use catalog::Catalog;
use config::Config;
use db::Repository;
use photos::PhotoClient;
use state::RecipeState;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub recipes: Arc<RecipeState>,
    pub catalog: Arc<Catalog>,
    pub photos: PhotoClient,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(config.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!config.log_json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("Starting Spoonful Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Assets directory: {:?}", config.assets_dir);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.app_key.is_none() {
        tracing::warn!("No app key configured (SPOONFUL_APP_KEY). The key check is disabled!");
    }
    if config.unsplash_access_key.is_none() {
        tracing::warn!("No UNSPLASH_ACCESS_KEY configured. New recipes get the placeholder cover");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Counters may have drifted if a previous run died mid-write
    let repaired = repo.reconcile_counters().await?;
    if repaired > 0 {
        tracing::info!("Reconciled {} counter rows", repaired);
    }

    // Load reference data
    let catalog = Arc::new(Catalog::load(&config.assets_dir));
    tracing::info!(
        "Catalog loaded with {} ingredients and {} categories",
        catalog.ingredients().len(),
        catalog.categories().len()
    );

    let photos = PhotoClient::new(
        config.unsplash_api_url.clone(),
        config.unsplash_access_key.clone(),
        config.placeholder_image.clone(),
    )?;

    // Prime the live recipe list
    let recipes = Arc::new(RecipeState::new(Arc::clone(&repo)));
    let snapshot = recipes.refresh_recipes().await;
    tracing::info!("Recipe list primed with {} recipes", snapshot.recipes.len());

    // Create application state
    let state = AppState {
        repo,
        recipes,
        catalog,
        photos,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone the key for the gate layer
    let app_key = state.config.app_key.clone();

    // API routes
    let api_routes = Router::new()
        // Accounts
        .route("/auth/register", post(api::register))
        .route("/auth/login", post(api::login))
        .route("/auth/logout", post(api::logout))
        // Recipes
        .route("/recipes", get(api::list_recipes).post(api::create_recipe))
        .route("/recipes/stream", get(api::stream_recipes))
        .route(
            "/recipes/{id}",
            get(api::get_recipe)
                .put(api::update_recipe)
                .delete(api::delete_recipe),
        )
        .route(
            "/recipes/{id}/favorite",
            get(api::get_favorite).put(api::set_favorite),
        )
        // Current user
        .route("/me", get(api::get_me))
        .route("/me/favorites", get(api::list_favorite_ids))
        .route("/me/favorites/recipes", get(api::list_favorite_recipes))
        // Profiles
        .route("/users/{id}", get(api::get_user_profile))
        // Catalog
        .route("/catalog/ingredients", get(api::search_ingredients))
        .route("/catalog/categories", get(api::search_categories))
        .route("/catalog/calories", post(api::calculate_calories))
        // Datastore
        .route("/datastore/revision", get(api::get_revision))
        // App key is checked before the session is resolved
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::session_layer,
        ))
        .layer(middleware::from_fn(move |req, next| {
            auth::app_key_layer(app_key.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
