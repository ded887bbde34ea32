use axum::{
    routing::{get, post},
    Router,
};
use diesel::{
    r2d2::{ConnectionManager, Pool},
    SqliteConnection,
};
use time::Duration;
use tokio::net::TcpListener;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

mod catalog;
mod constants;
mod error;
mod model;
mod progress;
mod push;
mod queue;
mod quota;
mod scheduler;
mod schema;
mod session;
mod utils;

#[cfg(test)]
mod test_support;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Database configuration
    dotenv::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://srs.db".into());

    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder().build(manager)?;

    // Sessions configuration; the auth collaborator owns login/logout
    // and stores the account id here.
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_expiry(Expiry::OnInactivity(Duration::days(1)))
        .with_secure(false);

    // Study API router
    let study_router = Router::new()
        .route("/queue", get(queue::fetch_queue))
        .route("/review", post(scheduler::record_review_handler))
        .route("/card", axum::routing::patch(scheduler::edit_account_card_handler))
        .route("/push", post(push::push_cards_handler))
        .route("/statistics", get(progress::learning_statistics_handler))
        .route("/due-projection", get(progress::due_projection_handler))
        .route("/review-history", get(progress::review_history_handler))
        .with_state(pool.clone());

    // Deck settings router
    let deck_router = Router::new()
        .route(
            "/{deck_id}/settings",
            get(quota::fetch_deck_settings).put(quota::update_deck_settings),
        )
        .with_state(pool.clone());

    // Main application router
    let app = Router::new()
        .nest("/api/study", study_router)
        .nest("/api/decks", deck_router)
        .layer(session_layer);

    // Start server
    let listener = TcpListener::bind("127.0.0.1:5000").await?;
    println!("Scheduling API running on http://localhost:5000");
    axum::serve(listener, app).await?;

    Ok(())
}
