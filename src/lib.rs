// Library root for the jokes REST API

pub mod app;
pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod store;

// Re-export commonly used types
pub use app::create_router;
pub use db::Database;
pub use error::ApiError;
pub use services::JokesService;
pub use state::AppState;
pub use store::JokeStore;
