pub mod routes;

// Re-export route handlers for convenience
pub use routes::app;
pub use routes::ratings;
pub use routes::state::AppState;
