pub mod app;
pub mod ratings;
pub mod state;
