pub mod app;
pub mod error;
pub mod game;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
