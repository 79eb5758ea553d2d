// Crate root for the Viridis color aggregation server.

pub mod app;
pub mod config;
pub mod constants;
pub mod engine;
pub mod http;
pub mod hub;
pub mod store;
pub mod tasks;
pub mod utils;
pub mod ws;
