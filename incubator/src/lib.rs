pub mod app;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod routes;
pub mod server;
