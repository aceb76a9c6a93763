//! HTTP front end for natural language trade queries.
pub mod args;
pub mod config;
pub mod envelope;
pub mod errors;
pub mod handlers;
pub mod server;
