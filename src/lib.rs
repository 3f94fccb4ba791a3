pub mod apis;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod matching;
pub mod parser;
pub mod pipeline;
pub mod types;

// Ports the fetchers depend on, and their reqwest-backed implementations
pub mod app;
pub mod infra;
