// Library crate for integration tests.
// main.rs has its own mod declarations; this re-exports all modules.

pub mod config;
pub mod error;
pub mod ingest;
pub mod loot;
pub mod reference;
pub mod report;
pub mod routes;
pub mod server;
pub mod service;
pub mod store;
