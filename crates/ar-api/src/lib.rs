//! Atomic router API: library crate for the routing HTTP server.
//!
//! Re-exports all modules so the binary (`main.rs`) and external crates
//! (e.g. `ar-e2e-tests`) can access `AppState` and `build_router`.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
