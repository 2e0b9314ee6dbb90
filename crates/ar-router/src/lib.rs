//! Atomic router: natural-language to tool-call routing.
//!
//! A request is split into intent spans; each span gets a tool, then
//! arguments from a pattern → local model → cloud cascade, then schema
//! validation and normalization. Duplicate calls are removed last.
//!
//! Modules are public so `ar-api` and `ar-e2e-tests` can build a
//! [`controller::RoutingController`] with mock models.

pub mod cascade;
pub mod coerce;
pub mod config;
pub mod controller;
pub mod dedup;
pub mod error;
pub mod inference;
pub mod normalizer;
pub mod registry;
pub mod segmenter;
pub mod selector;
pub mod timeparse;
pub mod tools;
pub mod validator;

pub use controller::{MetricsSnapshot, RoutingController};
pub use error::{RouteError, RouteResult};
