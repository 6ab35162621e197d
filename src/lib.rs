//! Daily attendance recording: check-in, check-out and annual leave per user
//! per day, with history queries and a report export.

pub mod api;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod model;
pub mod routes;
pub mod service;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
