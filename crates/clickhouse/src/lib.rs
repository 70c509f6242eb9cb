//! ClickHouse-backed visit store.
//!
//! Implements the same capabilities as the REST backend: awaited inserts,
//! the exit patch (as an `ALTER TABLE ... UPDATE` mutation) and range selects
//! for the dashboard.

pub mod client;
pub mod config;
pub mod health;
pub mod insert;
pub mod query;
pub mod schema;

pub use client::ClickHouseClient;
pub use config::ClickHouseConfig;
pub use health::{check_connection, init_schema};
pub use insert::ClickHouseBeacon;
