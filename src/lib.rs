//! Filtering and aggregation engine behind the São Paulo listings dashboard.

pub mod config;
pub mod data;
pub mod state;
