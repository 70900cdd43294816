//! Library entry for apcheck exposing the reconciliation pipeline for integration tests.

pub mod app;
pub mod args;
pub mod config;
pub mod error;
pub mod index;
pub mod logic;
pub mod report;
pub mod sources;
pub mod util;
