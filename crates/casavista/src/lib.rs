//! Core library for the Casavista admin backend: the request access gate,
//! the content-block and apartment stores, the order reconciler, and the
//! storage connection pool behind them.

pub mod auth;
pub mod config;
pub mod content;
pub mod error;
pub mod i18n;
pub mod storage;
pub mod telemetry;
