//! Core library for the market data aggregation service: configuration,
//! telemetry, and the registry-driven HouseCanary fetch pipeline.

pub mod config;
pub mod error;
pub mod market;
pub mod telemetry;
