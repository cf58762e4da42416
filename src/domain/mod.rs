//! Core domain types and logic. Nothing in here performs I/O.

pub mod ohlcv;
pub mod indicator;
pub mod features;
pub mod normalize;
pub mod regime;
pub mod scoring;
pub mod universe;
pub mod selection;
pub mod history;
pub mod position;
pub mod trade;
pub mod portfolio;
pub mod execution;
pub mod backtest;
pub mod metrics;
pub mod pipeline;
pub mod settings;
pub mod config_validation;
pub mod error;
