//! Core domain types and logic.

pub mod engine;
pub mod error;
pub mod stock;
pub mod trade;
