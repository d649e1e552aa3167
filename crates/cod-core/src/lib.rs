//! Core types and trait definitions for the cash-on-delivery dashboard.
//!
//! This crate has no HTTP or database dependencies. It owns the typed records
//! and the contact-status derivation. The reporting views live here too, along
//! with the lifecycle mutators that are the only permitted way to change a
//! record's status or history.

pub mod contact;
pub mod delivery;
pub mod error;
pub mod fake_order;
pub mod format;
pub mod high_risk;
pub mod history;
pub mod lifecycle;
pub mod order;
pub mod report;
pub mod status;
pub mod store;
pub mod user;

pub use error::{Error, Result};
