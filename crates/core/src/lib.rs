//! Core business logic for Walletwise.
//!
//! This crate contains the budget status engine with ZERO storage or UI
//! dependencies. Collaborators (budget list, spend totals, budget storage) are
//! injected through the traits in [`budget::source`].
//!
//! # Modules
//!
//! - `budget` - Period resolution, status calculation and live status streams
//!
//! The time zone and "today" are always passed in explicitly (see
//! [`budget::Clock`]); nothing here reads the process-wide local zone.

pub mod budget;
