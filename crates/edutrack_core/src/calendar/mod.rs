//! Civil calendar helpers for daily partitioning.
//!
//! # Responsibility
//! - Resolve instants into the fixed-offset calendar day used as the
//!   partition key for daily aggregates.
//! - Abstract "now" behind an injectable clock.
//!
//! # Invariants
//! - Day resolution never consults the host timezone database.

pub mod civil_day;
pub mod clock;
