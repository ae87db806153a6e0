//! Domain model for daily gamification counters.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - At most one `DailyCounters` exists per (`UserId`, `CivilDay`).
//! - Counter values never decrease and are never reset.

pub mod counters;
