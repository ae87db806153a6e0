//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep RPC layers decoupled from storage details.

pub mod counters_service;
