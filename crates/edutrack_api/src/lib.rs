//! Authenticated RPC surface over EduTrack core.

pub mod api;

pub use api::{
    core_version, get_my_history, get_my_stats, init_logging, ping, HistoryResponse, Session,
    StatsResponse,
};
pub use edutrack_core::StatsSnapshot;
