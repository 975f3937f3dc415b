//! Uptree Core - domain model for the tier lifecycle engine
//!
//! The vocabulary shared by every stage of the daily run:
//! - The tier ladder and its fixed promotion/demotion map
//! - Agent directory rows and the snapshots history keeps of them
//! - Lifecycle records (probation windows and review outcomes)
//! - The append-only promotion history and audit logs
//! - Outbound notice payloads
//! - The storage ports the engine is wired to
//!
//! # Conventions
//!
//! 1. All money values are i64 minor units
//! 2. All timestamps are `chrono::DateTime<Utc>`; "today" always arrives
//!    from the caller, never from a hidden clock

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod agent;
pub mod audit;
pub mod error;
pub mod history;
pub mod lifecycle;
pub mod notice;
pub mod stores;
pub mod tier;

// Re-exports for convenience
pub use agent::{AgencyId, AgentId, AgentProfile, AgentSnapshot};
pub use audit::{AuditEntry, Operator};
pub use error::EngineError;
pub use history::{PromotionRecord, ReparentOutcome, SponsorChange, StepOutcome};
pub use lifecycle::{LifecycleRecord, LifecycleStatus};
pub use notice::{format_amount, Notice, NoticeChannel};
pub use stores::{
    DemotionCommit, DirectoryStore, HistoryStore, LifecycleStore, Notifier, PromotionCommit,
    ReparentCommit, RevenueStore, StoreError, TierLedger,
};
pub use tier::Tier;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the uptree domain
    pub use crate::{
        AgencyId, AgentId, AgentProfile, AgentSnapshot, EngineError, LifecycleRecord,
        LifecycleStatus, Notice, PromotionRecord, StepOutcome, Tier,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
