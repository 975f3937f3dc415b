//! Uptree Engine - the tier lifecycle & tree-reparenting batch engine
//!
//! The daily run over a tiered sales network:
//! - Scans trailing-window revenue against per-tier bars and promotes
//! - Reviews probation deadlines and retains or demotes
//! - Repairs the referral tree's ordering invariant after tier changes
//! - Emits fire-and-forget notices for the day's transitions
//!
//! # Example
//!
//! ```rust,ignore
//! use uptree_engine::{EngineConfig, LifecycleEngine};
//!
//! # async fn example(stores: Stores) -> Result<(), uptree_core::EngineError> {
//! let engine = LifecycleEngine::new(
//!     stores.revenue,
//!     stores.directory,
//!     stores.lifecycle,
//!     stores.history,
//!     stores.ledger,
//!     stores.notifier,
//!     EngineConfig::default(),
//! );
//!
//! let summary = engine.run_daily(chrono::Utc::now()).await?;
//! println!("promoted {} agents", summary.promotion.processed);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod engine;
pub mod notify;
pub mod promotion;
pub mod reparent;
pub mod report;
pub mod retention;
pub mod scanner;

// Re-exports for convenience
pub use config::{EngineConfig, PromotionRule, RetentionRule, CASA_AGENCY};
pub use engine::LifecycleEngine;
pub use notify::NotificationDriver;
pub use promotion::PromotionProcessor;
pub use reparent::{RepairOutcome, TreeReparenter};
pub use report::{AgentFailure, DailySummary, RunReport};
pub use retention::{RetentionReviewer, ReviewOutcome};
pub use scanner::{Candidate, ThresholdScanner};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the engine
    pub use crate::{
        Candidate, DailySummary, EngineConfig, LifecycleEngine, RepairOutcome, ReviewOutcome,
        RunReport,
    };
    pub use uptree_core::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
