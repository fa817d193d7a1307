//! The reconciliation engine: matching, tag diffing, rule synthesis,
//! membership and deployment planning, and the orchestrator that drives them.

pub mod deployments;
pub mod matching;
pub mod membership;
pub mod orchestrator;
pub mod report;
pub mod rules;
pub mod tags;

pub use matching::{similar, SIMILARITY_THRESHOLD};
pub use orchestrator::{Orchestrator, SyncOptions};
pub use report::{OutcomeCounts, SyncReport};
pub use rules::{synthesize, Synthesis};
pub use tags::{diff_tags, TagDiff, TagPolicy};
