//! Core data types for the Dramaturge script analysis engine.
//!
//! This crate provides the data model shared across the workspace: the
//! screenplay representation (`Script`, `Scene`), the three stage output
//! schemas (`DiscovererOutput`, `AuditorOutput`, `ModifierOutput`), and
//! the message types used at the model boundary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod message;
mod modifier;
mod rankings;
mod request;
mod role;
mod script;
mod tcc;
mod telemetry;

pub use message::Message;
pub use modifier::{
    AuditReport, FixAction, Issue, IssueCategory, ModificationAction, ModificationLogEntry,
    ModificationValidation, ModifierOutput, Severity, SuggestedFix,
};
pub use rankings::{
    ALineRanking, ALineReasoning, AuditorMetrics, AuditorOutput, BLineRanking, BLineReasoning,
    CLineRanking, CLineReasoning, Forces, Rankings,
};
pub use request::{GenerateRequest, GenerateResponse};
pub use role::Role;
pub use script::{
    InfoChange, KeyObject, PerformanceNote, RelationChange, Scene, Script, SetupPayoff,
};
pub use tcc::{ConflictType, DiscovererMetadata, DiscovererOutput, Tcc};
pub use telemetry::init_telemetry;
