//! # Service Layer
//!
//! The registry aggregate, the checker and its decorators, and the gate
//! service that implements the inbound ports.

pub mod checker;
pub mod decorators;
pub mod gate_service;
pub mod registry;

pub use checker::SuppressionChecker;
pub use decorators::{AuditEntry, AuditLog, AuditingChecker, CachingChecker};
pub use gate_service::{HealthStatus, SuppressionGateService};
pub use registry::{LoadReport, SuppressionRegistry};
