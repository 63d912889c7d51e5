//! Seams to the outside world: audit logging and the human review console.

mod audit;
mod human;

pub use audit::{AuditEvent, AuditSink, LogAudit, MemoryAudit, NullAudit};
pub use human::{ConsoleInterface, HumanInterface, PendingApprovals};
