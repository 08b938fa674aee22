pub mod diff;
pub mod error;
pub mod record;
pub mod redact;
pub mod store;
pub mod testing;
pub mod trail;

pub use diff::{FieldChange, diff_snapshots};
pub use error::AuditError;
pub use record::{AuditAction, AuditChange, AuditPage, AuditQuery, AuditRecord};
pub use redact::{RedactConfig, RedactingAuditStore, Redactor};
pub use store::AuditStore;
pub use trail::AuditTrail;
