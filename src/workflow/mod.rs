//! The three-stage translation workflow.
//!
//! ```text
//! IDLE ──advance──▶ INSIGHT_DONE ──advance──▶ DECONSTRUCTED ──advance──▶ RECONSTRUCTED
//!        (summary)                 (logic)                   (final text)
//! ```
//!
//! - `session` - the [`Session`] record and the edit batch type
//! - `store` - the [`SessionStore`] port with file and in-memory stores
//! - `controller` - [`WorkflowController`], the only thing that mutates a session
//!
//! `polish` is orthogonal to the stages and may run at any point.
//!
//! `advance` and `polish` hold the controller for the whole generation call.
//! A host that shares the controller (the HTTP server) uses
//! [`WorkflowController::begin`] and [`WorkflowController::finish`] instead,
//! releasing it while the request is in flight.

pub mod controller;
pub mod session;
pub mod store;

pub use controller::{PendingStep, StepKind, StepOutcome, WorkflowController, WorkflowSnapshot};
pub use session::{Session, SessionEdits, SessionField, StoredFields};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
