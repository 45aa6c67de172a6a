//! # Dialog Editor
//!
//! Authoring engine for branching dialogue. It caches speakers and dialogs,
//! tracks the author's cursor inside the selected dialog, and reconciles the
//! draft under the cursor with a persistence gateway.
//!
//! ## Core Components
//!
//! - **speakers**: Speaker Registry, an append-only speaker cache
//! - **dialogs**: Dialog Registry, the dialog cache, current selection and optimistic label edits
//! - **navigator**: Branch Navigator, the cursor and the sequence-guarded draft fetches
//! - **gateway**: the persistence contract plus in-memory and JSON-file implementations
//! - **session**: the object an editor shell owns and routes every intent through
//!
//! ## Failure Model
//!
//! Validation errors are reported before anything is sent to the gateway.
//! Gateway failures are returned to the calling intent and leave cached state
//! as it was before the intent. Superseded draft fetches are dropped silently.

pub mod config;
pub mod dialogs;
pub mod error;
pub mod gateway;
pub mod navigator;
pub mod session;
pub mod speakers;

pub use config::*;
pub use dialogs::*;
pub use error::*;
pub use gateway::*;
pub use navigator::*;
pub use session::*;
pub use speakers::*;
