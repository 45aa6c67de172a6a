//! # Dialog Model
//!
//! Data model for branching dialogue content: speakers, dialogs made of
//! labeled branches, and the step coordinates and drafts an author edits.
//! This crate holds no I/O and no async code; the `dialog_editor` crate owns
//! caching, navigation and persistence.

pub mod dialog;
pub mod error;
pub mod ids;
pub mod speaker;
pub mod step;

pub use dialog::*;
pub use error::*;
pub use ids::*;
pub use speaker::*;
pub use step::*;
