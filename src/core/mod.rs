//! Core module - infrastructure shared by every component:
//! access control, error taxonomy, application state.

pub mod access;
pub mod error;
pub mod state;

pub use access::{Caller, TrustLevel, require_admin, require_member, require_role};
pub use error::{ChatError, is_unique_violation};
pub use state::AppState;
