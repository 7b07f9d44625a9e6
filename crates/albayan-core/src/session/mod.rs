//! Chat session state.
//!
//! [`store::SessionStore`] is the single owner of the session list and the
//! current-session reference; everything else reads from it or goes through
//! its narrow mutation API.

pub mod store;
