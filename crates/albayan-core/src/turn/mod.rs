//! User turn orchestration.
//!
//! [`controller::ChatController`] sequences one user turn against the
//! session store, the remote answer provider, and persistence.

pub mod controller;
