//! Business logic and port trait definitions for Al-Bayan.
//!
//! This crate owns the session store and the turn state machine, and defines
//! the "ports" (`KvStore`, `AnswerProvider`) that the infrastructure layer
//! implements. It depends only on `albayan-types` -- never on
//! `albayan-infra` or any database/HTTP crate.

pub mod llm;
pub mod session;
pub mod storage;
pub mod turn;
