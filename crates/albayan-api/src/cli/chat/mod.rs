//! Interactive CLI chat experience for Al-Bayan.
//!
//! Implements the chat loop: answers rendered as markdown with their
//! sources, a loading notice during the remote call, the welcome screen
//! with suggested questions, slash commands for navigating the history, and
//! an inline delete confirmation. Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
