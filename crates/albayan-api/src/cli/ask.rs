//! One-shot question: `albayan ask <text>`.
//!
//! Runs a single turn through the same controller as the chat loop, so the
//! question and its answer are stored like any other turn.

use std::time::Duration;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use albayan_core::turn::controller::TurnOutcome;

use crate::cli::chat::renderer::ChatRenderer;
use crate::cli::session::require_session;
use crate::state::AppState;

/// Spinner text while the remote call is in flight.
pub const LOADING_TEXT: &str = "جاري البحث في المصادر الموثوقة...";

/// A steady-tick spinner, hidden when output is machine-readable or quiet.
pub fn loading_spinner(hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.set_message(LOADING_TEXT);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Ask one question, optionally as a follow-up in an existing session.
///
/// # Examples
///
/// ```bash
/// albayan ask "ما حكم الصلاة؟"
/// albayan ask "وما دليل ذلك؟" --session 1
/// ```
pub async fn ask(
    state: &AppState,
    text: &str,
    session: Option<&str>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    if let Some(selector) = session {
        let target = require_session(state, selector)?;
        state.controller.select_session(&target.id)?;
    }

    let spinner = loading_spinner(json || quiet);
    let result = state.controller.submit(text).await;
    spinner.finish_and_clear();
    let report = result?;

    if json {
        let (status, message) = match &report.outcome {
            TurnOutcome::Answered(msg) => ("answered", Some(msg)),
            TurnOutcome::Failed(msg) => ("failed", Some(msg)),
            TurnOutcome::Discarded => ("discarded", None),
        };
        let out = serde_json::json!({
            "session_id": report.session_id,
            "status": status,
            "message": message,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let renderer = ChatRenderer::new(None);
    match &report.outcome {
        TurnOutcome::Answered(msg) | TurnOutcome::Failed(msg) => {
            println!();
            print!("{}", renderer.render_message_safely(msg));
            println!();
        }
        TurnOutcome::Discarded => {}
    }

    if !quiet {
        println!(
            "  {}",
            style(format!(
                "Session {} (continue with: albayan ask --session {} ...)",
                crate::cli::session::short_id(&report.session_id),
                crate::cli::session::short_id(&report.session_id)
            ))
            .dim()
        );
    }

    Ok(())
}
