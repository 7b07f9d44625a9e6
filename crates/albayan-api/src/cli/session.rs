//! Session management CLI commands: list, export, delete.
//!
//! Provides session browsing with rich tables, Markdown/JSON export, and
//! deletion with confirmation prompt. Sessions are addressed by their
//! position in the list (1 = newest) or by id (a unique prefix is enough).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use albayan_types::chat::{ChatSession, MessageRole};

use crate::state::AppState;

/// Confirmation asked before any delete.
pub const DELETE_CONFIRM_TEXT: &str = "هل أنت متأكد من حذف هذه المحادثة؟";

/// Shown when there is nothing in the history.
pub const EMPTY_HISTORY_TEXT: &str = "لا توجد محادثات سابقة";

/// Minimum id prefix length accepted as a selector.
const MIN_PREFIX_LEN: usize = 4;

/// Resolve a list number or id (or unique id prefix) to a session id.
pub fn resolve_selector(sessions: &[ChatSession], selector: &str) -> Option<String> {
    let selector = selector.trim();

    if let Ok(n) = selector.parse::<usize>() {
        if n >= 1 && n <= sessions.len() {
            return Some(sessions[n - 1].id.clone());
        }
    }

    if let Some(exact) = sessions.iter().find(|s| s.id == selector) {
        return Some(exact.id.clone());
    }

    if selector.len() < MIN_PREFIX_LEN {
        return None;
    }
    let mut matches = sessions.iter().filter(|s| s.id.starts_with(selector));
    match (matches.next(), matches.next()) {
        (Some(only), None) => Some(only.id.clone()),
        _ => None,
    }
}

/// Resolve `selector` against the controller's sessions or fail with context.
pub fn require_session(state: &AppState, selector: &str) -> Result<ChatSession> {
    let sessions = state.controller.sessions();
    let id = resolve_selector(&sessions, selector)
        .with_context(|| format!("Session '{selector}' not found"))?;
    sessions
        .into_iter()
        .find(|s| s.id == id)
        .with_context(|| format!("Session '{selector}' not found"))
}

/// Short display form of a session id.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Epoch-millisecond timestamp as local-agnostic UTC text.
pub fn format_millis(millis: i64, fmt: &str) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.format(fmt).to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// List stored sessions, newest first.
///
/// # Examples
///
/// ```bash
/// albayan sessions
/// albayan sessions --json
/// ```
pub fn list_sessions(state: &AppState, json: bool) -> Result<()> {
    let sessions = state.controller.sessions();

    if json {
        let rows: Vec<serde_json::Value> = sessions
            .iter()
            .map(|s| {
                serde_json::json!({
                    "id": s.id,
                    "title": s.title,
                    "createdAt": s.created_at,
                    "messages": s.messages.len(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} {}. Start one with: {}",
            style("i").blue().bold(),
            EMPTY_HISTORY_TEXT,
            style("albayan chat").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Started").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("ID").fg(Color::White),
    ]);

    for (i, session) in sessions.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1).fg(Color::DarkGrey),
            Cell::new(&session.title).fg(Color::Cyan),
            Cell::new(format_millis(session.created_at, "%Y-%m-%d %H:%M")).fg(Color::White),
            Cell::new(session.messages.len()).fg(Color::White),
            Cell::new(short_id(&session.id)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Markdown transcript of one session, sources included.
pub fn session_markdown(session: &ChatSession) -> String {
    let mut out = format!("# {}\n\n", session.title);
    out.push_str(&format!(
        "- **Started:** {}\n",
        format_millis(session.created_at, "%Y-%m-%d %H:%M UTC")
    ));
    out.push_str(&format!("- **Messages:** {}\n\n---\n\n", session.messages.len()));

    for msg in &session.messages {
        let role_label = match msg.role {
            MessageRole::User => "**You**",
            MessageRole::Model if msg.is_error => "**Al-Bayan (error)**",
            MessageRole::Model => "**Al-Bayan**",
        };
        let time = format_millis(msg.timestamp, "%H:%M");
        out.push_str(&format!("### {role_label} ({time})\n\n{}\n\n", msg.text));

        let sources = msg.sources();
        if !sources.is_empty() {
            out.push_str("**المصادر والمراجع:**\n\n");
            for (i, source) in sources.iter().enumerate() {
                out.push_str(&format!("{}. [{}]({})\n", i + 1, source.title, source.uri));
            }
            out.push('\n');
        }
    }
    out
}

/// Export a session as Markdown (default) or JSON.
///
/// # Examples
///
/// ```bash
/// albayan show 1
/// albayan show 0192f0c1 --json
/// ```
pub fn show_session(state: &AppState, selector: &str, json: bool) -> Result<()> {
    let session = require_session(state, selector)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        print!("{}", session_markdown(&session));
    }
    Ok(())
}

/// Whether `delete` must ask before removing a session. Only `--force`
/// skips the prompt; `--json` changes the output, not the confirmation.
fn needs_confirmation(force: bool) -> bool {
    !force
}

/// Delete a session with confirmation.
///
/// # Examples
///
/// ```bash
/// albayan delete 2
/// albayan delete 0192f0c1 --force
/// ```
pub async fn delete_session(state: &AppState, selector: &str, force: bool, json: bool) -> Result<()> {
    let session = require_session(state, selector)?;

    if needs_confirmation(force) {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "{} '{}' ({} messages)",
                DELETE_CONFIRM_TEXT,
                style(&session.title).red().bold(),
                session.messages.len()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            if json {
                println!(
                    "{}",
                    serde_json::json!({"deleted": false, "session_id": session.id})
                );
            } else {
                println!("  Cancelled.");
            }
            return Ok(());
        }
    }

    state.controller.delete_session(&session.id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": true, "session_id": session.id})
        );
    } else {
        println!(
            "  {} Session '{}' deleted.",
            style("x").red().bold(),
            session.title
        );
    }

    Ok(())
}
