//! Main chat loop orchestration.
//!
//! Reads lines and finished turns concurrently: a submitted question runs as
//! a spawned task on the shared controller while the prompt stays live, so
//! navigation commands keep working during the remote call. New questions
//! are refused until the in-flight turn settles. Leaving the loop waits for
//! any turn still running so its reply is stored before the process exits.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;
use rustyline_async::SharedWriter;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use albayan_core::storage::kv_store::KvStore;
use albayan_core::turn::controller::{ChatController, TurnOutcome, TurnReport};
use albayan_types::error::TurnError;

use crate::cli::ask::LOADING_TEXT;
use crate::cli::session::{DELETE_CONFIRM_TEXT, EMPTY_HISTORY_TEXT, resolve_selector, short_id};
use crate::state::{AppController, AppState};

use super::banner::{SUGGESTED_QUESTIONS, welcome_text};
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::ChatRenderer;

type TurnResult = Result<TurnReport, TurnError>;

/// What the next line of input means.
enum Pending {
    /// A regular message or slash command.
    Input,
    /// A yes/no answer to "delete session `id`?".
    ConfirmDelete(String),
}

struct ChatLoop {
    controller: Arc<AppController>,
    renderer: ChatRenderer,
    model: String,
    out: SharedWriter,
    turns: mpsc::UnboundedSender<TurnResult>,
    tasks: Vec<JoinHandle<()>>,
}

/// Run one turn on its own task and report the result on `turns`.
fn spawn_turn<K: KvStore + 'static>(
    controller: Arc<ChatController<K>>,
    text: String,
    turns: mpsc::UnboundedSender<TurnResult>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = controller.submit(&text).await;
        let _ = turns.send(result);
    })
}

/// Wait for every spawned turn to finish, then collect the results they
/// reported that were not consumed yet.
async fn settle_turns(
    tasks: Vec<JoinHandle<()>>,
    finished: &mut mpsc::UnboundedReceiver<TurnResult>,
) -> Vec<TurnResult> {
    for task in tasks {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Chat turn task failed");
        }
    }

    let mut results = Vec::new();
    while let Ok(result) = finished.try_recv() {
        results.push(result);
    }
    results
}

/// Run the interactive chat loop, optionally reopening a stored session.
pub async fn run_chat_loop(state: &AppState, session: Option<&str>) -> Result<()> {
    if let Some(selector) = session {
        let sessions = state.controller.sessions();
        let id = resolve_selector(&sessions, selector)
            .with_context(|| format!("Session '{selector}' not found"))?;
        state.controller.select_session(&id)?;
    }

    let prompt = format!("  {} ", style("أنت >").green().bold());
    let (mut input, out) =
        ChatInput::new(prompt).map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;
    let (turns, mut finished) = mpsc::unbounded_channel();

    let mut chat = ChatLoop {
        controller: state.controller.clone(),
        renderer: ChatRenderer::new(None),
        model: state.config.model.clone(),
        out,
        turns,
        tasks: Vec::new(),
    };
    chat.print_current()?;

    let mut pending = Pending::Input;
    loop {
        tokio::select! {
            Some(result) = finished.recv() => chat.print_turn(result)?,
            event = input.read_line() => match event {
                InputEvent::Eof => break,
                InputEvent::Interrupted => {
                    if matches!(pending, Pending::ConfirmDelete(_)) {
                        pending = Pending::Input;
                        writeln!(chat.out, "  Cancelled.")?;
                    } else {
                        writeln!(chat.out, "  {}", style("Press Ctrl+D to exit, or keep chatting.").dim())?;
                    }
                }
                InputEvent::Message(text) => {
                    pending = match std::mem::replace(&mut pending, Pending::Input) {
                        Pending::ConfirmDelete(id) => {
                            chat.finish_delete(&id, &text).await?;
                            Pending::Input
                        }
                        Pending::Input => {
                            if text.is_empty() {
                                continue;
                            }
                            match commands::parse(&text) {
                                Some(ChatCommand::Exit) => break,
                                Some(ChatCommand::Clear) => {
                                    input.clear();
                                    Pending::Input
                                }
                                Some(cmd) => chat.run_command(cmd)?,
                                None => {
                                    chat.submit(text)?;
                                    Pending::Input
                                }
                            }
                        }
                    };
                }
            },
        }
    }

    chat.tasks.retain(|task| !task.is_finished());
    if chat.controller.is_loading() || !chat.tasks.is_empty() {
        writeln!(chat.out, "  {}", style(LOADING_TEXT).dim())?;
    }
    let tasks = std::mem::take(&mut chat.tasks);
    for result in settle_turns(tasks, &mut finished).await {
        chat.print_turn(result)?;
    }

    writeln!(chat.out, "\n  {}", style("Session ended.").dim())?;
    input.flush();
    Ok(())
}

impl ChatLoop {
    /// Start a turn in the background, unless one is already running.
    fn submit(&mut self, text: String) -> Result<()> {
        if self.controller.is_loading() {
            writeln!(
                self.out,
                "  {}",
                style("Please wait for the current answer before asking again.").yellow()
            )?;
            return Ok(());
        }

        writeln!(self.out, "  {}", style(LOADING_TEXT).dim())?;
        self.tasks.retain(|task| !task.is_finished());
        self.tasks
            .push(spawn_turn(self.controller.clone(), text, self.turns.clone()));
        Ok(())
    }

    fn run_command(&mut self, command: ChatCommand) -> Result<Pending> {
        match command {
            ChatCommand::Help => write!(self.out, "{}", commands::help_text())?,
            ChatCommand::New => {
                self.controller.new_chat();
                self.print_current()?;
            }
            ChatCommand::History => self.print_history()?,
            ChatCommand::Open(selector) => match self.resolve(&selector) {
                Some(id) => {
                    self.controller.select_session(&id)?;
                    self.print_current()?;
                }
                None => self.not_found(&selector)?,
            },
            ChatCommand::Delete(selector) => match self.resolve(&selector) {
                Some(id) => {
                    let title = self
                        .controller
                        .session(&id)
                        .map(|s| s.title)
                        .unwrap_or_default();
                    writeln!(
                        self.out,
                        "  {} '{}' {}",
                        DELETE_CONFIRM_TEXT,
                        style(title).red().bold(),
                        style("[y/N]").dim()
                    )?;
                    return Ok(Pending::ConfirmDelete(id));
                }
                None => self.not_found(&selector)?,
            },
            ChatCommand::Suggest(n) => {
                if let Some(question) = n.checked_sub(1).and_then(|i| SUGGESTED_QUESTIONS.get(i)) {
                    writeln!(self.out, "  {} {}", style("أنت >").green().bold(), question)?;
                    self.submit(question.to_string())?;
                }
            }
            ChatCommand::Unknown(message) => writeln!(
                self.out,
                "  {} {}. Type /help for available commands.",
                style("?").yellow().bold(),
                style(message).dim()
            )?,
            // Handled by the loop itself.
            ChatCommand::Exit | ChatCommand::Clear => {}
        }
        Ok(Pending::Input)
    }

    async fn finish_delete(&mut self, id: &str, answer: &str) -> Result<()> {
        let confirmed = matches!(answer.to_lowercase().as_str(), "y" | "yes" | "نعم");
        if !confirmed {
            writeln!(self.out, "  Cancelled.")?;
            return Ok(());
        }

        match self.controller.delete_session(id).await {
            Ok(removed) => writeln!(
                self.out,
                "  {} Session '{}' deleted.",
                style("x").red().bold(),
                removed.title
            )?,
            Err(e) => writeln!(self.out, "  {} {e}", style("!").red().bold())?,
        }
        Ok(())
    }

    fn print_turn(&mut self, result: TurnResult) -> Result<()> {
        let report = match result {
            Ok(report) => report,
            Err(TurnError::Busy) => {
                writeln!(
                    self.out,
                    "  {}",
                    style("Please wait for the current answer before asking again.").yellow()
                )?;
                return Ok(());
            }
            Err(TurnError::EmptyInput) => return Ok(()),
        };

        let message = match &report.outcome {
            TurnOutcome::Answered(msg) | TurnOutcome::Failed(msg) => msg,
            TurnOutcome::Discarded => {
                writeln!(
                    self.out,
                    "  {}",
                    style("The conversation was deleted; its answer was dropped.").dim()
                )?;
                return Ok(());
            }
        };

        let current = self.controller.current_session_id();
        if current.as_deref() != Some(report.session_id.as_str()) {
            let title = self
                .controller
                .session(&report.session_id)
                .map(|s| s.title)
                .unwrap_or_default();
            writeln!(
                self.out,
                "  {}",
                style(format!("Answer saved to '{title}' ({})", short_id(&report.session_id))).dim()
            )?;
            return Ok(());
        }

        writeln!(self.out)?;
        write!(self.out, "{}", self.renderer.render_message_safely(message))?;
        writeln!(self.out)?;
        Ok(())
    }

    /// Print the current conversation, or the welcome screen when none.
    fn print_current(&mut self) -> Result<()> {
        let messages = self.controller.current_messages();
        if messages.is_empty() {
            write!(self.out, "{}", welcome_text(&self.model))?;
            return Ok(());
        }

        if let Some(session) = self
            .controller
            .current_session_id()
            .and_then(|id| self.controller.session(&id))
        {
            writeln!(self.out, "\n  {}\n", style(&session.title).cyan().bold())?;
        }
        for message in &messages {
            write!(self.out, "{}", self.renderer.render_message_safely(message))?;
            writeln!(self.out)?;
        }
        Ok(())
    }

    /// The history panel: numbered sessions, current one marked.
    fn print_history(&mut self) -> Result<()> {
        let sessions = self.controller.sessions();
        if sessions.is_empty() {
            writeln!(self.out, "  {}", style(EMPTY_HISTORY_TEXT).dim())?;
            return Ok(());
        }

        let current = self.controller.current_session_id();
        writeln!(self.out)?;
        for (i, session) in sessions.iter().enumerate() {
            let marker = if current.as_deref() == Some(session.id.as_str()) {
                style("*").green().bold().to_string()
            } else {
                " ".to_string()
            };
            writeln!(
                self.out,
                "  {marker} {} {} {}",
                style(format!("{:>2}.", i + 1)).dim(),
                session.title,
                style(short_id(&session.id)).dim()
            )?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn resolve(&self, selector: &str) -> Option<String> {
        resolve_selector(&self.controller.sessions(), selector)
    }

    fn not_found(&mut self, selector: &str) -> Result<()> {
        writeln!(
            self.out,
            "  {} Session '{selector}' not found. Use /history to list sessions.",
            style("!").yellow().bold()
        )?;
        Ok(())
    }
}
