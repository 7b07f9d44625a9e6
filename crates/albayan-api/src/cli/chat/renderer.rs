//! Terminal markdown rendering with syntax-highlighted code blocks.
//!
//! `ChatRenderer` combines `termimad` for prose and `syntect` for code block
//! syntax highlighting. Model answers are rendered as formatted markdown
//! followed by their numbered sources.

use std::panic::{AssertUnwindSafe, catch_unwind};

use albayan_types::chat::{Message, MessageRole, Source};
use console::style;
use crossterm::style::Color;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::as_24_bit_terminal_escaped;
use termimad::MadSkin;

use crate::cli::UNEXPECTED_ERROR_TEXT;

/// Heading printed above the citations of an answer.
pub const SOURCES_HEADER: &str = "المصادر والمراجع:";

/// Label shown before the user's messages.
pub const USER_LABEL: &str = "أنت";

/// Label shown before the assistant's messages.
pub const ASSISTANT_LABEL: &str = "البيان";

/// Terminal markdown renderer with syntax highlighting.
pub struct ChatRenderer {
    skin: MadSkin,
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl ChatRenderer {
    /// Create a new renderer with an optional accent color for headers and bold text.
    pub fn new(accent_color: Option<Color>) -> Self {
        let mut skin = MadSkin::default_dark();

        if let Some(color) = accent_color {
            let tc = Self::crossterm_to_termimad(color);
            skin.bold.set_fg(tc);
            skin.headers[0].set_fg(tc);
            skin.headers[1].set_fg(tc);
        }

        skin.inline_code
            .set_fg(termimad::crossterm::style::Color::Yellow);

        Self {
            skin,
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    /// Render a complete markdown text with syntax-highlighted code blocks.
    ///
    /// Code fences with a language tag are highlighted via syntect; everything
    /// else is rendered through termimad.
    pub fn render_markdown(&self, markdown: &str) -> String {
        let mut output = String::new();
        let mut in_code_block = false;
        let mut code_lang = String::new();
        let mut code_buf = String::new();

        for line in markdown.lines() {
            if line.starts_with("```") && !in_code_block {
                in_code_block = true;
                code_lang = line.trim_start_matches('`').trim().to_string();
                code_buf.clear();
            } else if line.starts_with("```") && in_code_block {
                in_code_block = false;
                let highlighted = self.highlight_code(&code_buf, &code_lang);
                output.push_str(&highlighted);
                output.push('\n');
            } else if in_code_block {
                code_buf.push_str(line);
                code_buf.push('\n');
            } else {
                let rendered = self.skin.term_text(line);
                output.push_str(&format!("{rendered}"));
            }
        }

        // Unclosed code block
        if in_code_block && !code_buf.is_empty() {
            let highlighted = self.highlight_code(&code_buf, &code_lang);
            output.push_str(&highlighted);
        }

        output
    }

    /// Render one message of the transcript, label included.
    ///
    /// Error placeholders are shown in red without markdown processing.
    pub fn render_message(&self, message: &Message) -> String {
        match message.role {
            MessageRole::User => format!(
                "  {} {}\n",
                style(USER_LABEL).green().bold(),
                message.text
            ),
            MessageRole::Model if message.is_error => format!(
                "  {} {}\n",
                style(ASSISTANT_LABEL).cyan().bold(),
                style(&message.text).red()
            ),
            MessageRole::Model => {
                let mut output = format!("  {}\n", style(ASSISTANT_LABEL).cyan().bold());
                output.push_str(&self.render_markdown(&message.text));
                output.push_str(&render_sources(message.sources()));
                output
            }
        }
    }

    /// [`render_message`](Self::render_message) behind a panic boundary: a
    /// rendering failure degrades to the generic error text.
    pub fn render_message_safely(&self, message: &Message) -> String {
        catch_unwind(AssertUnwindSafe(|| self.render_message(message))).unwrap_or_else(|_| {
            tracing::error!(message_id = %message.id, "Rendering panicked");
            format!("  {}\n", style(UNEXPECTED_ERROR_TEXT).red())
        })
    }

    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let syntax = if lang.is_empty() {
            self.syntax_set.find_syntax_plain_text()
        } else {
            self.syntax_set
                .find_syntax_by_token(lang)
                .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
        };

        let mut output = String::new();
        output.push_str(&format!("  {}\n", style(format!("--- {lang} ---")).dim()));

        let Some(theme) = self.theme_set.themes.get("base16-ocean.dark") else {
            for line in code.lines() {
                output.push_str(&format!("  {line}\n"));
            }
            return output;
        };
        let mut h = HighlightLines::new(syntax, theme);

        for line in code.lines() {
            let ranges: Vec<(Style, &str)> = h
                .highlight_line(line, &self.syntax_set)
                .unwrap_or_default();
            let escaped = as_24_bit_terminal_escaped(&ranges[..], false);
            output.push_str(&format!("  {escaped}\x1b[0m\n"));
        }

        output
    }

    fn crossterm_to_termimad(color: Color) -> termimad::crossterm::style::Color {
        match color {
            Color::Cyan => termimad::crossterm::style::Color::Cyan,
            Color::Green => termimad::crossterm::style::Color::Green,
            Color::Yellow => termimad::crossterm::style::Color::Yellow,
            Color::Blue => termimad::crossterm::style::Color::Blue,
            Color::Rgb { r, g, b } => termimad::crossterm::style::Color::Rgb { r, g, b },
            _ => termimad::crossterm::style::Color::Cyan,
        }
    }
}

/// Numbered citation list, empty string when there are none.
pub fn render_sources(sources: &[Source]) -> String {
    if sources.is_empty() {
        return String::new();
    }

    let mut output = format!("\n  {}\n", style(SOURCES_HEADER).bold());
    for (i, source) in sources.iter().enumerate() {
        output.push_str(&format!(
            "  {}. {} {}\n",
            i + 1,
            style(&source.title).cyan(),
            style(format!("<{}>", source.uri)).dim()
        ));
    }
    output
}
