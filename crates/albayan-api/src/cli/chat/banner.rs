//! Welcome screen for an empty conversation.
//!
//! Shows the assistant's name, a short description, and the suggested
//! starter questions (sent with `/suggest <n>`).

use console::style;

/// Name shown in the header.
pub const APP_NAME: &str = "البيان";

pub const EMPTY_STATE_TEXT: &str = "مساعدك الإسلامي الذكي للإجابة على الأسئلة الشرعية. أستمد معلوماتي من المصادر الموثوقة مثل إسلام ويب وابن باز.";

/// Starter questions offered on the welcome screen.
pub const SUGGESTED_QUESTIONS: [&str; 4] = [
    "ما هو فضل صلاة الضحى؟",
    "حكم قصر الصلاة للمسافر",
    "أذكار الصباح والمساء الصحيحة",
    "تفسير سورة الإخلاص",
];

/// The welcome screen, including the numbered suggestions.
pub fn welcome_text(model: &str) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!("  {}\n", style(APP_NAME).cyan().bold()));
    out.push_str(&format!("  {}\n", style(EMPTY_STATE_TEXT).dim()));
    out.push('\n');
    for (i, question) in SUGGESTED_QUESTIONS.iter().enumerate() {
        out.push_str(&format!("  {} {}\n", style(format!("[{}]", i + 1)).yellow(), question));
    }
    out.push('\n');
    out.push_str(&format!("  {}  {}\n", style("Model:").bold(), style(model).dim()));
    out.push_str(&format!(
        "  {}\n",
        style("Type /help for commands, /suggest <n> for a suggestion, Ctrl+D to exit").dim()
    ));
    out.push_str(&format!("  {}\n\n", style("---").dim()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_lists_all_suggestions() {
        let text = console::strip_ansi_codes(&welcome_text("gemini-2.5-flash")).into_owned();
        for (i, q) in SUGGESTED_QUESTIONS.iter().enumerate() {
            assert!(text.contains(&format!("[{}] {q}", i + 1)));
        }
        assert!(text.contains(EMPTY_STATE_TEXT));
    }
}
