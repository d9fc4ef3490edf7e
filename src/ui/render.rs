//! Conversation entries as terminal lines.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use super::format::{format_message_with_language, DisplayItem, Inline};
use crate::core::message::{ConversationEntry, Role};
use crate::utils::syntax::highlight_code_block;

pub const TYPING_INDICATOR: &str = "Gemini is typing...";
pub const COPY_HINT: &str = "[Ctrl+Y copies the latest code block]";

const WELCOME: [&str; 3] = [
    "Welcome to Gemini AI Chat!",
    "How can I help you today?",
    "Please ask me anything to get started.",
];

pub fn build_display_lines(
    entries: &[ConversationEntry],
    loading: bool,
    code_language: &str,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if entries.is_empty() {
        lines.push(Line::from(Span::styled(
            WELCOME[0],
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for text in &WELCOME[1..] {
            lines.push(Line::from(*text));
        }
        lines.push(Line::from(""));
    }

    for entry in entries {
        match entry.role {
            Role::User => push_user_lines(&mut lines, &entry.content),
            Role::Bot => push_bot_lines(&mut lines, &entry.content, code_language),
        }
        lines.push(Line::from(""));
    }

    if loading {
        lines.push(Line::from(Span::styled(
            TYPING_INDICATOR,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn push_user_lines(lines: &mut Vec<Line<'static>>, content: &str) {
    let style = Style::default().fg(Color::Cyan);
    for (idx, text) in content.split('\n').enumerate() {
        let mut spans = Vec::with_capacity(2);
        if idx == 0 {
            spans.push(Span::styled("You: ", style.add_modifier(Modifier::BOLD)));
        }
        spans.push(Span::styled(text.to_string(), style));
        lines.push(Line::from(spans));
    }
}

fn push_bot_lines(lines: &mut Vec<Line<'static>>, content: &str, code_language: &str) {
    lines.push(Line::from(Span::styled(
        "Gemini:",
        Style::default().add_modifier(Modifier::BOLD),
    )));

    for item in format_message_with_language(content, code_language).items {
        match item {
            DisplayItem::ListItem(inlines) => {
                let mut spans = vec![Span::raw("  • ")];
                spans.extend(inline_spans(inlines));
                lines.push(Line::from(spans));
            }
            DisplayItem::Text(inlines) => lines.push(Line::from(inline_spans(inlines))),
            DisplayItem::Code(block) => {
                lines.extend(highlight_code_block(&block.language, &block.code));
                lines.push(Line::from(Span::styled(
                    COPY_HINT,
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
    }
}

fn inline_spans(inlines: Vec<Inline>) -> Vec<Span<'static>> {
    inlines
        .into_iter()
        .map(|inline| match inline {
            Inline::Plain(text) => Span::raw(text),
            Inline::Bold(text) => {
                Span::styled(text, Style::default().add_modifier(Modifier::BOLD))
            }
        })
        .collect()
}
