//! Structure of a bot reply: list items, code blocks, and bold spans.
//!
//! Every line of the reply becomes one [`DisplayItem`] of a single list
//! container. Lines starting with `* ` are list items, fenced lines are code
//! blocks, and anything else is text. `**...**` spans are bold wherever they
//! are recognized.

use crate::core::config::resolve::DEFAULT_CODE_LANGUAGE;

const FENCE: &str = "```";
const LIST_MARKER: &str = "* ";
const BOLD_MARKER: &str = "**";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Plain(String),
    Bold(String),
}

impl Inline {
    pub fn text(&self) -> &str {
        match self {
            Inline::Plain(text) | Inline::Bold(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub code: String,
    /// Highlighting language. Fixed per formatter, never read from the fence.
    pub language: String,
    /// Opened and closed on the same line.
    pub single_line: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayItem {
    ListItem(Vec<Inline>),
    Code(CodeBlock),
    Text(Vec<Inline>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattedMessage {
    pub items: Vec<DisplayItem>,
}

impl FormattedMessage {
    /// The most recent code block, used by the copy shortcut.
    pub fn last_code_block(&self) -> Option<&CodeBlock> {
        self.items.iter().rev().find_map(|item| match item {
            DisplayItem::Code(block) => Some(block),
            _ => None,
        })
    }

    /// Write the structure back as marked-up text.
    pub fn source_text(&self) -> String {
        let lines: Vec<String> = self
            .items
            .iter()
            .map(|item| match item {
                DisplayItem::ListItem(inlines) => {
                    format!("{LIST_MARKER}{}", inline_source(inlines))
                }
                DisplayItem::Text(inlines) => inline_source(inlines),
                DisplayItem::Code(block) if block.single_line => {
                    format!("{FENCE}{}{FENCE}", block.code)
                }
                DisplayItem::Code(block) => format!("{FENCE}\n{}\n{FENCE}", block.code),
            })
            .collect();
        lines.join("\n")
    }
}

fn inline_source(inlines: &[Inline]) -> String {
    inlines
        .iter()
        .map(|inline| match inline {
            Inline::Plain(text) => text.clone(),
            Inline::Bold(text) => format!("{BOLD_MARKER}{text}{BOLD_MARKER}"),
        })
        .collect()
}

pub fn format_message(text: &str) -> FormattedMessage {
    format_message_with_language(text, DEFAULT_CODE_LANGUAGE)
}

pub fn format_message_with_language(text: &str, language: &str) -> FormattedMessage {
    let mut items = Vec::new();
    let mut lines = text.split('\n');

    while let Some(line) = lines.next() {
        if let Some(rest) = line.strip_prefix(LIST_MARKER) {
            items.push(DisplayItem::ListItem(parse_inlines(rest)));
        } else if is_single_line_fence(line) {
            items.push(DisplayItem::Code(CodeBlock {
                code: line[FENCE.len()..line.len() - FENCE.len()].to_string(),
                language: language.to_string(),
                single_line: true,
            }));
        } else if line.starts_with(FENCE) {
            // Runs to the next fence line, or to the end of a reply that is
            // still streaming.
            let mut body = Vec::new();
            for inner in lines.by_ref() {
                if inner.starts_with(FENCE) {
                    break;
                }
                body.push(inner);
            }
            items.push(DisplayItem::Code(CodeBlock {
                code: body.join("\n"),
                language: language.to_string(),
                single_line: false,
            }));
        } else {
            items.push(DisplayItem::Text(parse_inlines(line)));
        }
    }

    FormattedMessage { items }
}

/// A fence opened and closed on the same line. A bare fence marker is an
/// opener, not an empty block.
fn is_single_line_fence(line: &str) -> bool {
    line.len() >= 2 * FENCE.len() && line.starts_with(FENCE) && line.ends_with(FENCE)
}

/// Split a line into plain and bold spans. Each `**` pairs with the nearest
/// following `**`; an unpaired marker stays plain text.
pub fn parse_inlines(line: &str) -> Vec<Inline> {
    let mut inlines = Vec::new();
    let mut plain = String::new();
    let mut rest = line;

    while let Some(open) = rest.find(BOLD_MARKER) {
        let after_open = &rest[open + BOLD_MARKER.len()..];
        let Some(close) = after_open.find(BOLD_MARKER) else {
            break;
        };
        plain.push_str(&rest[..open]);
        if !plain.is_empty() {
            inlines.push(Inline::Plain(std::mem::take(&mut plain)));
        }
        inlines.push(Inline::Bold(after_open[..close].to_string()));
        rest = &after_open[close + BOLD_MARKER.len()..];
    }

    plain.push_str(rest);
    if !plain.is_empty() {
        inlines.push(Inline::Plain(plain));
    }
    inlines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> Inline {
        Inline::Plain(text.to_string())
    }

    fn bold(text: &str) -> Inline {
        Inline::Bold(text.to_string())
    }

    #[test]
    fn list_item_with_bold_span() {
        let message = format_message("* **bold** item");

        assert_eq!(
            message.items,
            vec![DisplayItem::ListItem(vec![bold("bold"), plain(" item")])]
        );
        assert_eq!(message.source_text(), "* **bold** item");
    }

    #[test]
    fn bold_spans_are_non_greedy() {
        assert_eq!(
            parse_inlines("**a** and **b**"),
            vec![bold("a"), plain(" and "), bold("b")]
        );
        assert_eq!(parse_inlines("****"), vec![bold("")]);
        assert_eq!(parse_inlines("***a**"), vec![bold("*a")]);
    }

    #[test]
    fn unpaired_marker_stays_plain() {
        assert_eq!(parse_inlines("2 ** 3"), vec![plain("2 ** 3")]);
        assert_eq!(
            parse_inlines("**x** then **y"),
            vec![bold("x"), plain(" then **y")]
        );
    }

    #[test]
    fn single_line_fence_is_code_with_fixed_language() {
        let message = format_message("```int x = 1;```");

        assert_eq!(
            message.items,
            vec![DisplayItem::Code(CodeBlock {
                code: "int x = 1;".to_string(),
                language: "cpp".to_string(),
                single_line: true,
            })]
        );
    }

    #[test]
    fn multi_line_fence_collects_body_and_ignores_info_string() {
        let message = format_message_with_language(
            "Here:\n```python\nfn main() {}\nlet x = 1;\n```\nDone",
            "rust",
        );

        assert_eq!(message.items.len(), 3);
        assert_eq!(message.items[0], DisplayItem::Text(vec![plain("Here:")]));
        assert_eq!(
            message.items[1],
            DisplayItem::Code(CodeBlock {
                code: "fn main() {}\nlet x = 1;".to_string(),
                language: "rust".to_string(),
                single_line: false,
            })
        );
        assert_eq!(message.items[2], DisplayItem::Text(vec![plain("Done")]));
    }

    #[test]
    fn unclosed_fence_runs_to_end_of_text() {
        let message = format_message("```\npartial code");
        assert_eq!(
            message.last_code_block().map(|block| block.code.as_str()),
            Some("partial code")
        );
    }

    #[test]
    fn other_lines_are_text_items_in_one_container() {
        let message = format_message("plain **b**\n\n*not a list*");

        assert_eq!(
            message.items,
            vec![
                DisplayItem::Text(vec![plain("plain "), bold("b")]),
                DisplayItem::Text(vec![]),
                DisplayItem::Text(vec![plain("*not a list*")]),
            ]
        );
    }

    #[test]
    fn list_marker_wins_over_fence() {
        let message = format_message("* ```x```");
        assert_eq!(
            message.items,
            vec![DisplayItem::ListItem(vec![plain("```x```")])]
        );
    }

    #[test]
    fn source_text_reproduces_structure() {
        let text = "* one\nsee **this**\n```a```\n```\nb\n```";
        assert_eq!(format_message(text).source_text(), text);
    }
}
