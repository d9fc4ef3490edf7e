//! Width-aware line wrapping for the conversation pane.
//!
//! The pane renders pre-wrapped lines without ratatui's own wrapping, so the
//! number of lines returned here is exactly the number of rows on screen and
//! scroll offsets can be clamped against it.

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthChar;

/// One visual row under construction.
#[derive(Default)]
struct Row {
    spans: Vec<Span<'static>>,
    width: usize,
}

impl Row {
    fn push(&mut self, ch: char, style: Style) {
        self.width += char_width(ch);
        if let Some(last) = self.spans.last_mut() {
            if last.style == style {
                last.content.to_mut().push(ch);
                return;
            }
        }
        self.spans.push(Span::styled(ch.to_string(), style));
    }

    fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    fn take(&mut self) -> Line<'static> {
        self.width = 0;
        Line::from(std::mem::take(&mut self.spans))
    }
}

fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

/// Wrap `lines` to `width` columns at word boundaries, keeping span styles.
///
/// Words longer than the width are broken across rows. A single space that
/// would overflow a row is dropped instead of starting the next one.
pub fn prewrap_lines(lines: &[Line], width: u16) -> Vec<Line<'static>> {
    let width = usize::from(width);
    let mut out = Vec::with_capacity(lines.len());

    for line in lines {
        let chars: Vec<(char, Style)> = line
            .spans
            .iter()
            .flat_map(|span| {
                let style = line.style.patch(span.style);
                span.content.chars().map(move |ch| (ch, style))
            })
            .collect();

        if width == 0 || chars.is_empty() {
            let spans: Vec<Span<'static>> = line
                .spans
                .iter()
                .map(|span| Span::styled(span.content.to_string(), line.style.patch(span.style)))
                .collect();
            out.push(Line::from(spans));
            continue;
        }

        let mut row = Row::default();
        let mut emitted = false;
        let mut i = 0;
        while i < chars.len() {
            let (ch, style) = chars[i];
            if ch == ' ' {
                if row.width < width {
                    row.push(ch, style);
                } else {
                    out.push(row.take());
                    emitted = true;
                }
                i += 1;
                continue;
            }

            let end = chars[i..]
                .iter()
                .position(|(c, _)| *c == ' ')
                .map_or(chars.len(), |offset| i + offset);
            let word = &chars[i..end];
            let word_width: usize = word.iter().map(|(c, _)| char_width(*c)).sum();

            if !row.is_empty() && row.width + word_width > width {
                out.push(row.take());
                emitted = true;
            }
            for &(c, s) in word {
                if !row.is_empty() && row.width + char_width(c) > width {
                    out.push(row.take());
                    emitted = true;
                }
                row.push(c, s);
            }
            i = end;
        }

        if !row.is_empty() || !emitted {
            out.push(row.take());
        }
    }

    out
}

/// Largest useful scroll offset for `rows` visual rows in a pane of `height`.
pub fn max_scroll_offset(rows: usize, height: u16) -> u16 {
    u16::try_from(rows)
        .unwrap_or(u16::MAX)
        .saturating_sub(height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::{Color, Modifier};

    fn texts(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn short_lines_are_unchanged() {
        let lines = vec![Line::from("You: hi"), Line::from(""), Line::from("Gemini: 4")];
        assert_eq!(texts(&prewrap_lines(&lines, 40)), vec!["You: hi", "", "Gemini: 4"]);
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let lines = vec![Line::from("alpha beta gamma delta")];
        assert_eq!(
            texts(&prewrap_lines(&lines, 11)),
            vec!["alpha beta ", "gamma delta"]
        );
    }

    #[test]
    fn overlong_word_is_broken() {
        let lines = vec![Line::from("abcdefghij")];
        assert_eq!(texts(&prewrap_lines(&lines, 4)), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn styles_survive_wrapping() {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let lines = vec![Line::from(vec![
            Span::raw("plain "),
            Span::styled("bold words", bold),
        ])];

        let wrapped = prewrap_lines(&lines, 8);

        assert_eq!(texts(&wrapped), vec!["plain ", "bold ", "words"]);
        assert_eq!(wrapped[1].spans[0].style, bold);
        assert_eq!(wrapped[2].spans[0].style, bold);
    }

    #[test]
    fn line_style_is_folded_into_spans() {
        let lines = vec![Line::from("typing").style(Style::default().fg(Color::Gray))];
        let wrapped = prewrap_lines(&lines, 3);
        assert_eq!(wrapped[0].spans[0].style.fg, Some(Color::Gray));
    }

    #[test]
    fn wide_characters_count_two_columns() {
        let lines = vec![Line::from("日本語")];
        assert_eq!(texts(&prewrap_lines(&lines, 4)), vec!["日本", "語"]);
    }

    #[test]
    fn max_offset_counts_rows_past_the_pane() {
        assert_eq!(max_scroll_offset(5, 10), 0);
        assert_eq!(max_scroll_offset(25, 10), 15);
    }
}
