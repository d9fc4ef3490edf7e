use ratatui::style::{Color as TuiColor, Style};
use ratatui::text::{Line, Span};
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, OnceLock};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

pub const CODE_THEME: &str = "Solarized (light)";
const FALLBACK_THEMES: [&str; 2] = ["InspiredGitHub", "base16-ocean.light"];
const CACHE_CAPACITY: usize = 64;

// Bounded FIFO of highlighted blocks keyed by (language, code) hash.
struct BlockCache {
    map: HashMap<u64, Vec<Line<'static>>>,
    order: VecDeque<u64>,
}

impl BlockCache {
    fn get(&self, key: u64) -> Option<Vec<Line<'static>>> {
        self.map.get(&key).cloned()
    }

    fn put(&mut self, key: u64, lines: Vec<Line<'static>>) {
        if self.map.insert(key, lines).is_none() {
            self.order.push_back(key);
        }
        while self.map.len() > CACHE_CAPACITY {
            match self.order.pop_front() {
                Some(old) => {
                    self.map.remove(&old);
                }
                None => break,
            }
        }
    }
}

static BLOCK_CACHE: Mutex<Option<BlockCache>> = Mutex::new(None);

fn block_key(language: &str, code: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    language.hash(&mut hasher);
    code.hash(&mut hasher);
    hasher.finish()
}

fn normalize_lang_hint(s: &str) -> String {
    let t = s.trim().to_ascii_lowercase();
    match t.as_str() {
        "py" | "python" => "python".into(),
        "bash" | "sh" | "zsh" | "shell" => "bash".into(),
        "js" | "javascript" | "jsx" => "javascript".into(),
        "rust" | "rs" => "rust".into(),
        "c" | "h" => "c".into(),
        "cpp" | "c++" | "cc" | "cxx" | "hpp" | "hxx" => "cpp".into(),
        "yaml" | "yml" => "yaml".into(),
        other => other.into(),
    }
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme_set() -> &'static ThemeSet {
    static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

/// Highlight a code block for the terminal.
///
/// Falls back to unstyled lines when the theme or syntax cannot be used.
pub fn highlight_code_block(language: &str, code: &str) -> Vec<Line<'static>> {
    let language = normalize_lang_hint(language);
    let key = block_key(&language, code);

    if let Ok(guard) = BLOCK_CACHE.lock() {
        if let Some(lines) = guard.as_ref().and_then(|cache| cache.get(key)) {
            return lines;
        }
    }

    let lines = match try_highlight(&language, code) {
        Some(lines) => lines,
        None => plain_lines(code),
    };

    if let Ok(mut guard) = BLOCK_CACHE.lock() {
        guard
            .get_or_insert_with(|| BlockCache {
                map: HashMap::new(),
                order: VecDeque::new(),
            })
            .put(key, lines.clone());
    }
    lines
}

fn try_highlight(language: &str, code: &str) -> Option<Vec<Line<'static>>> {
    let ps = syntax_set();
    let ts = theme_set();
    let theme = std::iter::once(CODE_THEME)
        .chain(FALLBACK_THEMES)
        .find_map(|name| ts.themes.get(name))?;
    let background = theme
        .settings
        .background
        .map(|c| TuiColor::Rgb(c.r, c.g, c.b));

    let syntax = ps
        .find_syntax_by_token(language)
        .unwrap_or_else(|| ps.find_syntax_plain_text());
    let mut highlighter = HighlightLines::new(syntax, theme);

    let mut out = Vec::new();
    for line in LinesWithEndings::from(code) {
        let ranges = highlighter.highlight_line(line, ps).ok()?;
        let spans: Vec<Span<'static>> = ranges
            .into_iter()
            .map(|(style, text)| {
                let text = text.strip_suffix('\n').unwrap_or(text);
                let mut st = Style::default().fg(TuiColor::Rgb(
                    style.foreground.r,
                    style.foreground.g,
                    style.foreground.b,
                ));
                if let Some(bg) = background {
                    st = st.bg(bg);
                }
                Span::styled(text.to_string(), st)
            })
            .collect();
        out.push(Line::from(spans));
    }
    if out.is_empty() {
        out.push(Line::from(""));
    }
    Some(out)
}

fn plain_lines(code: &str) -> Vec<Line<'static>> {
    code.split('\n')
        .map(|line| Line::from(line.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn normalize_lang_hint_maps_common_aliases() {
        assert_eq!(normalize_lang_hint("py"), "python");
        assert_eq!(normalize_lang_hint("C++"), "cpp");
        assert_eq!(normalize_lang_hint("hpp"), "cpp");
        assert_eq!(normalize_lang_hint("rs"), "rust");
        assert_eq!(normalize_lang_hint(" YML "), "yaml");
    }

    #[test]
    fn solarized_light_is_bundled() {
        assert!(theme_set().themes.contains_key(CODE_THEME));
    }

    #[test]
    fn highlighting_preserves_text_and_colors_it() {
        let lines = highlight_code_block("cpp", "int x = 1;\nreturn x;");

        assert_eq!(lines.len(), 2);
        assert_eq!(line_text(&lines[0]), "int x = 1;");
        assert_eq!(line_text(&lines[1]), "return x;");
        assert!(lines[0].spans.iter().all(|span| span.style.fg.is_some()));
    }

    #[test]
    fn unknown_language_still_renders() {
        let lines = highlight_code_block("not-a-language", "plain");
        assert_eq!(line_text(&lines[0]), "plain");
    }

    #[test]
    fn empty_block_renders_one_blank_line() {
        let lines = highlight_code_block("cpp", "");
        assert_eq!(lines.len(), 1);
    }
}
