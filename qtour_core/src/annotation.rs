//! Turns annotation text into the bullet list a popup renders.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static STRONG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("strong-emphasis pattern compiles"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "style", content = "text", rename_all = "snake_case")]
pub enum Span {
    Plain(String),
    Strong(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bullet {
    pub spans: Vec<Span>,
}

impl Bullet {
    pub fn plain_text(&self) -> String {
        self.spans
            .iter()
            .map(|span| match span {
                Span::Plain(text) | Span::Strong(text) => text.as_str(),
            })
            .collect()
    }

    fn parse(line: &str) -> Self {
        let line = line.replacen("• ", "", 1);
        let mut spans = Vec::new();
        let mut cursor = 0;
        for captures in STRONG.captures_iter(&line) {
            let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            if whole.start() > cursor {
                spans.push(Span::Plain(line[cursor..whole.start()].to_string()));
            }
            spans.push(Span::Strong(inner.as_str().to_string()));
            cursor = whole.end();
        }
        if cursor < line.len() {
            spans.push(Span::Plain(line[cursor..].to_string()));
        }
        Bullet { spans }
    }
}

/// One bullet per line. Literal `\n` escapes count as line breaks, a
/// leading `• ` is dropped, and `**text**` becomes a strong span.
pub fn bullets(text: &str) -> Vec<Bullet> {
    text.replace("\\n", "\n")
        .split('\n')
        .map(Bullet::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_real_and_escaped_newlines() {
        let parsed = bullets("first\nsecond\\nthird");
        let texts: Vec<String> = parsed.iter().map(Bullet::plain_text).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn strips_bullet_glyph_and_marks_strong_runs() {
        let parsed = bullets("• **Qubits** sit at **15 mK** inside the fridge");
        assert_eq!(
            parsed[0].spans,
            vec![
                Span::Strong("Qubits".to_string()),
                Span::Plain(" sit at ".to_string()),
                Span::Strong("15 mK".to_string()),
                Span::Plain(" inside the fridge".to_string()),
            ]
        );
    }

    #[test]
    fn single_line_without_markup_is_one_plain_span() {
        let parsed = bullets("Here's how qubits are arranged...");
        assert_eq!(parsed.len(), 1);
        assert_eq!(
            parsed[0].spans,
            vec![Span::Plain("Here's how qubits are arranged...".to_string())]
        );
    }
}
