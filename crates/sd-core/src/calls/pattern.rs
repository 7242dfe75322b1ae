//! Call-name patterns such as `square thru <N>` or `<anyone> run`.

use std::fmt;

use crate::designator::Designator;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternItem {
    Word(String),
    Number,
    Anyone,
}

/// Values bound to a pattern's placeholders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Arguments {
    pub number: Option<i64>,
    pub designator: Option<Designator>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamePattern {
    items: Vec<PatternItem>,
}

/// Parses a number written as digits (possibly signed) or as a word.
/// Digit strings too long for an `i64` saturate, so they still read as a
/// number and fail the range check instead of the name lookup.
pub fn parse_number(token: &str) -> Option<i64> {
    const WORDS: [&str; 9] = [
        "zero", "one", "two", "three", "four", "five", "six", "seven", "eight",
    ];
    if let Some(n) = WORDS.iter().position(|w| *w == token) {
        return Some(n as i64);
    }
    let negative = token.starts_with('-');
    let digits = token.strip_prefix(['-', '+']).unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(token.parse().unwrap_or(if negative { i64::MIN } else { i64::MAX }))
}

/// Lowercases and splits on whitespace.
pub fn normalize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| w.to_ascii_lowercase())
        .collect()
}

impl NamePattern {
    pub fn parse(name: &str) -> NamePattern {
        let items = normalize(name)
            .into_iter()
            .map(|w| match w.as_str() {
                "<n>" => PatternItem::Number,
                "<anyone>" => PatternItem::Anyone,
                _ => PatternItem::Word(w),
            })
            .collect();
        NamePattern { items }
    }

    pub fn items(&self) -> &[PatternItem] {
        &self.items
    }

    pub fn has_number(&self) -> bool {
        self.items.contains(&PatternItem::Number)
    }

    pub fn has_anyone(&self) -> bool {
        self.items.contains(&PatternItem::Anyone)
    }

    fn bind(item: &PatternItem, token: &str, args: &mut Arguments) -> bool {
        match item {
            PatternItem::Word(w) => w == token,
            PatternItem::Number => match parse_number(token) {
                Some(n) => {
                    args.number = Some(n);
                    true
                }
                None => false,
            },
            PatternItem::Anyone => match Designator::from_word(token) {
                Some(d) => {
                    args.designator = Some(d);
                    true
                }
                None => false,
            },
        }
    }

    /// Exact match. When `default_number` is given, a trailing `<N>` may be
    /// left out and takes that value.
    pub fn matches(&self, tokens: &[String], default_number: Option<i64>) -> Option<Arguments> {
        let mut args = Arguments::default();
        let items = match (self.items.last(), default_number) {
            (Some(PatternItem::Number), Some(n)) if tokens.len() + 1 == self.items.len() => {
                args.number = Some(n);
                &self.items[..self.items.len() - 1]
            }
            _ => &self.items[..],
        };
        if items.len() != tokens.len() {
            return None;
        }
        for (item, token) in items.iter().zip(tokens) {
            if !Self::bind(item, token, &mut args) {
                return None;
            }
        }
        Some(args)
    }

    /// Word-prefix completion: every token but the last matches its item,
    /// the last is a prefix of a literal word, and everything after it is
    /// literal (or a trailing `<N>` with a default).
    pub fn completes(&self, tokens: &[String], default_number: Option<i64>) -> Option<Arguments> {
        let (last, head) = tokens.split_last()?;
        if tokens.len() > self.items.len() {
            return None;
        }
        let mut args = Arguments::default();
        for (item, token) in self.items.iter().zip(head) {
            if !Self::bind(item, token, &mut args) {
                return None;
            }
        }
        match &self.items[head.len()] {
            PatternItem::Word(w) if w.starts_with(last.as_str()) => {}
            _ => return None,
        }
        for item in &self.items[tokens.len()..] {
            match item {
                PatternItem::Word(_) => {}
                PatternItem::Number => args.number = Some(default_number?),
                PatternItem::Anyone => return None,
            }
        }
        // Whole words all the way is an exact match, not a completion.
        if self.items.len() == tokens.len()
            && self.items.last() == Some(&PatternItem::Word(last.clone()))
        {
            return None;
        }
        Some(args)
    }

    /// The name with placeholders filled in.
    pub fn render(&self, args: &Arguments) -> String {
        self.items
            .iter()
            .map(|item| match item {
                PatternItem::Word(w) => w.clone(),
                PatternItem::Number => args
                    .number
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "<N>".to_string()),
                PatternItem::Anyone => args
                    .designator
                    .map(|d| d.name().to_string())
                    .unwrap_or_else(|| "<anyone>".to_string()),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&Arguments::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn toks(s: &str) -> Vec<String> {
        normalize(s)
    }

    #[test]
    fn test_number_placeholder() {
        let p = NamePattern::parse("square thru <N>");
        assert_eq!(
            p.matches(&toks("square thru 4"), Some(4)).and_then(|a| a.number),
            Some(4)
        );
        assert_eq!(
            p.matches(&toks("Square Thru three"), None).and_then(|a| a.number),
            Some(3)
        );
        assert_eq!(
            p.matches(&toks("square thru"), Some(4)).and_then(|a| a.number),
            Some(4)
        );
        assert_eq!(p.matches(&toks("square thru"), None), None);
        assert_eq!(
            p.matches(&toks("square thru -2"), None).and_then(|a| a.number),
            Some(-2)
        );
    }

    #[test]
    fn test_parse_number_saturates_long_digit_strings() {
        assert_eq!(parse_number("7"), Some(7));
        assert_eq!(parse_number("+7"), Some(7));
        assert_eq!(parse_number("eight"), Some(8));
        assert_eq!(parse_number("99999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_number("-99999999999999999999"), Some(i64::MIN));
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("1/2"), None);
        assert_eq!(parse_number("4th"), None);
    }

    #[test]
    fn test_anyone_placeholder() {
        let p = NamePattern::parse("<anyone> run");
        let args = p.matches(&toks("boys run"), None).unwrap();
        assert_eq!(args.designator, Some(Designator::Boys));
        assert_eq!(p.matches(&toks("dancers run"), None), None);
        assert_eq!(p.render(&args), "boys run");
    }

    #[test]
    fn test_prefix_completion() {
        let p = NamePattern::parse("wheel and deal");
        assert!(p.completes(&toks("wheel and"), None).is_some());
        assert!(p.completes(&toks("wheel and d"), None).is_some());
        assert!(p.completes(&toks("wheel and deal"), None).is_none());
        assert!(p.completes(&toks("wheel or"), None).is_none());

        let p = NamePattern::parse("circulate <N>");
        assert_eq!(
            p.completes(&toks("circ"), Some(1)).and_then(|a| a.number),
            Some(1)
        );
        assert!(p.completes(&toks("circ"), None).is_none());
    }
}
