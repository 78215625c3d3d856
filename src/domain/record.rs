// Flat report record consumed by templates
use std::collections::BTreeMap;

/// A value a template placeholder can be replaced with.
///
/// Numbers carry their own precision so the stringified form is decided
/// here and never depends on locale formatting.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportValue {
    Number { value: f64, decimals: usize },
    Integer(i64),
    /// Plain text, escaped for SVG/HTML on insertion
    Text(String),
    /// Pre-rendered fragment (JSON payload, SVG snippet), inserted verbatim
    Markup(String),
}

impl ReportValue {
    pub fn number(value: f64, decimals: usize) -> Self {
        ReportValue::Number { value, decimals }
    }

    pub fn render(&self) -> String {
        match self {
            ReportValue::Number { value, decimals } => {
                let rendered = format!("{:.*}", decimals, value);
                // Avoid "-0.0" in documents
                let negative_zero = rendered
                    .strip_prefix('-')
                    .is_some_and(|digits| digits.chars().all(|c| c == '0' || c == '.'));
                if negative_zero {
                    rendered[1..].to_string()
                } else {
                    rendered
                }
            }
            ReportValue::Integer(value) => value.to_string(),
            ReportValue::Text(text) => escape_markup(text),
            ReportValue::Markup(markup) => markup.clone(),
        }
    }
}

fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportRecord {
    values: BTreeMap<String, ReportValue>,
}

impl ReportRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ReportValue) {
        self.values.insert(key.into(), value);
    }

    pub fn number(&mut self, key: impl Into<String>, value: f64, decimals: usize) {
        self.insert(key, ReportValue::number(value, decimals));
    }

    pub fn integer(&mut self, key: impl Into<String>, value: i64) {
        self.insert(key, ReportValue::Integer(value));
    }

    pub fn text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert(key, ReportValue::Text(value.into()));
    }

    pub fn markup(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert(key, ReportValue::Markup(value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&ReportValue> {
        self.values.get(key)
    }

    /// Merge another record in; its values win on key collisions.
    pub fn extend(&mut self, other: ReportRecord) {
        self.values.extend(other.values);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}
