// Placeholder substitution and localized rendering of report templates
use super::localization::{Locale, TranslationTable};
use super::record::ReportRecord;
use std::sync::Arc;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Replace every `{{key}}` that has a value in `record`.
///
/// Single left-to-right pass: inserted values are never rescanned, and
/// tokens without data stay in the output verbatim so gaps are visible.
pub fn substitute(template: &str, record: &ReportRecord) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;
    let mut missing = 0usize;

    while let Some(first) = rest.find(OPEN) {
        // In a run like "{{{a}}" the token starts at the last "{{"
        let braces = rest[first..].bytes().take_while(|b| *b == b'{').count();
        let open = first + braces - OPEN.len();
        let after_open = &rest[open + OPEN.len()..];
        let Some(close) = after_open.find(CLOSE) else {
            break;
        };

        let key = &after_open[..close];
        // "{{a {{b}}" - restart from the inner opener
        if let Some(inner) = key.rfind(OPEN) {
            let skip = open + OPEN.len() + inner;
            result.push_str(&rest[..skip]);
            rest = &rest[skip..];
            continue;
        }

        result.push_str(&rest[..open]);
        match record.get(key) {
            Some(value) => result.push_str(&value.render()),
            None => {
                missing += 1;
                result.push_str(&rest[open..open + OPEN.len() + close + CLOSE.len()]);
            }
        }
        rest = &after_open[close + CLOSE.len()..];
    }
    result.push_str(rest);

    if missing > 0 {
        tracing::debug!("{} placeholders left without data", missing);
    }
    result
}

#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    translations: Arc<TranslationTable>,
}

impl TemplateRenderer {
    pub fn new(translations: Arc<TranslationTable>) -> Self {
        Self { translations }
    }

    /// Substitute first, then translate: translated phrases may come from
    /// inserted labels, and unresolved tokens must reach translation intact.
    pub fn render(&self, template: &str, record: &ReportRecord, locale: Locale) -> String {
        let merged = substitute(template, record);
        self.translations.translate(&merged, locale)
    }
}
