// Locale handling and literal-phrase translation
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// Phrases up to this many characters only match on word boundaries
const SHORT_PHRASE_MAX_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    /// Normalize a requested code (`es-ES`, `ES`, `es_MX`) to a supported
    /// locale, falling back to the default for anything unknown.
    pub fn parse(code: &str) -> Self {
        let primary = code
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match primary.as_str() {
            "es" => Locale::Es,
            "en" | "" => Locale::En,
            other => {
                tracing::debug!("Unsupported locale '{}', using default", other);
                Locale::En
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Es => "es",
        }
    }
}

#[derive(Debug, Clone)]
struct TranslationEntry {
    source: String,
    targets: HashMap<Locale, String>,
    short: bool,
}

/// Canonical English phrases mapped to per-locale text.
///
/// Read-only once built. Entries are applied longest source first so that
/// "Comfort Zone" is translated as a unit before "Comfort" is considered.
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    entries: Vec<TranslationEntry>,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the translation of `source` for `locale`.
    pub fn insert(&mut self, source: &str, locale: Locale, target: &str) {
        if source.is_empty() {
            return;
        }
        match self.entries.iter_mut().find(|e| e.source == source) {
            Some(entry) => {
                entry.targets.insert(locale, target.to_string());
            }
            None => {
                self.entries.push(TranslationEntry {
                    source: source.to_string(),
                    targets: HashMap::from([(locale, target.to_string())]),
                    short: source.chars().count() <= SHORT_PHRASE_MAX_CHARS,
                });
                self.entries
                    .sort_by(|a, b| b.source.chars().count().cmp(&a.source.chars().count()));
            }
        }
    }

    pub fn with_entries<'a, I>(mut self, locale: Locale, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (source, target) in pairs {
            self.insert(source, locale, target);
        }
        self
    }

    /// The process-wide built-in table.
    pub fn builtin() -> Arc<TranslationTable> {
        BUILTIN.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Replace every known phrase in `text` with its `locale` equivalent.
    ///
    /// The default locale is the identity. Matching targets the English
    /// source text, so translating an already translated document again
    /// changes nothing.
    pub fn translate(&self, text: &str, locale: Locale) -> String {
        if locale == Locale::En {
            return text.to_string();
        }

        let mut result = text.to_string();
        for entry in &self.entries {
            let Some(target) = entry.targets.get(&locale) else {
                continue;
            };
            if target == &entry.source || !result.contains(entry.source.as_str()) {
                continue;
            }
            result = if entry.short {
                replace_on_word_boundary(&result, &entry.source, target)
            } else {
                result.replace(entry.source.as_str(), target)
            };
        }
        result
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '{' || c == '}'
}

/// Replace non-overlapping occurrences of `source` that are not glued to a
/// word character or template brace on either side.
fn replace_on_word_boundary(text: &str, source: &str, target: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last = 0;

    for (start, matched) in text.match_indices(source) {
        let end = start + matched.len();
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();

        if before.is_some_and(is_word_char) || after.is_some_and(is_word_char) {
            continue;
        }

        result.push_str(&text[last..start]);
        result.push_str(target);
        last = end;
    }

    result.push_str(&text[last..]);
    result
}

static BUILTIN: LazyLock<Arc<TranslationTable>> = LazyLock::new(|| {
    Arc::new(TranslationTable::new().with_entries(Locale::Es, SPANISH.iter().copied()))
});

const SPANISH: &[(&str, &str)] = &[
    // Report titles
    ("Comfort Report", "Informe de confort"),
    ("Hotspots Report", "Informe de puntos calientes"),
    ("Temperature Trend", "Tendencia de temperatura"),
    ("Noise Report", "Informe de ruido"),
    ("Energy Consumption", "Consumo energético"),
    ("Power by Phase", "Potencia por fase"),
    // Comfort
    ("Comfort Zone", "Zona de confort"),
    ("Comfort", "Confort"),
    ("Cold Zones", "Zonas frías"),
    ("Cold", "Frío"),
    ("Hotspots", "Puntos calientes"),
    ("Hot", "Calor"),
    ("Critical", "Crítico"),
    ("Status", "Estado"),
    ("Excellent", "Excelente"),
    ("Acceptable", "Aceptable"),
    ("Needs Attention", "Requiere atención"),
    // Measurements
    ("Average Temperature", "Temperatura media"),
    ("Temperature", "Temperatura"),
    ("Humidity", "Humedad"),
    ("Noise", "Ruido"),
    ("Peak", "Pico"),
    ("Percentile", "Percentil"),
    ("Saturated readings", "Lecturas saturadas"),
    ("Overall Average", "Media general"),
    ("Average", "Promedio"),
    ("Avg", "Prom"),
    ("Max", "Máx"),
    ("Min", "Mín"),
    ("Current", "Corriente"),
    ("Phase", "Fase"),
    // Rankings
    ("Noisiest", "Más ruidosos"),
    ("Quietest", "Más silenciosos"),
    ("Rank", "Puesto"),
    // Summary
    ("Active Sensors", "Sensores activos"),
    ("Total Samples", "Muestras totales"),
    ("Period", "Período"),
    ("From", "Desde"),
    ("To", "Hasta"),
    ("No data", "Sin datos"),
    ("Generated", "Generado"),
    ("Hourly", "Por hora"),
    ("Daily", "Diario"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_normalization() {
        assert_eq!(Locale::parse("es"), Locale::Es);
        assert_eq!(Locale::parse("ES"), Locale::Es);
        assert_eq!(Locale::parse("es-ES"), Locale::Es);
        assert_eq!(Locale::parse(" es_MX "), Locale::Es);
        assert_eq!(Locale::parse("en-GB"), Locale::En);
        assert_eq!(Locale::parse("fr"), Locale::En);
        assert_eq!(Locale::parse(""), Locale::En);
    }

    #[test]
    fn test_default_locale_is_identity() {
        let table = TranslationTable::builtin();
        let doc = "<text>Comfort Zone</text><text>Avg {{avg}}</text>";
        assert_eq!(table.translate(doc, Locale::En), doc);
    }

    #[test]
    fn test_translation_is_idempotent() {
        let table = TranslationTable::builtin();
        let doc = "<h1>Comfort Report</h1><p>Active Sensors: 5</p>\
<p>Avg Max Min</p><p>Needs Attention</p>";
        let once = table.translate(doc, Locale::Es);
        let twice = table.translate(&once, Locale::Es);
        assert_eq!(once, twice);
        assert_eq!(
            once,
            "<h1>Informe de confort</h1><p>Sensores activos: 5</p>\
<p>Prom Máx Mín</p><p>Requiere atención</p>"
        );
    }

    #[test]
    fn test_no_target_reintroduces_a_source_phrase() {
        let table = TranslationTable::builtin();
        for (source, target) in SPANISH {
            assert_eq!(
                table.translate(target, Locale::Es),
                *target,
                "translation of '{}' is not stable",
                source
            );
        }
    }

    #[test]
    fn test_short_phrase_respects_word_boundaries() {
        let table = TranslationTable::builtin();
        assert_eq!(table.translate("Average", Locale::Es), "Promedio");
        assert_eq!(table.translate("Avg", Locale::Es), "Prom");
        assert_eq!(table.translate("Avg:", Locale::Es), "Prom:");
        assert_eq!(table.translate("AvgTemp", Locale::Es), "AvgTemp");
        assert_eq!(table.translate("Maximum", Locale::Es), "Maximum");
        assert_eq!(table.translate("Total To_do", Locale::Es), "Total To_do");
        assert_eq!(table.translate("{{Max}}", Locale::Es), "{{Max}}");
        assert_eq!(table.translate("From 01/10 To 07/10", Locale::Es), "Desde 01/10 Hasta 07/10");
    }

    #[test]
    fn test_longest_phrase_wins() {
        let table = TranslationTable::builtin();
        assert_eq!(table.translate("Comfort Zone", Locale::Es), "Zona de confort");
        assert_eq!(table.translate("Comfort", Locale::Es), "Confort");
        assert_eq!(table.translate("Hotspots", Locale::Es), "Puntos calientes");
    }

    #[test]
    fn test_insert_overrides_existing_entry() {
        let mut table = TranslationTable::new().with_entries(Locale::Es, [("Comfort", "Confort")]);
        table.insert("Comfort", Locale::Es, "Comodidad");
        assert_eq!(table.len(), 1);
        assert_eq!(table.translate("Comfort", Locale::Es), "Comodidad");
    }

    #[test]
    fn test_missing_target_for_locale_is_skipped() {
        let table = TranslationTable::new().with_entries(Locale::En, [("Comfort", "Comfort")]);
        assert_eq!(table.translate("Comfort", Locale::Es), "Comfort");
    }
}
