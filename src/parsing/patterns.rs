//! Text patterns for inbound chat messages: weight and step numbers,
//! question intents, correction phrasing.
//!
//! The matchers are deliberately permissive: they return whatever
//! number the pattern finds, and range policy (30-300 kg, 300-100000
//! steps) is applied by the dispatch chain, not here.

use std::ops::RangeInclusive;
use std::sync::LazyLock;

use regex::Regex;

pub const WEIGHT_KG_RANGE: RangeInclusive<f64> = 30.0..=300.0;
pub const HEIGHT_CM_RANGE: RangeInclusive<i32> = 120..=230;
pub const STEP_RANGE: RangeInclusive<i64> = 300..=100_000;

/// Longest message that may still be reinterpreted as a correction.
pub const MAX_CORRECTION_CHARS: usize = 80;

// Optional "вес" keyword, then a 2-3 digit number with an optional
// one-decimal fraction, comma or dot.
static WEIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:вес\s*)?(\d{2,3}(?:[.,]\d)?)").unwrap());

// 3-6 digit number with an optional unit word.
static STEPS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{3,6})\s*(?:шаг(?:ов|а)?|steps)?").unwrap());

static FIX_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^\s*(?:исправь|это|на\s+фото)\s*:\s*(.+)$").unwrap());

static NOT_X_BUT_Y_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)это\s+не\s+.+?,\s*а\s+(.+)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    HeightAndWeight,
    Weight,
    Height,
    EatenToday,
    BurnedToday,
    Balance,
    DailySummary,
}

/// Ordered intent rules, first match wins. The combined height-and-weight
/// pattern comes before the standalone height/weight patterns so the more
/// specific question never loses to a narrower one.
static INTENT_RULES: LazyLock<Vec<(Regex, Intent)>> = LazyLock::new(|| {
    [
        (
            r"(?i)рост\s+и\s+вес|вес\s+и\s+рост",
            Intent::HeightAndWeight,
        ),
        (
            r"(?i)(какой|каков)\s+(у\s+меня\s+)?вес|сколько\s+(я\s+)?вешу|мой\s+вес\s*\??\s*$",
            Intent::Weight,
        ),
        (
            r"(?i)(какой|каков)\s+(у\s+меня\s+)?рост|мой\s+рост\s*\??\s*$",
            Intent::Height,
        ),
        (
            r"(?i)сколько\s+(я\s+)?(сегодня\s+)?(съела?|наела?)|сколько\s+калорий\s+(я\s+)?(сегодня\s+)?(съела?|набрала?)|что\s+я\s+(сегодня\s+)?ела?",
            Intent::EatenToday,
        ),
        (
            r"(?i)сколько\s+(я\s+)?(сегодня\s+)?(сж[её]г|сожгла|потратила?)",
            Intent::BurnedToday,
        ),
        (
            r"(?i)(какой\s+(у\s+меня\s+)?)?баланс(\s+(дня|калорий))?",
            Intent::Balance,
        ),
        (
            r"(?i)итоги?\s+(за\s+)?(день|дня|сегодня)|сводка|как\s+прош[её]л\s+день",
            Intent::DailySummary,
        ),
    ]
    .into_iter()
    .map(|(pattern, intent)| (Regex::new(pattern).unwrap(), intent))
    .collect()
});

/// Extract a weight value from free text. First match anywhere wins;
/// no range validation here.
pub fn match_weight(text: &str) -> Option<f64> {
    let captures = WEIGHT_RE.captures(text)?;
    let raw = captures.get(1)?.as_str().replace(',', ".");
    raw.parse::<f64>().ok()
}

/// Extract a step count from free text. No range validation here.
pub fn match_steps(text: &str) -> Option<i64> {
    let captures = STEPS_RE.captures(text)?;
    captures.get(1)?.as_str().parse::<i64>().ok()
}

/// Classify a message as a question the bot can answer.
pub fn match_intent(text: &str) -> Option<Intent> {
    INTENT_RULES
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|&(_, intent)| intent)
}

/// Pull the correction text out of a follow-up message.
///
/// Recognizes the explicit prefixes ("исправь:", "это:", "на фото:"),
/// the "это не X, а Y" form, and finally any short message taken
/// verbatim. Long messages are not reinterpreted as corrections.
pub fn extract_correction(text: &str) -> Option<String> {
    if let Some(captures) = FIX_PREFIX_RE.captures(text) {
        return captures.get(1).map(|m| m.as_str().trim().to_string());
    }
    if let Some(captures) = NOT_X_BUT_Y_RE.captures(text) {
        return captures.get(1).map(|m| m.as_str().trim().to_string());
    }
    let trimmed = text.trim();
    if !trimmed.is_empty() && trimmed.chars().count() <= MAX_CORRECTION_CHARS {
        return Some(trimmed.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_dot_and_comma() {
        assert_eq!(match_weight("79.4"), Some(79.4));
        assert_eq!(match_weight("79,4"), Some(79.4));
        assert_eq!(match_weight("вес 102.3"), Some(102.3));
        assert_eq!(match_weight("Вес 68"), Some(68.0));
    }

    #[test]
    fn test_weight_is_permissive() {
        // Range policy is the caller's job.
        assert_eq!(match_weight("840"), Some(840.0));
        assert_eq!(match_weight("ничего"), None);
    }

    #[test]
    fn test_steps_with_and_without_unit() {
        assert_eq!(match_steps("8400"), Some(8400));
        assert_eq!(match_steps("8400 шагов"), Some(8400));
        assert_eq!(match_steps("сегодня 12500 шага"), Some(12500));
        assert_eq!(match_steps("650 steps"), Some(650));
        assert_eq!(match_steps("79"), None);
    }

    #[test]
    fn test_combined_intent_wins_over_standalone() {
        // The combined pattern must be checked first.
        assert_eq!(
            match_intent("какой у меня рост и вес?"),
            Some(Intent::HeightAndWeight)
        );
        assert_eq!(match_intent("какой у меня вес?"), Some(Intent::Weight));
        assert_eq!(match_intent("какой у меня рост?"), Some(Intent::Height));
    }

    #[test]
    fn test_question_intents() {
        assert_eq!(match_intent("сколько я вешу"), Some(Intent::Weight));
        assert_eq!(
            match_intent("сколько я сегодня съел?"),
            Some(Intent::EatenToday)
        );
        assert_eq!(
            match_intent("сколько калорий я набрала"),
            Some(Intent::EatenToday)
        );
        assert_eq!(
            match_intent("сколько я сегодня сжёг"),
            Some(Intent::BurnedToday)
        );
        assert_eq!(match_intent("какой баланс?"), Some(Intent::Balance));
        assert_eq!(match_intent("итоги дня"), Some(Intent::DailySummary));
        assert_eq!(match_intent("привет"), None);
    }

    #[test]
    fn test_correction_prefixes() {
        assert_eq!(
            extract_correction("исправь: борщ со сметаной"),
            Some("борщ со сметаной".to_string())
        );
        assert_eq!(extract_correction("это: окрошка"), Some("окрошка".to_string()));
        assert_eq!(
            extract_correction("на фото: плов с курицей"),
            Some("плов с курицей".to_string())
        );
    }

    #[test]
    fn test_correction_not_x_but_y() {
        assert_eq!(
            extract_correction("это не пицца, а хачапури"),
            Some("хачапури".to_string())
        );
    }

    #[test]
    fn test_short_message_is_correction_long_is_not() {
        assert_eq!(extract_correction("гречка с котлетой"), Some("гречка с котлетой".to_string()));
        let long = "а".repeat(MAX_CORRECTION_CHARS + 1);
        assert_eq!(extract_correction(&long), None);
    }
}
