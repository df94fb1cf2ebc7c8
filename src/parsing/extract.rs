//! Pulls structure out of the Gemini free-text reply.
//!
//! The model is asked for "Блюдо: / Оценка: / Калории: / Почему: /
//! Совет:" lines, but any subset may be missing. A missing calorie
//! line is expected and is not an error: the meal is stored with an
//! unknown range.

use std::sync::LazyLock;

use regex::Regex;

/// Fallback title when neither the caption nor the reply names a dish.
pub const DEFAULT_MEAL_TITLE: &str = "еда";

static KCAL_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*калории\s*:\s*~?\s*(\d+)\s*[-–—]\s*(\d+)").unwrap()
});

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*блюдо\s*:\s*(.+)$").unwrap());

static SCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*оценка\s*:\s*(\d{1,2})").unwrap());

/// Extract the "Калории: <low>-<high>" range, normalized so low <= high.
pub fn extract_kcal_range(text: &str) -> Option<(i32, i32)> {
    let captures = KCAL_RANGE_RE.captures(text)?;
    let a = captures.get(1)?.as_str().parse::<i32>().ok()?;
    let b = captures.get(2)?.as_str().parse::<i32>().ok()?;
    Some((a.min(b), a.max(b)))
}

/// Dish title: the photo caption wins verbatim, then the "Блюдо:" line,
/// then a literal default.
pub fn extract_title(caption: Option<&str>, text: &str) -> String {
    if let Some(caption) = caption {
        let trimmed = caption.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    if let Some(captures) = TITLE_RE.captures(text) {
        if let Some(m) = captures.get(1) {
            return m.as_str().trim().to_string();
        }
    }
    DEFAULT_MEAL_TITLE.to_string()
}

/// The 1-10 quality score from the "Оценка:" line, when present.
pub fn extract_score(text: &str) -> Option<i32> {
    let score = SCORE_RE.captures(text)?.get(1)?.as_str().parse::<i32>().ok()?;
    (1..=10).contains(&score).then_some(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kcal_range() {
        let reply = "Блюдо: борщ\nОценка: 7\nКалории: 650-850 ккал\nПочему: ...";
        assert_eq!(extract_kcal_range(reply), Some((650, 850)));
    }

    #[test]
    fn test_kcal_range_normalized() {
        assert_eq!(extract_kcal_range("Калории: 850-650"), Some((650, 850)));
    }

    #[test]
    fn test_kcal_range_dash_variants() {
        assert_eq!(extract_kcal_range("Калории: ~500–700 ккал"), Some((500, 700)));
    }

    #[test]
    fn test_kcal_range_absent_is_not_an_error() {
        assert_eq!(extract_kcal_range("не смог оценить калории"), None);
    }

    #[test]
    fn test_title_prefers_caption() {
        let reply = "Блюдо: пицца маргарита\nКалории: 600-800";
        assert_eq!(extract_title(Some("домашняя шаурма"), reply), "домашняя шаурма");
        assert_eq!(extract_title(None, reply), "пицца маргарита");
        assert_eq!(extract_title(Some("  "), reply), "пицца маргарита");
    }

    #[test]
    fn test_title_default() {
        assert_eq!(extract_title(None, "ничего не разобрал"), DEFAULT_MEAL_TITLE);
    }

    #[test]
    fn test_score() {
        assert_eq!(extract_score("Оценка: 8/10"), Some(8));
        assert_eq!(extract_score("Оценка: 15"), None);
        assert_eq!(extract_score("без оценки"), None);
    }
}
