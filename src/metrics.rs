//! Derived metrics: pure, deterministic, no I/O.
//!
//! The burned-calorie model is a deliberately crude linear estimate
//! (0.04 kcal per step at a 70 kg reference weight). Numbers produced
//! here are informational, not nutrition science.

use chrono::Duration;

use crate::models::MealEntry;

/// Weight changes smaller than this are reported as "stable".
pub const STABLE_THRESHOLD_KG: f64 = 0.2;

pub const KCAL_PER_STEP: f64 = 0.04;
pub const REFERENCE_WEIGHT_KG: f64 = 70.0;

/// Same-day meal count at which the snacking warning fires.
pub const SNACK_COUNT_LIMIT: usize = 5;

/// Window for the snacking density rule: 3 consecutive meals inside it.
pub fn snack_window() -> Duration {
    Duration::hours(2)
}

pub fn weight_trend_comment(current: f64, previous: Option<f64>) -> String {
    let prev = match previous {
        Some(prev) => prev,
        None => {
            return "Записал ✅ Если будешь отправлять вес регулярно (например, по воскресеньям), покажу динамику.".to_string();
        }
    };
    let diff = current - prev;
    if diff.abs() < STABLE_THRESHOLD_KG {
        format!("Почти без изменений ({:+.1} кг). Стабильно — это ок.", diff)
    } else if diff < 0.0 {
        format!("Тренд вниз: {:+.1} кг относительно прошлой точки. Хорошо 💪", diff)
    } else {
        format!("Тренд вверх: {:+.1} кг. Часто это вода/соль/сон — смотрим по 2–3 неделям.", diff)
    }
}

pub fn steps_comment(steps: i64) -> String {
    if steps >= 10_000 {
        "Отличная активность 🔥 10к+ шагов — так держать!"
    } else if steps >= 7_000 {
        "Хорошая активность 👍 Ещё немного до 10к."
    } else if steps >= 4_000 {
        "Неплохо, но можно больше. Попробуй добрать до 7к."
    } else {
        "Сегодня мало движения. Короткая прогулка спасёт день 🚶"
    }
    .to_string()
}

/// Crude linear burn estimate. Must stay numerically exact: tests pin
/// the 0.04 factor and the 70 kg reference.
pub fn estimate_burned_kcal(steps: i64, weight_kg: Option<f64>) -> i64 {
    let weight_factor = weight_kg.map_or(1.0, |w| w / REFERENCE_WEIGHT_KG);
    (steps as f64 * KCAL_PER_STEP * weight_factor).round() as i64
}

/// Point estimate for a meal: the midpoint of its calorie range.
pub fn kcal_midpoint(low: Option<i32>, high: Option<i32>) -> Option<i64> {
    match (low, high) {
        (Some(low), Some(high)) => Some(((low as f64 + high as f64) / 2.0).round() as i64),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyIntake {
    /// Sum of known midpoints only.
    pub total_kcal: i64,
    /// All meals, including unknown-calorie ones.
    pub meal_count: usize,
    /// Meals with a known calorie range.
    pub known_count: usize,
}

pub fn daily_intake(meals: &[MealEntry]) -> DailyIntake {
    let mut total_kcal = 0i64;
    let mut known_count = 0usize;
    for meal in meals {
        if let Some(mid) = kcal_midpoint(meal.kcal_low, meal.kcal_high) {
            total_kcal += mid;
            known_count += 1;
        }
    }
    DailyIntake {
        total_kcal,
        meal_count: meals.len(),
        known_count,
    }
}

pub fn daily_balance(intake_kcal: i64, burned_kcal: i64) -> i64 {
    intake_kcal - burned_kcal
}

/// Balance with an explicit leading "+" for surplus days.
pub fn format_balance(balance_kcal: i64) -> String {
    format!("{:+}", balance_kcal)
}

/// Snacking heuristic over the day's meals in ascending time order.
///
/// The count rule (>= 5 meals) is checked first; only if it does not
/// fire, the density rule looks at windows of exactly 3 consecutive
/// meals, first to third within 2 hours. Non-consecutive triples are
/// intentionally not considered.
pub fn snacking_warning(meals_asc: &[MealEntry]) -> Option<String> {
    if meals_asc.len() >= SNACK_COUNT_LIMIT {
        return Some(format!(
            "⚠️ Уже {} приёмов пищи за день — похоже на частые перекусы. Попробуй собрать еду в 3–4 приёма.",
            meals_asc.len()
        ));
    }
    for window in meals_asc.windows(3) {
        if window[2].recorded_at - window[0].recorded_at <= snack_window() {
            return Some(
                "⚠️ 3 приёма пищи меньше чем за 2 часа — похоже на серию перекусов. Может, один нормальный приём вместо них?".to_string(),
            );
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn meal_at(hour: u32, min: u32, kcal: Option<(i32, i32)>) -> MealEntry {
        MealEntry {
            id: None,
            chat_id: 1,
            user_id: 1,
            recorded_at: Utc.with_ymd_and_hms(2024, 5, 10, hour, min, 0).unwrap(),
            title: "еда".to_string(),
            kcal_low: kcal.map(|(low, _)| low),
            kcal_high: kcal.map(|(_, high)| high),
            reply_ref: None,
        }
    }

    #[test]
    fn test_trend_branches() {
        assert!(weight_trend_comment(80.0, None).contains("Записал"));
        assert!(weight_trend_comment(80.0, Some(80.1)).contains("без изменений"));
        assert!(weight_trend_comment(79.0, Some(80.0)).contains("Тренд вниз"));
        assert!(weight_trend_comment(81.0, Some(80.0)).contains("Тренд вверх"));
    }

    #[test]
    fn test_trend_delta_formatting() {
        let comment = weight_trend_comment(82.4, Some(83.0));
        assert!(comment.contains("-0.6"), "got: {}", comment);
        let comment = weight_trend_comment(81.0, Some(80.0));
        assert!(comment.contains("+1.0"), "got: {}", comment);
    }

    #[test]
    fn test_steps_tiers() {
        assert!(steps_comment(12_000).contains("Отличная"));
        assert!(steps_comment(10_000).contains("Отличная"));
        assert!(steps_comment(8_000).contains("Хорошая"));
        assert!(steps_comment(5_000).contains("Неплохо"));
        assert!(steps_comment(1_000).contains("мало движения"));
    }

    #[test]
    fn test_burned_kcal_is_pinned() {
        assert_eq!(estimate_burned_kcal(10_000, Some(70.0)), 400);
        assert_eq!(estimate_burned_kcal(10_000, None), 400);
        // Double weight, half steps: same burn.
        assert_eq!(estimate_burned_kcal(5_000, Some(140.0)), 400);
    }

    #[test]
    fn test_kcal_midpoint() {
        assert_eq!(kcal_midpoint(Some(650), Some(850)), Some(750));
        assert_eq!(kcal_midpoint(Some(650), None), None);
        assert_eq!(kcal_midpoint(None, None), None);
    }

    #[test]
    fn test_daily_intake_counts_unknown_meals() {
        let meals = vec![
            meal_at(9, 0, Some((300, 500))),
            meal_at(13, 0, None),
            meal_at(19, 0, Some((600, 800))),
        ];
        let intake = daily_intake(&meals);
        assert_eq!(intake.total_kcal, 400 + 700);
        assert_eq!(intake.meal_count, 3);
        assert_eq!(intake.known_count, 2);
    }

    #[test]
    fn test_balance_sign_formatting() {
        assert_eq!(format_balance(daily_balance(2100, 1950)), "+150");
        assert_eq!(format_balance(daily_balance(1500, 1700)), "-200");
    }

    #[test]
    fn test_snacking_count_rule_fires_first() {
        let meals: Vec<_> = (0..5).map(|i| meal_at(9 + i, 0, None)).collect();
        let warning = snacking_warning(&meals).unwrap();
        assert!(warning.contains("5 приёмов"));
    }

    #[test]
    fn test_snacking_density_rule() {
        let meals = vec![meal_at(9, 0, None), meal_at(10, 30, None), meal_at(10, 50, None)];
        assert!(snacking_warning(&meals).is_some());

        let spread = vec![meal_at(8, 0, None), meal_at(11, 0, None), meal_at(15, 0, None)];
        assert_eq!(snacking_warning(&spread), None);
    }

    #[test]
    fn test_snacking_only_consecutive_triples() {
        // 2nd+3rd+4th span under 2h would only matter as a consecutive
        // window; 08:05-14:10 is wider, so nothing fires.
        let meals = vec![
            meal_at(8, 0, None),
            meal_at(8, 5, None),
            meal_at(14, 0, None),
            meal_at(14, 10, None),
        ];
        assert_eq!(snacking_warning(&meals), None);
    }
}
