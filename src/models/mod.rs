use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Scope value for the private, chat-independent profile.
pub const GLOBAL_SCOPE: i64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Cut,
    Maintain,
    Bulk,
}

impl Default for Goal {
    fn default() -> Self {
        Goal::Maintain
    }
}

impl std::fmt::Display for Goal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Goal::Cut => "cut",
            Goal::Maintain => "maintain",
            Goal::Bulk => "bulk",
        };
        write!(f, "{}", s)
    }
}

impl Goal {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cut" => Some(Goal::Cut),
            "maintain" => Some(Goal::Maintain),
            "bulk" => Some(Goal::Bulk),
            _ => None,
        }
    }
}

/// Per-user profile. A row with `scope == GLOBAL_SCOPE` is the private
/// profile; a row with a chat id as scope is a point-in-time snapshot
/// copied into that group, not a live reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub scope: i64,
    pub user_id: i64,
    pub name: String,
    pub height_cm: i32,
    pub weight_kg: f64,
    pub updated_at: DateTime<Utc>,
}

/// One analyzed meal. The calorie range may be entirely unknown; such
/// meals still count toward the per-day meal count. `reply_ref` is the
/// id of the bot's analysis message, kept so a later correction can
/// find the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealEntry {
    pub id: Option<i64>,
    pub chat_id: i64,
    pub user_id: i64,
    pub recorded_at: DateTime<Utc>,
    pub title: String,
    pub kcal_low: Option<i32>,
    pub kcal_high: Option<i32>,
    pub reply_ref: Option<i64>,
}

/// A user pressed "fix" on an analysis message and the bot is waiting
/// for the follow-up text. Expiry is a pure function of `created_at`,
/// there is no background sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingFix {
    pub chat_id: i64,
    pub user_id: i64,
    pub reply_ref: i64,
    pub created_at: DateTime<Utc>,
}

impl PendingFix {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at >= ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_from_string() {
        assert_eq!(Goal::from_string("cut"), Some(Goal::Cut));
        assert_eq!(Goal::from_string(" Bulk "), Some(Goal::Bulk));
        assert_eq!(Goal::from_string("keto"), None);
    }

    #[test]
    fn test_pending_fix_expiry() {
        let created = Utc::now();
        let fix = PendingFix {
            chat_id: 1,
            user_id: 2,
            reply_ref: 3,
            created_at: created,
        };
        let ttl = Duration::minutes(10);
        assert!(!fix.is_expired(created + Duration::minutes(9), ttl));
        assert!(fix.is_expired(created + Duration::minutes(10), ttl));
    }
}
