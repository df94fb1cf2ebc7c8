use anyhow::{Context, Result};
use chrono::Weekday;
use chrono_tz::Tz;
use std::env;

/// Runtime configuration, read once at startup and passed into the
/// components. Missing BOT_TOKEN or DATABASE_URL aborts startup; a
/// missing GEMINI_API_KEY only disables photo analysis.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub database_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub tz: Tz,
    pub anti_spam_seconds: i64,
    pub analysis_timeout_secs: u64,
    pub pending_fix_ttl_secs: i64,
    pub water_hour: u32,
    pub water_min: u32,
    pub steps_hour: u32,
    pub steps_min: u32,
    pub weigh_weekday: Weekday,
    pub weigh_hour: u32,
    pub weigh_min: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bot_token = env::var("BOT_TOKEN").context("BOT_TOKEN must be set")?;
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let gemini_api_key = env::var("GEMINI_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());

        let tz: Tz = env::var("TZ")
            .unwrap_or_else(|_| "Asia/Almaty".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid TZ: {}", e))?;

        let weigh_weekday = parse_weekday(
            &env::var("WEIGH_DOW").unwrap_or_else(|_| "sun".to_string()),
        )?;

        Ok(Self {
            bot_token,
            database_url,
            gemini_api_key,
            gemini_model,
            tz,
            anti_spam_seconds: env_num("ANTI_SPAM_SECONDS", 90)?,
            analysis_timeout_secs: env_num("ANALYSIS_TIMEOUT_SECONDS", 60)?,
            pending_fix_ttl_secs: env_num("PENDING_FIX_TTL_SECONDS", 600)?,
            water_hour: env_num("WATER_HOUR", 7)?,
            water_min: env_num("WATER_MIN", 0)?,
            steps_hour: env_num("STEPS_HOUR", 22)?,
            steps_min: env_num("STEPS_MIN", 0)?,
            weigh_weekday,
            weigh_hour: env_num("WEIGH_HOUR", 10)?,
            weigh_min: env_num("WEIGH_MIN", 0)?,
        })
    }
}

fn env_num<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

fn parse_weekday(s: &str) -> Result<Weekday> {
    match s.trim().to_lowercase().as_str() {
        "mon" => Ok(Weekday::Mon),
        "tue" => Ok(Weekday::Tue),
        "wed" => Ok(Weekday::Wed),
        "thu" => Ok(Weekday::Thu),
        "fri" => Ok(Weekday::Fri),
        "sat" => Ok(Weekday::Sat),
        "sun" => Ok(Weekday::Sun),
        other => anyhow::bail!("Invalid WEIGH_DOW: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weekday() {
        assert_eq!(parse_weekday("sun").unwrap(), Weekday::Sun);
        assert_eq!(parse_weekday(" Mon ").unwrap(), Weekday::Mon);
        assert!(parse_weekday("someday").is_err());
    }
}
