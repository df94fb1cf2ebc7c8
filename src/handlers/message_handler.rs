use anyhow::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::config::Config;
use crate::metrics;
use crate::models::{Goal, MealEntry, Profile, GLOBAL_SCOPE};
use crate::parsing::patterns::{
    extract_correction, match_intent, match_steps, match_weight, Intent, HEIGHT_CM_RANGE,
    STEP_RANGE, WEIGHT_KG_RANGE,
};
use crate::parsing::{extract_kcal_range, extract_score, extract_title};
use crate::services::{local_day_bounds, ChatService, Database, GeminiService};

const DEFAULT_RULES: &str = "Я оцениваю еду по: белок / овощи(клетчатка) / сладкое / жирное / порция / соусы.\n\
     Отвечаю форматом: Блюдо, Оценка 1–10, Калории (примерно диапазоном), Почему, Совет.\n\
     Калории по фото — всегда приблизительно.";

/// One rule of the text dispatch chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchRule {
    PendingCorrection,
    ReplyCorrection,
    Question,
    Weight,
    Steps,
}

/// The fixed priority order of the chain. First match wins; a message
/// is never treated as both weight and steps.
pub const DISPATCH_ORDER: [DispatchRule; 5] = [
    DispatchRule::PendingCorrection,
    DispatchRule::ReplyCorrection,
    DispatchRule::Question,
    DispatchRule::Weight,
    DispatchRule::Steps,
];

#[derive(Debug, Clone, Copy)]
pub struct ClassifyInput<'a> {
    pub text: &'a str,
    pub has_pending_fix: bool,
    /// Id of the bot message this message replies to, if any.
    pub reply_to_bot_message: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    PendingCorrection(String),
    ReplyCorrection { reply_ref: i64, correction: String },
    Question(Intent),
    Weight(f64),
    Steps(i64),
}

/// Run the dispatch chain over one text message. The matchers are
/// permissive; range validation happens here, and an out-of-range
/// number silently falls through to the next rule.
pub fn classify(input: &ClassifyInput) -> Option<Classified> {
    for rule in DISPATCH_ORDER {
        let hit = match rule {
            DispatchRule::PendingCorrection => {
                if input.has_pending_fix {
                    extract_correction(input.text).map(Classified::PendingCorrection)
                } else {
                    None
                }
            }
            DispatchRule::ReplyCorrection => input.reply_to_bot_message.and_then(|reply_ref| {
                extract_correction(input.text)
                    .map(|correction| Classified::ReplyCorrection { reply_ref, correction })
            }),
            DispatchRule::Question => match_intent(input.text).map(Classified::Question),
            DispatchRule::Weight => match_weight(input.text)
                .filter(|w| WEIGHT_KG_RANGE.contains(w))
                .map(Classified::Weight),
            DispatchRule::Steps => match_steps(input.text)
                .filter(|s| STEP_RANGE.contains(s))
                .map(Classified::Steps),
        };
        if hit.is_some() {
            return hit;
        }
    }
    None
}

pub struct MessageHandler {
    db: Arc<Database>,
    vision: Arc<GeminiService>,
    chat: Arc<dyn ChatService>,
    config: Arc<Config>,
}

impl MessageHandler {
    pub fn new(
        db: Arc<Database>,
        vision: Arc<GeminiService>,
        chat: Arc<dyn ChatService>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            db,
            vision,
            chat,
            config,
        }
    }

    pub async fn handle_text(
        &self,
        chat_id: i64,
        user_id: i64,
        text: &str,
        is_group: bool,
        reply_to_bot_message: Option<i64>,
    ) -> Result<()> {
        log::info!("📨 text from {} in {}: '{}'", user_id, chat_id, text);

        self.db.ensure_chat(chat_id).await?;

        let trimmed = text.trim();
        if trimmed.starts_with('/') {
            return self.handle_command(chat_id, user_id, trimmed, is_group).await;
        }

        let now = Utc::now();

        // Expired pending fixes are abandoned, never acted upon.
        let pending = match self.db.get_pending_fix(chat_id, user_id).await? {
            Some(fix) if fix.is_expired(now, Duration::seconds(self.config.pending_fix_ttl_secs)) => {
                log::debug!("⌛ pending fix expired for {}/{}", chat_id, user_id);
                self.db.clear_pending_fix(chat_id, user_id).await?;
                None
            }
            other => other,
        };

        let input = ClassifyInput {
            text: trimmed,
            has_pending_fix: pending.is_some(),
            reply_to_bot_message,
        };

        match classify(&input) {
            Some(Classified::PendingCorrection(correction)) => {
                self.db.clear_pending_fix(chat_id, user_id).await?;
                let reply_ref = pending.map(|fix| fix.reply_ref).unwrap_or_default();
                self.apply_correction(chat_id, user_id, reply_ref, &correction)
                    .await?;
            }
            Some(Classified::ReplyCorrection { reply_ref, correction }) => {
                self.apply_correction(chat_id, user_id, reply_ref, &correction)
                    .await?;
            }
            Some(Classified::Question(intent)) => {
                let answer = self.answer_intent(chat_id, user_id, intent).await?;
                self.chat.send_message(chat_id, &answer).await?;
            }
            Some(Classified::Weight(weight)) => {
                self.record_weight_message(chat_id, user_id, weight).await?;
            }
            Some(Classified::Steps(steps)) => {
                self.record_steps_message(chat_id, user_id, steps).await?;
            }
            None => {
                // Not a number, not a question: stay silent in groups.
                log::debug!("no rule matched for '{}'", trimmed);
            }
        }

        Ok(())
    }

    pub async fn handle_photo(
        &self,
        chat_id: i64,
        user_id: i64,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<()> {
        self.db.ensure_chat(chat_id).await?;

        let now = Utc::now();

        // Anti-spam gate: silent when closed, exactly as the cooldown
        // contract demands (check and marker advance are one atomic
        // statement in the store).
        if !self
            .db
            .can_analyze_food(chat_id, now.timestamp(), self.config.anti_spam_seconds)
            .await?
        {
            log::debug!("⏱ anti-spam gate closed for chat {}", chat_id);
            return Ok(());
        }

        if !self.vision.is_enabled() {
            self.chat
                .send_message(
                    chat_id,
                    "Gemini анализ отключен.\n\
                     Добавь переменную GEMINI_API_KEY.\n\
                     Пока можешь описать еду текстом — я дам оценку по описанию.",
                )
                .await?;
            return Ok(());
        }

        let goal = self.db.get_goal(chat_id).await?;

        let analysis = match self.analyze_photo(file_id, goal, caption).await {
            Ok(text) => text,
            Err(e) => {
                log::error!("❌ photo analysis failed: {}", e);
                self.chat
                    .send_message(
                        chat_id,
                        "Не смог обработать фото 😅 Попробуй другое или подпиши, что на тарелке.",
                    )
                    .await?;
                return Ok(());
            }
        };

        let kcal_range = extract_kcal_range(&analysis);
        let title = extract_title(caption, &analysis);
        if let Some(score) = extract_score(&analysis) {
            log::info!("🍽 '{}' scored {}/10", title, score);
        }

        let mut meal = MealEntry {
            id: None,
            chat_id,
            user_id,
            recorded_at: now,
            title,
            kcal_low: kcal_range.map(|(low, _)| low),
            kcal_high: kcal_range.map(|(_, high)| high),
            reply_ref: None,
        };

        // Same-day aggregates including the meal being added.
        let (day_start, day_end) = local_day_bounds(self.config.tz, now);
        let mut meals = self
            .db
            .meals_between(chat_id, user_id, day_start, day_end)
            .await?;
        meals.push(meal.clone());

        let intake = metrics::daily_intake(&meals);
        let mut reply = format!(
            "{}\n\n📊 Сегодня: ~{} ккал, приёмов пищи: {} (с оценкой: {})",
            analysis, intake.total_kcal, intake.meal_count, intake.known_count
        );
        if let Some(warning) = metrics::snacking_warning(&meals) {
            reply.push('\n');
            reply.push_str(&warning);
        }

        let bot_message_id = self.chat.send_message_with_fix_button(chat_id, &reply).await?;

        meal.reply_ref = Some(bot_message_id);
        self.db.record_meal(&meal).await?;

        Ok(())
    }

    /// The user pressed "fix" under an analysis message.
    pub async fn handle_fix_button(
        &self,
        chat_id: i64,
        user_id: i64,
        bot_message_id: i64,
    ) -> Result<()> {
        self.db.ensure_chat(chat_id).await?;
        self.db
            .set_pending_fix(chat_id, user_id, bot_message_id, Utc::now())
            .await?;
        self.chat
            .send_message(
                chat_id,
                "Ок, напиши одним сообщением, что на самом деле на фото.\n\
                 Можно так: «это не пицца, а хачапури» или «исправь: борщ со сметаной».",
            )
            .await?;
        Ok(())
    }

    async fn analyze_photo(
        &self,
        file_id: &str,
        goal: Goal,
        caption: Option<&str>,
    ) -> Result<String> {
        let image = self.chat.download_photo(file_id).await?;
        // Telegram serves photos as JPEG.
        match self
            .vision
            .analyze_food(&image, "image/jpeg", goal, caption)
            .await
        {
            Ok(text) => Ok(text),
            Err(e) => match caption {
                // Degrade to a text-only estimate when a caption exists.
                Some(caption) if !caption.trim().is_empty() => {
                    log::warn!("photo call failed ({}), falling back to caption", e);
                    self.vision.analyze_text(caption, goal).await
                }
                _ => Err(e),
            },
        }
    }

    async fn apply_correction(
        &self,
        chat_id: i64,
        user_id: i64,
        reply_ref: i64,
        correction: &str,
    ) -> Result<()> {
        let meal = self.db.find_meal_by_reply_ref(chat_id, reply_ref).await?;
        if meal.is_none() {
            self.chat
                .send_message(
                    chat_id,
                    "Не нашёл эту запись 😅 Нажми «Исправить» под нужным сообщением ещё раз.",
                )
                .await?;
            return Ok(());
        }

        let goal = self.db.get_goal(chat_id).await?;

        // Re-estimate from text alone; on failure keep the user's title
        // and drop the calorie estimate rather than failing the fix.
        let (title, kcal_range) = if self.vision.is_enabled() {
            match self.vision.analyze_text(correction, goal).await {
                Ok(reply) => (
                    extract_title(Some(correction), &reply),
                    extract_kcal_range(&reply),
                ),
                Err(e) => {
                    log::warn!("re-estimate failed: {}", e);
                    (correction.to_string(), None)
                }
            }
        } else {
            (correction.to_string(), None)
        };

        let updated = self
            .db
            .update_meal_by_reply_ref(
                chat_id,
                reply_ref,
                &title,
                kcal_range.map(|(low, _)| low),
                kcal_range.map(|(_, high)| high),
            )
            .await?;

        if !updated {
            self.chat
                .send_message(
                    chat_id,
                    "Не нашёл эту запись 😅 Нажми «Исправить» под нужным сообщением ещё раз.",
                )
                .await?;
            return Ok(());
        }

        let kcal_line = match kcal_range {
            Some((low, high)) => format!("Калории: {}–{} ккал (примерно)", low, high),
            None => "Калории не оценил — запись без цифр.".to_string(),
        };
        self.chat
            .send_message(chat_id, &format!("Исправил ✅ {}\n{}", title, kcal_line))
            .await?;

        log::info!("✏️ meal {} corrected by {} in {}", reply_ref, user_id, chat_id);
        Ok(())
    }

    async fn record_weight_message(&self, chat_id: i64, user_id: i64, weight: f64) -> Result<()> {
        let now = Utc::now();
        self.db.record_weight(chat_id, user_id, weight, now).await?;

        // Compare against the last point at least ~a week old, so two
        // weigh-ins in one day don't read as a trend.
        let previous = self
            .db
            .weight_as_of(chat_id, user_id, now - Duration::days(6))
            .await?
            .map(|(_, w)| w);

        let reply = format!(
            "Вес: {:.1} кг ✅\n{}",
            weight,
            metrics::weight_trend_comment(weight, previous)
        );
        self.chat.send_message(chat_id, &reply).await?;
        Ok(())
    }

    async fn record_steps_message(&self, chat_id: i64, user_id: i64, steps: i64) -> Result<()> {
        let now = Utc::now();
        self.db.record_steps(chat_id, user_id, steps, now).await?;

        let weight = self.profile_weight(chat_id, user_id).await?;
        let burned = metrics::estimate_burned_kcal(steps, weight);

        let reply = format!(
            "Шаги: {} ✅ (≈{} ккал)\n{}",
            steps,
            burned,
            metrics::steps_comment(steps)
        );
        self.chat.send_message(chat_id, &reply).await?;
        Ok(())
    }

    async fn answer_intent(&self, chat_id: i64, user_id: i64, intent: Intent) -> Result<String> {
        let answer = match intent {
            Intent::Weight => self.weight_status(chat_id, user_id).await?,
            Intent::Height => self.height_status(chat_id, user_id).await?,
            Intent::HeightAndWeight => format!(
                "{}\n{}",
                self.height_status(chat_id, user_id).await?,
                self.weight_status(chat_id, user_id).await?
            ),
            Intent::EatenToday => self.eaten_today(chat_id, user_id).await?,
            Intent::BurnedToday => self.burned_today(chat_id, user_id).await?,
            Intent::Balance => self.balance_today(chat_id, user_id).await?,
            Intent::DailySummary => self.daily_summary(chat_id, user_id).await?,
        };
        Ok(answer)
    }

    async fn weight_status(&self, chat_id: i64, user_id: i64) -> Result<String> {
        let last = match self.db.recent_weight(chat_id, user_id).await? {
            Some(last) => last,
            None => return Ok("Пока нет записей веса. Напиши, например: 79.4".to_string()),
        };

        let now = Utc::now();
        let (recorded_at, current) = last;
        let local = recorded_at.with_timezone(&self.config.tz);
        let mut lines = vec![format!(
            "Последний вес: {:.1} кг ({})",
            current,
            local.format("%d.%m %H:%M")
        )];

        // Deltas are omitted, not errored, when there is no comparison point.
        if let Some((_, week_ago)) = self
            .db
            .weight_as_of(chat_id, user_id, now - Duration::days(7))
            .await?
        {
            lines.push(format!("Изменение за 7 дней: {:+.1} кг", current - week_ago));
        }
        if let Some((_, month_ago)) = self
            .db
            .weight_as_of(chat_id, user_id, now - Duration::days(30))
            .await?
        {
            lines.push(format!("Изменение за 30 дней: {:+.1} кг", current - month_ago));
        }

        Ok(lines.join("\n"))
    }

    async fn height_status(&self, chat_id: i64, user_id: i64) -> Result<String> {
        match self.profile_for(chat_id, user_id).await? {
            Some(profile) => Ok(format!("Рост: {} см", profile.height_cm)),
            None => Ok("Рост пока не записан. Команда: /profile Имя 180 79,4".to_string()),
        }
    }

    async fn eaten_today(&self, chat_id: i64, user_id: i64) -> Result<String> {
        let (day_start, day_end) = local_day_bounds(self.config.tz, Utc::now());
        let meals = self
            .db
            .meals_between(chat_id, user_id, day_start, day_end)
            .await?;

        if meals.is_empty() {
            return Ok("Сегодня ещё нет записей о еде. Кидай фото 🍽".to_string());
        }

        let intake = metrics::daily_intake(&meals);
        Ok(format!(
            "Сегодня: ~{} ккал, приёмов пищи: {} (с оценкой калорий: {})",
            intake.total_kcal, intake.meal_count, intake.known_count
        ))
    }

    async fn burned_today(&self, chat_id: i64, user_id: i64) -> Result<String> {
        let (day_start, day_end) = local_day_bounds(self.config.tz, Utc::now());
        let steps = self
            .db
            .steps_sum_between(chat_id, user_id, day_start, day_end)
            .await?;

        if steps == 0 {
            return Ok("Сегодня шагов ещё нет. Напиши число шагов — посчитаю.".to_string());
        }

        let weight = self.profile_weight(chat_id, user_id).await?;
        let burned = metrics::estimate_burned_kcal(steps, weight);
        Ok(format!("Шагов сегодня: {}. Сожжено примерно {} ккал.", steps, burned))
    }

    async fn balance_today(&self, chat_id: i64, user_id: i64) -> Result<String> {
        let (day_start, day_end) = local_day_bounds(self.config.tz, Utc::now());
        let meals = self
            .db
            .meals_between(chat_id, user_id, day_start, day_end)
            .await?;
        let steps = self
            .db
            .steps_sum_between(chat_id, user_id, day_start, day_end)
            .await?;

        if meals.is_empty() && steps == 0 {
            return Ok("Пока нет данных за сегодня: ни еды, ни шагов.".to_string());
        }

        let intake = metrics::daily_intake(&meals);
        let weight = self.profile_weight(chat_id, user_id).await?;
        let burned = metrics::estimate_burned_kcal(steps, weight);
        let balance = metrics::daily_balance(intake.total_kcal, burned);

        Ok(format!(
            "Баланс дня: {} ккал (съедено ~{}, сожжено ~{})",
            metrics::format_balance(balance),
            intake.total_kcal,
            burned
        ))
    }

    async fn daily_summary(&self, chat_id: i64, user_id: i64) -> Result<String> {
        let (day_start, day_end) = local_day_bounds(self.config.tz, Utc::now());
        let meals = self
            .db
            .meals_between(chat_id, user_id, day_start, day_end)
            .await?;
        let steps = self
            .db
            .steps_sum_between(chat_id, user_id, day_start, day_end)
            .await?;

        let intake = metrics::daily_intake(&meals);
        let weight = self.profile_weight(chat_id, user_id).await?;
        let burned = metrics::estimate_burned_kcal(steps, weight);
        let balance = metrics::daily_balance(intake.total_kcal, burned);

        let mut lines = vec!["📋 Итоги дня:".to_string()];
        if intake.meal_count > 0 {
            lines.push(format!(
                "Еда: ~{} ккал за {} приёмов (с оценкой: {})",
                intake.total_kcal, intake.meal_count, intake.known_count
            ));
        } else {
            lines.push("Еда: записей нет".to_string());
        }
        if steps > 0 {
            lines.push(format!("Шаги: {} (≈{} ккал)", steps, burned));
        } else {
            lines.push("Шаги: записей нет".to_string());
        }
        lines.push(format!("Баланс: {} ккал", metrics::format_balance(balance)));

        if let Some((recorded_at, w)) = self.db.recent_weight(chat_id, user_id).await? {
            let local = recorded_at.with_timezone(&self.config.tz);
            lines.push(format!("Последний вес: {:.1} кг ({})", w, local.format("%d.%m")));
        }
        if let Some(warning) = metrics::snacking_warning(&meals) {
            lines.push(warning);
        }

        Ok(lines.join("\n"))
    }

    // ---- commands ----

    async fn handle_command(
        &self,
        chat_id: i64,
        user_id: i64,
        text: &str,
        is_group: bool,
    ) -> Result<()> {
        let parts: Vec<&str> = text.split_whitespace().collect();
        let command = parts
            .first()
            .map(|c| c.split('@').next().unwrap_or(c))
            .unwrap_or("");

        match command {
            "/start" => {
                self.chat
                    .send_message(
                        chat_id,
                        "Я на месте ✅\n\
                         Кидай фото еды — оценю и прикину калории.\n\
                         Команды: /bind /unbind /goal /rules /stats /profile",
                    )
                    .await?;
            }
            "/bind" | "/unbind" => {
                if !is_group {
                    self.chat
                        .send_message(chat_id, "Эта команда нужна в группе.")
                        .await?;
                    return Ok(());
                }
                let bound = command == "/bind";
                self.db.set_bound(chat_id, bound).await?;
                let reply = if bound {
                    "Ок! Напоминания включены для этой группы ✅"
                } else {
                    "Ок! Напоминания выключены для этой группы ✅"
                };
                self.chat.send_message(chat_id, reply).await?;
            }
            "/goal" => {
                let goal = parts.get(1).and_then(|arg| Goal::from_string(arg));
                match goal {
                    Some(goal) => {
                        self.db.set_goal(chat_id, goal).await?;
                        self.chat
                            .send_message(chat_id, &format!("Цель установлена: {} ✅", goal))
                            .await?;
                    }
                    None => {
                        self.chat
                            .send_message(chat_id, "Формат: /goal cut | maintain | bulk")
                            .await?;
                    }
                }
            }
            "/rules" => {
                self.chat.send_message(chat_id, DEFAULT_RULES).await?;
            }
            "/stats" => {
                let status = self.weight_status(chat_id, user_id).await?;
                self.chat.send_message(chat_id, &status).await?;
            }
            "/profile" => {
                self.handle_profile_command(chat_id, user_id, &parts, is_group)
                    .await?;
            }
            _ => {
                log::debug!("unknown command '{}'", command);
            }
        }

        Ok(())
    }

    async fn handle_profile_command(
        &self,
        chat_id: i64,
        user_id: i64,
        parts: &[&str],
        is_group: bool,
    ) -> Result<()> {
        if parts.len() < 2 {
            let reply = match self.profile_for(chat_id, user_id).await? {
                Some(profile) => format!(
                    "Профиль: {}, рост {} см, вес {:.1} кг (обновлён {})",
                    profile.name,
                    profile.height_cm,
                    profile.weight_kg,
                    profile.updated_at.with_timezone(&self.config.tz).format("%d.%m.%Y")
                ),
                None => "Профиль пуст. Формат: /profile Имя 180 79,4".to_string(),
            };
            self.chat.send_message(chat_id, &reply).await?;
            return Ok(());
        }

        let parsed = parse_profile_args(&parts[1..]);
        let (name, height_cm, weight_kg) = match parsed {
            Some(parsed) => parsed,
            None => {
                self.chat
                    .send_message(
                        chat_id,
                        "Формат: /profile Имя 180 79,4\n(рост 120–230 см, вес 30–300 кг)",
                    )
                    .await?;
                return Ok(());
            }
        };

        let now = Utc::now();
        let mut profile = Profile {
            scope: GLOBAL_SCOPE,
            user_id,
            name,
            height_cm,
            weight_kg,
            updated_at: now,
        };
        self.db.upsert_profile(&profile).await?;

        // A group gets a point-in-time snapshot, not a live reference.
        if is_group {
            profile.scope = chat_id;
            self.db.upsert_profile(&profile).await?;
        }

        self.chat
            .send_message(
                chat_id,
                &format!(
                    "Профиль сохранён ✅ {}, рост {} см, вес {:.1} кг",
                    profile.name, profile.height_cm, profile.weight_kg
                ),
            )
            .await?;
        Ok(())
    }

    // ---- profile lookup ----

    /// Group-scoped snapshot first, then the global profile.
    async fn profile_for(&self, chat_id: i64, user_id: i64) -> Result<Option<Profile>> {
        if let Some(profile) = self.db.get_profile(chat_id, user_id).await? {
            return Ok(Some(profile));
        }
        self.db.get_profile(GLOBAL_SCOPE, user_id).await
    }

    async fn profile_weight(&self, chat_id: i64, user_id: i64) -> Result<Option<f64>> {
        Ok(self
            .profile_for(chat_id, user_id)
            .await?
            .map(|profile| profile.weight_kg))
    }
}

/// Parse "/profile Имя Фамилия 180 79,4" arguments: the last two
/// tokens are height and weight, everything before them is the name.
fn parse_profile_args(args: &[&str]) -> Option<(String, i32, f64)> {
    if args.len() < 3 {
        return None;
    }
    let weight = args[args.len() - 1].replace(',', ".").parse::<f64>().ok()?;
    let height = args[args.len() - 2].parse::<i32>().ok()?;
    let name = args[..args.len() - 2].join(" ");

    if name.is_empty() || !HEIGHT_CM_RANGE.contains(&height) || !WEIGHT_KG_RANGE.contains(&weight) {
        return None;
    }
    Some((name, height, weight))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(text: &str) -> ClassifyInput<'_> {
        ClassifyInput {
            text,
            has_pending_fix: false,
            reply_to_bot_message: None,
        }
    }

    #[test]
    fn test_dispatch_order_is_fixed() {
        assert_eq!(
            DISPATCH_ORDER,
            [
                DispatchRule::PendingCorrection,
                DispatchRule::ReplyCorrection,
                DispatchRule::Question,
                DispatchRule::Weight,
                DispatchRule::Steps,
            ]
        );
    }

    #[test]
    fn test_weight_wins_over_steps() {
        // "250" matches both patterns; the weight rule comes first.
        assert_eq!(classify(&input("250")), Some(Classified::Weight(250.0)));
    }

    #[test]
    fn test_out_of_range_weight_falls_through_to_steps() {
        // 8400 is not a plausible weight but is a plausible step count.
        assert_eq!(classify(&input("8400")), Some(Classified::Steps(8400)));
    }

    #[test]
    fn test_out_of_range_everything_is_silent() {
        assert_eq!(classify(&input("29")), None);
        assert_eq!(classify(&input("просто текст")), None);
    }

    #[test]
    fn test_question_wins_over_numbers() {
        assert_eq!(
            classify(&input("сколько я сегодня съел?")),
            Some(Classified::Question(Intent::EatenToday))
        );
    }

    #[test]
    fn test_pending_correction_wins_over_question() {
        let input = ClassifyInput {
            text: "сколько я сегодня съел?",
            has_pending_fix: true,
            reply_to_bot_message: None,
        };
        assert_eq!(
            classify(&input),
            Some(Classified::PendingCorrection(
                "сколько я сегодня съел?".to_string()
            ))
        );
    }

    #[test]
    fn test_reply_correction_carries_ref() {
        let input = ClassifyInput {
            text: "это не пицца, а хачапури",
            has_pending_fix: false,
            reply_to_bot_message: Some(42),
        };
        assert_eq!(
            classify(&input),
            Some(Classified::ReplyCorrection {
                reply_ref: 42,
                correction: "хачапури".to_string()
            })
        );
    }

    #[test]
    fn test_pending_with_long_text_falls_through() {
        let long = "ш".repeat(100);
        let input = ClassifyInput {
            text: &long,
            has_pending_fix: true,
            reply_to_bot_message: None,
        };
        assert_eq!(classify(&input), None);
    }

    #[test]
    fn test_parse_profile_args() {
        assert_eq!(
            parse_profile_args(&["Иван", "180", "79,4"]),
            Some(("Иван".to_string(), 180, 79.4))
        );
        assert_eq!(
            parse_profile_args(&["Анна", "Петровна", "165", "58.2"]),
            Some(("Анна Петровна".to_string(), 165, 58.2))
        );
        // Out-of-range height.
        assert_eq!(parse_profile_args(&["Иван", "80", "79.4"]), None);
        assert_eq!(parse_profile_args(&["Иван", "180"]), None);
    }
}
