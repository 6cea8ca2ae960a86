// ABOUTME: AI judgment client scoring daily wellness batteries via Gemini
// ABOUTME: Falls back to neutral baseline verdicts when unconfigured or failing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

//! # Gamification Judge
//!
//! Scores the four daily wellness batteries (activity, nutrition, health,
//! sleep) from a context snapshot of the user's day. The production judge
//! calls the Generative Language API; callers treat the judge as a
//! best-effort side channel and substitute [`fallback_verdict`] whenever the
//! call fails, so gamification refreshes never depend on its availability.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use crate::config::JudgeConfig;
use crate::constants::gamification::FALLBACK_BATTERY_LEVEL;
use crate::errors::{AppError, AppResult};
use crate::models::{ActivityLevel, Gender};

/// Service name used in upstream error messages
const JUDGE_SERVICE: &str = "gemini";

/// Daily context snapshot handed to the judge
///
/// Field names are camel-cased because the snapshot is embedded verbatim in
/// the prompt text.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeContext {
    pub user_profile: ProfileContext,
    pub activity: ActivityContext,
    pub nutrition: NutritionContext,
    pub sleep: SleepContext,
}

/// Demographic and health profile fields the judge weighs
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileContext {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub bmi: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub health_conditions: Vec<String>,
}

/// Today's session totals, rounded to whole units
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityContext {
    pub calories_burned: i64,
    pub active_minutes: i64,
}

/// Today's food log digest
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionContext {
    pub total_calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub items: Vec<String>,
}

/// Sleep habit from the profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepContext {
    pub average_hours: f64,
}

/// The judge's scored verdict, all levels clamped to 0..=100
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JudgeVerdict {
    pub activity: u8,
    pub nutrition: u8,
    pub health: u8,
    pub sleep: u8,
    pub reasoning: String,
}

/// Neutral verdict used whenever no real judgment is available
#[must_use]
pub fn fallback_verdict() -> JudgeVerdict {
    JudgeVerdict {
        activity: FALLBACK_BATTERY_LEVEL,
        nutrition: FALLBACK_BATTERY_LEVEL,
        health: FALLBACK_BATTERY_LEVEL,
        sleep: FALLBACK_BATTERY_LEVEL,
        reasoning: "AI judgment unavailable; baseline scores applied.".to_owned(),
    }
}

/// Scores a daily context into battery levels
#[async_trait]
pub trait GamificationJudge: Send + Sync {
    /// Judge one day of user context
    async fn evaluate(&self, context: &JudgeContext) -> AppResult<JudgeVerdict>;
}

/// Build the configured judge, or the disabled stand-in without an API key
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed
pub fn judge_from_config(config: &JudgeConfig) -> AppResult<Arc<dyn GamificationJudge>> {
    match config.api_key.as_deref() {
        Some(key) if !key.is_empty() => {
            let judge = GeminiJudge::new(
                key.to_owned(),
                config.model.clone(),
                config.base_url.clone(),
                Duration::from_secs(config.timeout_secs),
            )?;
            Ok(Arc::new(judge))
        }
        _ => {
            warn!("no judge API key configured, battery verdicts use the baseline fallback");
            Ok(Arc::new(DisabledJudge))
        }
    }
}

// ============================================================================
// API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Verdict shape as the model emits it; levels may be missing or fractional
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawVerdict {
    activity: f64,
    nutrition: f64,
    health: f64,
    sleep: f64,
    reasoning: Option<String>,
}

impl Default for RawVerdict {
    fn default() -> Self {
        Self {
            activity: 0.0,
            nutrition: 0.0,
            health: 0.0,
            sleep: 0.0,
            reasoning: None,
        }
    }
}

// ============================================================================
// Judge Implementations
// ============================================================================

/// Judge backed by the Generative Language API
pub struct GeminiJudge {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiJudge {
    /// Create a judge with an explicit key, model, endpoint, and timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::config(format!("judge HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key,
            model,
            base_url,
        })
    }

    fn build_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

#[async_trait]
impl GamificationJudge for GeminiJudge {
    #[instrument(skip(self, context), fields(model = %self.model))]
    async fn evaluate(&self, context: &JudgeContext) -> AppResult<JudgeVerdict> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![TextPart {
                    text: build_prompt(context)?,
                }],
            }],
        };

        debug!("requesting battery verdict");

        let response = self
            .client
            .post(self.build_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::upstream(JUDGE_SERVICE, format!("request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::upstream(JUDGE_SERVICE, format!("reading response failed: {e}"))
        })?;

        if !status.is_success() {
            error!(status = %status, "judge API call failed");
            return Err(map_api_error(status.as_u16(), &body));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "judge response not parseable");
            AppError::upstream(JUDGE_SERVICE, format!("malformed response: {e}"))
        })?;

        if let Some(api_error) = parsed.error {
            return Err(AppError::upstream(JUDGE_SERVICE, api_error.message));
        }

        let text = extract_text(&parsed)?;
        parse_verdict(&text)
    }
}

impl Debug for GeminiJudge {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiJudge")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Stand-in judge used when no API key is configured
///
/// Always succeeds with the baseline verdict so a missing key downgrades the
/// feature instead of failing refreshes.
#[derive(Debug, Clone, Copy)]
pub struct DisabledJudge;

#[async_trait]
impl GamificationJudge for DisabledJudge {
    async fn evaluate(&self, _context: &JudgeContext) -> AppResult<JudgeVerdict> {
        Ok(fallback_verdict())
    }
}

// ============================================================================
// Prompt and Verdict Handling
// ============================================================================

fn build_prompt(context: &JudgeContext) -> AppResult<String> {
    let snapshot = serde_json::to_string_pretty(context)?;
    Ok(format!(
        r#"You are a health and fitness expert. Judge the user's daily performance on a scale of 0 to 100 for four categories: activity, nutrition, health, and sleep.

CONTEXT DATA:
{snapshot}

SCORING CRITERIA:
1. Activity: calories burned and active time relative to the user's profile; above 500 active calories is usually strong.
2. Nutrition: food choices, macro balance, and caloric intake against the goal.
3. Health: BMI status, known conditions, and overall risk factors.
4. Sleep: hours slept, with 7 to 9 being ideal.

OUTPUT FORMAT:
Return ONLY a JSON object with integer scores (0-100) and a brief reasoning string:
{{"activity": 85, "nutrition": 70, "health": 60, "sleep": 90, "reasoning": "Activity was high because..."}}"#
    ))
}

fn extract_text(response: &GenerateResponse) -> AppResult<String> {
    response
        .candidates
        .as_ref()
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.content.as_ref())
        .and_then(|content| content.parts.as_ref())
        .and_then(|parts| parts.first())
        .and_then(|part| part.text.clone())
        .ok_or_else(|| AppError::upstream(JUDGE_SERVICE, "response carried no text"))
}

/// Parse the model's verdict text, tolerating markdown fences and fractional
/// or missing levels
fn parse_verdict(text: &str) -> AppResult<JudgeVerdict> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let raw: RawVerdict = serde_json::from_str(cleaned.trim())
        .map_err(|e| AppError::upstream(JUDGE_SERVICE, format!("unparseable verdict: {e}")))?;

    Ok(JudgeVerdict {
        activity: clamp_level(raw.activity),
        nutrition: clamp_level(raw.nutrition),
        health: clamp_level(raw.health),
        sleep: clamp_level(raw.sleep),
        reasoning: raw.reasoning.unwrap_or_default(),
    })
}

fn clamp_level(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn map_api_error(status: u16, body: &str) -> AppError {
    let message = serde_json::from_str::<GenerateResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .map_or_else(|| body.to_owned(), |e| e.message);
    AppError::upstream(JUDGE_SERVICE, format!("API error ({status}): {message}"))
}
