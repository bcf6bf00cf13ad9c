//! Request and response bodies. Field names follow the backend's camelCase.

use serde::{Deserialize, Serialize};

use crate::models::DEFAULT_STEP_TARGET;

/// `GET /user/me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub step_target: Option<u64>,
    #[serde(default)]
    pub profile_completed: bool,
}

impl UserProfile {
    /// Profile target, or the default when unset or zero.
    pub fn effective_step_target(&self) -> u64 {
        self.step_target
            .filter(|target| *target > 0)
            .unwrap_or(DEFAULT_STEP_TARGET)
    }
}

/// `GET /user/steps?date=YYYY-MM-DD`. Missing fields read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TodaySummary {
    pub step_count: u64,
    pub calories_burned: f64,
    pub distance_km: f64,
    pub time_minutes: f64,
}

/// One entry of `GET /user/steps/weekly`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyEntry {
    pub day: String,
    #[serde(default)]
    pub step_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Identity handed over by an external sign-in provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLoginRequest {
    pub email: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub social_id: String,
    pub provider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// `POST /auth/login`, `/auth/social-login`, `/auth/register`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AuthResponse {
    pub token: Option<String>,
    pub message: Option<String>,
}

/// `PUT /user/profile`. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_target: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_calorie_goal: Option<u64>,
}
