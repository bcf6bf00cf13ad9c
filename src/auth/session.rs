use tokio_util::sync::CancellationToken;

use crate::api::models::{
    AuthResponse, LoginRequest, ProfileUpdate, RegisterRequest, SocialLoginRequest,
};
use crate::api::ApiClient;
use crate::sync::{SyncReconciler, SyncTrigger};
use crate::tracker::{AchievementTransition, StepTracker};

use super::error::AuthError;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub message: String,
    /// `false` sends the user to profile setup instead of the dashboard.
    pub profile_completed: bool,
}

#[derive(Clone)]
pub struct AuthSession {
    api: ApiClient,
    reconciler: SyncReconciler,
    tracker: StepTracker,
}

impl AuthSession {
    pub fn new(api: ApiClient, reconciler: SyncReconciler, tracker: StepTracker) -> Self {
        Self {
            api,
            reconciler,
            tracker,
        }
    }

    pub async fn is_logged_in(&self) -> Result<bool, AuthError> {
        Ok(self.tracker.db().token().await?.is_some())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let response = self
            .api
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.establish(response, "Login successful").await
    }

    pub async fn social_login(
        &self,
        request: SocialLoginRequest,
    ) -> Result<LoginOutcome, AuthError> {
        if request.email.trim().is_empty() || request.social_id.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let response = self.api.social_login(&request).await?;
        self.establish(response, "Login successful").await
    }

    /// Create an account. The user signs in separately afterwards.
    pub async fn register(&self, request: RegisterRequest) -> Result<String, AuthError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let response = self.api.register(&request).await?;
        Ok(response
            .message
            .unwrap_or_else(|| "Registration successful".to_string()))
    }

    /// The local token goes first, so the user is signed out on this device
    /// even if the backend call fails.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.tracker.db().clear_token().await?;
        log_info!("signed out");

        if let Err(err) = self.api.logout().await {
            log_warn!("backend logout failed: {err}");
        }
        Ok(())
    }

    pub async fn update_step_target(
        &self,
        step_target: u64,
    ) -> Result<AchievementTransition, AuthError> {
        if step_target == 0 {
            return Err(AuthError::InvalidStepTarget);
        }

        self.api
            .update_profile(&ProfileUpdate {
                step_target: Some(step_target),
                ..ProfileUpdate::default()
            })
            .await?;
        log_info!("step target updated to {step_target}");

        Ok(self.tracker.set_step_target(step_target).await?)
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<(), AuthError> {
        self.api.update_profile(&update).await?;
        if let Some(step_target) = update.step_target.filter(|target| *target > 0) {
            self.tracker.set_step_target(step_target).await?;
        }
        Ok(())
    }

    /// Store the token, then run the login sync: push local steps and pull
    /// profile, today and the weekly series.
    async fn establish(
        &self,
        response: AuthResponse,
        default_message: &str,
    ) -> Result<LoginOutcome, AuthError> {
        let Some(token) = response.token.filter(|token| !token.is_empty()) else {
            return Err(AuthError::Rejected {
                message: response
                    .message
                    .unwrap_or_else(|| "Login failed".to_string()),
            });
        };

        self.tracker.db().set_token(&token).await?;
        log_info!("signed in");

        let report = self
            .reconciler
            .reconcile(SyncTrigger::Login, &CancellationToken::new())
            .await?;
        let profile_completed = report
            .pull
            .and_then(|pull| pull.profile)
            .is_some_and(|profile| profile.profile_completed);

        Ok(LoginOutcome {
            message: response
                .message
                .unwrap_or_else(|| default_message.to_string()),
            profile_completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::ApiConfig;
    use crate::clock::ManualClock;
    use crate::db::Database;
    use crate::models::StepRecord;
    use crate::notifications::{messages, RecordingNotifier};

    struct Fixture {
        session: AuthSession,
        db: Database,
        notifier: Arc<RecordingNotifier>,
    }

    fn fixture(server: &MockServer) -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let clock = Arc::new(ManualClock::at("2024-05-14", "09:00:00"));
        let notifier = Arc::new(RecordingNotifier::default());
        let tracker = StepTracker::new(db.clone(), clock, notifier.clone());
        let api = ApiClient::new(ApiConfig::new(server.uri()), db.clone()).unwrap();
        let reconciler = SyncReconciler::new(api.clone(), tracker.clone());
        Fixture {
            session: AuthSession::new(api, reconciler, tracker),
            db,
            notifier,
        }
    }

    #[tokio::test]
    async fn empty_credentials_never_reach_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let f = fixture(&server);
        let err = f.session.login("  ", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials));
        let err = f.session.login("a@b.c", "").await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials));
    }

    #[tokio::test]
    async fn login_stores_token_and_syncs() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({ "email": "ana@example.com", "password": "pw" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "jwt-1",
                "message": "Welcome back"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/user/steps"))
            .and(header("authorization", "Bearer jwt-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "firstName": "Ana",
                "stepTarget": 6000,
                "profileCompleted": true
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/steps"))
            .and(query_param("date", "2024-05-14"))
            .and(header("authorization", "Bearer jwt-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "stepCount": 300,
                "caloriesBurned": 12.0,
                "distanceKm": 0.24,
                "timeMinutes": 4
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/steps/weekly"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "day": "Tuesday", "stepCount": 300 }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let f = fixture(&server);
        let today = NaiveDate::from_ymd_opt(2024, 5, 14).unwrap();
        f.db.write_step_record(&StepRecord::for_count(today, 120))
            .await
            .unwrap();

        let outcome = f.session.login("ana@example.com", "pw").await.unwrap();
        assert_eq!(
            outcome,
            LoginOutcome {
                message: "Welcome back".into(),
                profile_completed: true
            }
        );
        assert_eq!(f.db.token().await.unwrap().as_deref(), Some("jwt-1"));
        assert_eq!(f.db.step_target().await.unwrap(), 6000);
        assert_eq!(f.db.last_login().await.unwrap(), Some(today));

        let state = f.session.tracker.snapshot().await;
        assert_eq!(state.step_count, 300);
        assert_eq!(state.weekly[1].step_count, 300);
        assert_eq!(f.db.read_step_record().await.unwrap().unwrap().step_count, 120);
    }

    #[tokio::test]
    async fn incomplete_profile_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "jwt-2" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "firstName": "Ana",
                "profileCompleted": false
            })))
            .mount(&server)
            .await;

        let f = fixture(&server);
        let outcome = f.session.login("ana@example.com", "pw").await.unwrap();
        assert_eq!(outcome.message, "Login successful");
        assert!(!outcome.profile_completed);
    }

    #[tokio::test]
    async fn rejected_login_surfaces_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "message": "Invalid credentials" })),
            )
            .mount(&server)
            .await;

        let f = fixture(&server);
        let err = f.session.login("ana@example.com", "nope").await.unwrap_err();
        assert_eq!(err.message(), "Invalid credentials");
        assert!(!f.session.is_logged_in().await.unwrap());
    }

    #[tokio::test]
    async fn response_without_token_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/social-login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "message": "Account disabled" })),
            )
            .mount(&server)
            .await;

        let f = fixture(&server);
        let err = f
            .session
            .social_login(SocialLoginRequest {
                email: "ana@example.com".into(),
                first_name: "Ana".into(),
                last_name: String::new(),
                social_id: "g-123".into(),
                provider: "google".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Rejected { ref message } if message == "Account disabled"));
    }

    #[tokio::test]
    async fn logout_clears_token_even_when_backend_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let f = fixture(&server);
        f.db.set_token("jwt-1").await.unwrap();
        f.session.logout().await.unwrap();
        assert_eq!(f.db.token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn lowering_target_can_achieve_it() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/user/profile"))
            .and(body_json(json!({ "stepTarget": 100 })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let f = fixture(&server);
        let today = NaiveDate::from_ymd_opt(2024, 5, 14).unwrap();
        f.db.write_step_record(&StepRecord::for_count(today, 150))
            .await
            .unwrap();
        f.session.tracker.restore_on_start().await.unwrap();

        let change = f.session.update_step_target(100).await.unwrap();
        assert_eq!(change, AchievementTransition::Achieved);
        assert_eq!(f.notifier.titles(), vec![messages::TARGET_ACHIEVED_TITLE]);
        assert_eq!(f.db.step_target().await.unwrap(), 100);
    }

    #[tokio::test]
    async fn zero_target_is_refused() {
        let server = MockServer::start().await;
        let f = fixture(&server);
        assert!(matches!(
            f.session.update_step_target(0).await,
            Err(AuthError::InvalidStepTarget)
        ));
        assert!(f.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn register_returns_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "message": "Account created" })),
            )
            .mount(&server)
            .await;

        let f = fixture(&server);
        let message = f
            .session
            .register(RegisterRequest {
                first_name: "Ana".into(),
                last_name: "Lima".into(),
                email: "ana@example.com".into(),
                password: "pw".into(),
            })
            .await
            .unwrap();
        assert_eq!(message, "Account created");
    }
}
