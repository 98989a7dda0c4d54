use crate::config::Config;
use crate::errors::AppError;
use crate::models::{IntakeAccepted, LeadSubmission};
use crate::pipeline;
use crate::services::{NotionService, OpenAiService, PostmarkService};
use crate::web_presence::WebPresenceAnalyzer;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
///
/// External clients are constructed once at startup and injected here; no
/// handler or pipeline stage builds its own client from the environment.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Generative text service client (absent when unconfigured).
    pub openai: Option<OpenAiService>,
    /// CRM client.
    pub notion: NotionService,
    /// Transactional email client.
    pub postmark: PostmarkService,
    /// Website/social reachability analyzer.
    pub presence: WebPresenceAnalyzer,
    /// Short-TTL dedup cache keyed by submission fingerprint, so a rapid
    /// duplicate submit does not start a second pipeline run.
    pub recent_submission_cache: Cache<String, Uuid>,
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "service": "lead-intake-api",
            "version": "0.1.0"
        })),
    )
}

/// POST /api/v1/leads
///
/// Public intake endpoint. Validates the submission, then responds 202
/// before the evaluation pipeline completes; the pipeline runs detached.
pub async fn submit_lead(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<IntakeAccepted>), AppError> {
    let submission = parse_submission(body)?;
    accept_submission(state, submission).await
}

/// POST /api/v1/leads/import
///
/// Machine-facing variant of the intake endpoint. Requires the shared
/// `X-Api-Key` header; rejects with 401 on mismatch or when no key is
/// configured.
pub async fn import_lead(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<IntakeAccepted>), AppError> {
    validate_api_key(&state, &headers)?;
    let submission = parse_submission(body)?;
    accept_submission(state, submission).await
}

fn parse_submission(body: serde_json::Value) -> Result<LeadSubmission, AppError> {
    let submission: LeadSubmission = serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid submission: {}", e)))?;
    submission.validate()?;
    Ok(submission)
}

async fn accept_submission(
    state: Arc<AppState>,
    submission: LeadSubmission,
) -> Result<(StatusCode, Json<IntakeAccepted>), AppError> {
    let fingerprint = submission_fingerprint(&submission.email, &submission.company);

    if let Some(previous) = state.recent_submission_cache.get(&fingerprint).await {
        tracing::info!(
            "Duplicate submission for {} within dedup window, reusing evaluation {}",
            submission.company,
            previous
        );
        return Ok((
            StatusCode::ACCEPTED,
            Json(IntakeAccepted {
                success: true,
                redirect_to: "/thank-you".to_string(),
                evaluation_id: previous,
            }),
        ));
    }

    tracing::info!(
        "Accepted submission from {} ({})",
        submission.name,
        submission.company
    );

    let evaluation_id = pipeline::spawn_evaluation(state.clone(), submission);
    state
        .recent_submission_cache
        .insert(fingerprint, evaluation_id)
        .await;

    Ok((
        StatusCode::ACCEPTED,
        Json(IntakeAccepted {
            success: true,
            redirect_to: "/thank-you".to_string(),
            evaluation_id,
        }),
    ))
}

/// Validate the shared key on the import endpoint. Fails closed: an unset
/// key rejects everything.
fn validate_api_key(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(ref expected) = state.config.intake_api_key else {
        return Err(AppError::Unauthorized(
            "Import endpoint disabled: no API key configured".to_string(),
        ));
    };

    let provided = headers
        .get("X-Api-Key")
        .or_else(|| headers.get("x-api-key"))
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing X-Api-Key header".to_string()))?;

    // Constant-time comparison to prevent timing attacks
    if !constant_time_compare(provided, expected) {
        tracing::warn!("Invalid API key on import endpoint");
        return Err(AppError::Unauthorized("Invalid API key".to_string()));
    }

    Ok(())
}

/// Constant-time string comparison (basic implementation)
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.as_bytes()
        .iter()
        .zip(b.as_bytes().iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Stable dedup key for a submission: SHA-256 over the lowercased email and
/// the company name. Raw contact details never become cache keys.
pub fn submission_fingerprint(email: &str, company: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.trim().to_lowercase().as_bytes());
    hasher.update(b"|");
    hasher.update(company.trim().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_and_case_insensitive_on_email() {
        let a = submission_fingerprint("Jane@Acme.test", "Acme");
        let b = submission_fingerprint("jane@acme.test", "Acme");
        let c = submission_fingerprint("jane@acme.test", "acme");
        assert_eq!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn constant_time_compare_checks_content_and_length() {
        assert!(constant_time_compare("secret", "secret"));
        assert!(!constant_time_compare("secret", "secreT"));
        assert!(!constant_time_compare("secret", "secrets"));
    }
}
