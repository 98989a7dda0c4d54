//! Pipeline orchestration.
//!
//! One invocation per submission, detached from the HTTP response. Stages
//! run in a fixed order with a fixed failure policy: every stage failure is
//! logged and accumulated, no stage failure aborts the run, and steps that
//! need an id from a failed step are skipped. `success` is true only when
//! the error list is empty; partial results are always returned.

use crate::handlers::AppState;
use crate::models::{EvaluationResult, LeadSubmission};
use crate::notifications::NotificationDispatcher;
use crate::recorder::CrmRecorder;
use crate::scoring::score_lead;
use crate::{research, style_guide};
use std::sync::Arc;
use uuid::Uuid;

/// Spawns a detached evaluation for a submission and returns its id. The
/// caller responds to the HTTP client immediately; the pipeline keeps
/// running in the background.
pub fn spawn_evaluation(state: Arc<AppState>, submission: LeadSubmission) -> Uuid {
    let evaluation_id = Uuid::new_v4();

    tokio::spawn(async move {
        let company = submission.company.clone();
        let result = evaluate_lead(state, submission, evaluation_id, None).await;

        if result.success {
            tracing::info!(
                "Evaluation {} for {} completed cleanly (score: {:?})",
                evaluation_id,
                company,
                result.score.as_ref().map(|s| s.total)
            );
        } else {
            tracing::warn!(
                "Evaluation {} for {} completed with {} error(s): {:?}",
                evaluation_id,
                company,
                result.errors.len(),
                result.errors
            );
        }
    });

    evaluation_id
}

/// Runs the full evaluation pipeline for one submission.
///
/// `existing_client_id` short-circuits the Client find-or-create when the
/// caller already knows the CRM record (the machine import endpoint).
pub async fn evaluate_lead(
    state: Arc<AppState>,
    submission: LeadSubmission,
    evaluation_id: Uuid,
    existing_client_id: Option<String>,
) -> EvaluationResult {
    let mut result = EvaluationResult::new(evaluation_id);
    tracing::info!(
        "Starting evaluation {} for {}",
        evaluation_id,
        submission.company
    );

    // Stage 1: instant acknowledgment. Fired before anything else and not
    // awaited until the end, so the lead's inbox sees it regardless of how
    // long the rest of the pipeline takes.
    let ack_state = state.clone();
    let ack_submission = submission.clone();
    let ack_handle = tokio::spawn(async move {
        NotificationDispatcher::new(&ack_state.postmark, &ack_state.config)
            .send_acknowledgment(&ack_submission)
            .await
    });

    // Stage 2: score. Pure and total; cannot fail.
    tracing::info!("Stage 2: scoring");
    let score = Some(score_lead(&submission));

    // Stage 3: web presence. Degrades internally, never errors.
    tracing::info!("Stage 3: web presence analysis");
    let presence = Some(state.presence.analyze(&submission).await);

    // Stage 4: research enrichment.
    tracing::info!("Stage 4: research enrichment");
    let research_result = match research::research_lead(
        state.openai.as_ref(),
        &submission,
        score.as_ref(),
        presence.as_ref(),
    )
    .await
    {
        Ok(research) => research,
        Err(e) => {
            tracing::error!("Research enrichment failed: {}", e);
            result.errors.push(format!("Research enrichment: {}", e));
            None
        }
    };

    let recorder = CrmRecorder::new(&state.notion, &state.config);

    // Stage 5: client find-or-create, then contact and intake form.
    tracing::info!("Stage 5: CRM client, contact, intake form");
    let (client_id, client_created) = match existing_client_id {
        Some(id) => (Some(id), false),
        None => match recorder.find_or_create_client(&submission).await {
            Ok((page, created)) => (Some(page.id), created),
            Err(e) => {
                tracing::error!("Client find-or-create failed: {}", e);
                result.errors.push(format!("Client find-or-create: {}", e));
                (None, false)
            }
        },
    };
    result.crm.client_id = client_id.clone();
    result.crm.client_created = client_created;

    let contact_id = match client_id.as_deref() {
        Some(cid) => match recorder.create_contact(&submission, cid).await {
            Ok(page) => Some(page.id),
            Err(e) => {
                tracing::error!("Contact create failed: {}", e);
                result.errors.push(format!("Contact create: {}", e));
                None
            }
        },
        // a Contact must not exist without a Client
        None => {
            tracing::warn!("Skipping contact create: no client id");
            None
        }
    };
    result.crm.contact_id = contact_id.clone();

    match recorder
        .create_intake_form(
            &submission,
            score.as_ref(),
            presence.as_ref(),
            client_id.as_deref(),
        )
        .await
    {
        Ok((page, follow_up)) => {
            result.crm.intake_id = Some(page.id);
            result.follow_up_date = Some(follow_up);
        }
        Err(e) => {
            tracing::error!("Intake form create failed: {}", e);
            result.errors.push(format!("Intake form create: {}", e));
        }
    }

    // Stage 6: style guides, then their CRM records.
    tracing::info!("Stage 6: style guides");
    let guides = match style_guide::generate_style_guides(
        state.openai.as_ref(),
        &submission,
        research_result.as_ref(),
    )
    .await
    {
        Ok(guides) => guides,
        Err(e) => {
            tracing::error!("Style guide generation failed: {}", e);
            result.errors.push(format!("Style guide generation: {}", e));
            None
        }
    };

    if let Some(set) = &guides {
        match client_id.as_deref() {
            Some(cid) => {
                match recorder
                    .create_company_guide_record(&submission, &set.company_guide, cid)
                    .await
                {
                    Ok(page) => result.crm.company_guide_id = Some(page.id),
                    Err(e) => {
                        tracing::error!("Company guide record failed: {}", e);
                        result.errors.push(format!("Company guide record: {}", e));
                    }
                }
            }
            None => tracing::warn!("Skipping company guide record: no client id"),
        }

        match contact_id.as_deref() {
            Some(cid) => {
                match recorder
                    .create_contact_guide_record(&submission, &set.contact_guide, cid)
                    .await
                {
                    Ok(page) => result.crm.contact_guide_id = Some(page.id),
                    Err(e) => {
                        tracing::error!("Contact guide record failed: {}", e);
                        result.errors.push(format!("Contact guide record: {}", e));
                    }
                }
            }
            None => tracing::warn!("Skipping contact guide record: no contact id"),
        }
    }

    // Stage 7: proposal and estimates.
    tracing::info!("Stage 7: proposal and estimates");
    match recorder
        .create_proposal(
            &submission,
            score.as_ref(),
            research_result.as_ref(),
            client_id.as_deref(),
        )
        .await
    {
        Ok(page) => {
            let (estimate_ids, estimate_errors) =
                recorder.create_estimates(&submission, &page.id).await;
            result.crm.proposal_id = Some(page.id);
            result.crm.estimate_ids = estimate_ids;
            result.errors.extend(estimate_errors);
        }
        Err(e) => {
            tracing::error!("Proposal create failed: {}", e);
            result.errors.push(format!("Proposal create: {}", e));
            tracing::warn!("Skipping estimates: no proposal id");
        }
    }

    // Stage 8: sales notification, built from whatever is present.
    tracing::info!("Stage 8: sales notification");
    let dispatcher = NotificationDispatcher::new(&state.postmark, &state.config);
    if let Err(e) = dispatcher
        .send_sales_notification(
            &submission,
            score.as_ref(),
            presence.as_ref(),
            research_result.as_ref(),
            guides.as_ref(),
        )
        .await
    {
        tracing::error!("Sales notification failed: {}", e);
        result.errors.push(format!("Sales notification: {}", e));
    }

    // Drain the acknowledgment task so its outcome lands in the error list
    // deterministically.
    match ack_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!("Acknowledgment email failed: {}", e);
            result.errors.push(format!("Acknowledgment email: {}", e));
        }
        Err(e) => {
            tracing::error!("Acknowledgment task panicked: {}", e);
            result.errors.push(format!("Acknowledgment task: {}", e));
        }
    }

    result.score = score;
    result.web_presence = presence;
    result.research = research_result;
    result.style_guides = guides;
    result.success = result.errors.is_empty();

    result
}
