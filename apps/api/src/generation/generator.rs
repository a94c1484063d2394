//! Generation pipeline: validate → entitlement → throttle → LLM → record.
//!
//! Quota is charged only after the completion call has returned text, so a
//! failed or empty generation leaves the throttle window untouched. Everything
//! from the throttle check to the history write runs under one lock, so
//! concurrent submissions cannot overshoot the window.

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::entitlement::EntitlementGate;
use crate::errors::AppError;
use crate::generation::form::CoverLetterForm;
use crate::generation::prompts::{build_system_prompt, build_user_prompt};
use crate::history::{HistoryList, NewHistoryEntry};
use crate::llm_client::{CompletionClient, TokenUsage};
use crate::throttle::{RequestThrottle, ThrottleDecision};

/// Everything the pipeline touches.
pub struct GenerationContext<'a> {
    pub gate: &'a EntitlementGate,
    pub throttle: &'a RequestThrottle,
    pub history: &'a HistoryList,
    pub llm: &'a dyn CompletionClient,
    /// Held from the throttle check until the letter is recorded.
    pub lock: &'a Mutex<()>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub cover_letter: String,
    pub usage: TokenUsage,
    /// Quota left in the current window after this generation.
    pub remaining_requests: u32,
    /// `None` if the letter could not be saved to history.
    pub history_id: Option<String>,
}

pub async fn generate_cover_letter(
    ctx: GenerationContext<'_>,
    form: CoverLetterForm,
) -> Result<GenerationOutcome, AppError> {
    form.validate().map_err(AppError::InvalidForm)?;

    let _in_flight = ctx.lock.lock().await;
    debug!("Generation lock acquired");

    if !ctx.gate.check_status() {
        return Err(AppError::PaymentRequired);
    }

    if let ThrottleDecision::Denied { reset_in_minutes } = ctx.throttle.check_limit() {
        return Err(AppError::ThrottleExceeded { reset_in_minutes });
    }

    let system = build_system_prompt(&form);
    let prompt = build_user_prompt(&form);

    let completion = ctx.llm.complete(&system, &prompt).await?;

    if let Err(e) = ctx.throttle.record_request() {
        warn!("Generation succeeded but quota could not be recorded: {e}");
    }

    let history_id = match ctx.history.record(NewHistoryEntry {
        cover_letter: completion.text.clone(),
        job_title: form.job_title.trim().to_string(),
        company_name: form.company_name.trim().to_string(),
    }) {
        Ok(entry) => Some(entry.id),
        Err(e) => {
            warn!("Generation succeeded but history could not be saved: {e}");
            None
        }
    };

    let remaining_requests = ctx.throttle.remaining_requests();
    info!(
        "Cover letter generated for '{}' at '{}' ({} tokens, {} requests left)",
        form.job_title.trim(),
        form.company_name.trim(),
        completion.usage.total_tokens,
        remaining_requests
    );

    Ok(GenerationOutcome {
        cover_letter: completion.text,
        usage: completion.usage,
        remaining_requests,
        history_id,
    })
}
