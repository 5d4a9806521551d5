//! Agentic mitigation workflow
//!
//! Two stages run in sequence: [`analyze`] asks the reasoning backend for a
//! verdict and applies the deterministic override, then [`mitigate`]
//! triggers response actions gated on the verdict's category. Each stage
//! returns a [`StageUpdate`]; [`WorkflowState::apply`] merges it.

use crate::backend::ReasoningBackend;
use crate::prompt::{agentic_context, system_prompt};
use crate::verdict::{parse_verdict, ModelVerdict, FALLBACK_SCORE, MANUAL_REVIEW};
use sentinel_common::{
    AnalysisMethod, AnalysisResult, LogEntry, PolicyStore, RiskCategory, UNSPECIFIED_IP,
};
use sentinel_soc::{Alert, AlertBroadcaster, MitigationDispatcher};
use thiserror::Error;
use tracing::{info, warn};

/// Step name contributed by [`analyze`]
pub const STEP_ANALYZER: &str = "llm_analyzer";
/// Step name contributed by [`mitigate`]
pub const STEP_MITIGATION: &str = "mitigation_engine";
/// Reasoning prefix applied by the deterministic override
pub const OVERRIDE_PREFIX: &str = "[DETERMINISTIC] Confirmed threat detected: ";
/// Minimum score forced by the deterministic override
pub const OVERRIDE_MIN_SCORE: u8 = 95;

/// Workflow-level failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    /// Mitigation reached without a verdict
    #[error("no verdict available for mitigation")]
    MissingVerdict,
}

/// Collaborators borrowed for one workflow run
#[derive(Clone, Copy)]
pub struct WorkflowContext<'a> {
    /// Policy store
    pub policy: &'a PolicyStore,
    /// Reasoning backend
    pub backend: &'a dyn ReasoningBackend,
    /// Mitigation dispatcher
    pub dispatcher: &'a dyn MitigationDispatcher,
    /// Alert broadcaster
    pub broadcaster: &'a AlertBroadcaster,
}

/// State of one workflow execution
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowState {
    /// Annotated request
    pub log_entry: LogEntry,
    /// Verdict so far
    pub verdict: Option<ModelVerdict>,
    /// Steps executed
    pub steps: Vec<String>,
    /// Mitigation actions taken
    pub actions: Vec<String>,
}

/// Contribution of one stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageUpdate {
    /// Replacement verdict
    pub verdict: Option<ModelVerdict>,
    /// Steps to append
    pub steps: Vec<String>,
    /// Actions to append
    pub actions: Vec<String>,
}

impl WorkflowState {
    /// Initial state for a request
    pub fn new(log_entry: LogEntry) -> Self {
        Self {
            log_entry,
            verdict: None,
            steps: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Merge a stage's contribution
    pub fn apply(mut self, update: StageUpdate) -> Self {
        if update.verdict.is_some() {
            self.verdict = update.verdict;
        }
        self.steps.extend(update.steps);
        self.actions.extend(update.actions);
        self
    }
}

/// Analyze stage: backend verdict plus deterministic override.
///
/// Backend and parse failures become the conservative fallback verdict, so
/// the override still applies when the backend is down.
pub async fn analyze(ctx: &WorkflowContext<'_>, state: &WorkflowState) -> StageUpdate {
    let system = system_prompt(ctx.policy);
    let user = agentic_context(&state.log_entry);

    let verdict = match ctx.backend.invoke(&system, &user).await {
        Ok(raw) => parse_verdict(&raw).unwrap_or_else(|e| {
            warn!(backend = ctx.backend.name(), error = %e, "Unparseable model response");
            ModelVerdict::fallback(format!(
                "Agent failed to parse model response ({}). Defaulting to safe fallback.",
                e
            ))
        }),
        Err(e) => {
            warn!(backend = ctx.backend.name(), error = %e, "Reasoning backend failed");
            ModelVerdict::fallback(format!(
                "Agent could not obtain a model response ({}). Defaulting to safe fallback.",
                e
            ))
        }
    };

    let confirmed = state
        .log_entry
        .pre_analysis
        .as_ref()
        .map_or(false, |pre| pre.is_confirmed_threat());

    StageUpdate {
        verdict: Some(if confirmed { apply_override(verdict) } else { verdict }),
        steps: vec![STEP_ANALYZER.to_string()],
        actions: Vec::new(),
    }
}

/// Force CRITICAL with a score of at least 95
pub fn apply_override(mut verdict: ModelVerdict) -> ModelVerdict {
    verdict.risk_category = RiskCategory::Critical;
    verdict.risk_score = verdict.risk_score.max(OVERRIDE_MIN_SCORE);
    verdict.reasoning = format!("{}{}", OVERRIDE_PREFIX, verdict.reasoning);
    verdict
}

/// Mitigate stage: block, incident and alert, gated on the category
pub async fn mitigate(ctx: &WorkflowContext<'_>, state: &WorkflowState) -> Result<StageUpdate, WorkflowError> {
    let verdict = state.verdict.as_ref().ok_or(WorkflowError::MissingVerdict)?;
    let log = &state.log_entry;
    let mut actions = Vec::new();

    if verdict.risk_category == RiskCategory::Critical {
        let ip = log.ip_address.as_deref().unwrap_or(UNSPECIFIED_IP);
        let ack = ctx.dispatcher.block_ip(ip, &verdict.reasoning).await;
        actions.push(if ack.is_success() {
            format!("Firewall: Blocked IP {}", ip)
        } else {
            format!("Firewall: Block request for IP {} failed", ip)
        });
    }

    if verdict.risk_category.requires_escalation() {
        let user = log.user_or_unknown();
        let ack = ctx.dispatcher.create_incident(user, verdict.risk_category).await;
        actions.push(if ack.is_success() {
            format!("SOC: Created security incident for {}", user)
        } else {
            format!("SOC: Incident creation for {} failed", user)
        });

        let alert = Alert {
            user_id: user.to_string(),
            department: log.department_or_unknown().to_string(),
            request_url: log.request_url.clone(),
            risk_category: verdict.risk_category,
            risk_score: verdict.risk_score,
            reasoning: verdict.reasoning.clone(),
        };
        let report = ctx.broadcaster.broadcast(&alert).await;
        actions.push(format!(
            "Notification: Sent alert to {} channel(s)",
            report.delivered.len()
        ));
    }

    Ok(StageUpdate {
        verdict: None,
        steps: vec![STEP_MITIGATION.to_string()],
        actions,
    })
}

/// Run analyze then mitigate; workflow errors become a fallback result
pub async fn run_workflow(ctx: &WorkflowContext<'_>, log: LogEntry) -> AnalysisResult {
    let method = AnalysisMethod::Agentic(ctx.backend.name().to_string());
    let state = WorkflowState::new(log);

    let update = analyze(ctx, &state).await;
    let state = state.apply(update);

    let mitigated = mitigate(ctx, &state).await;
    let state = match mitigated {
        Ok(update) => state.apply(update),
        Err(e) => return error_result(state.log_entry, &e),
    };

    let WorkflowState {
        log_entry,
        verdict,
        steps,
        actions,
    } = state;
    let Some(verdict) = verdict else {
        return error_result(log_entry, &WorkflowError::MissingVerdict);
    };

    info!(
        user = log_entry.user_or_unknown(),
        risk = %verdict.risk_category,
        score = verdict.risk_score,
        actions = actions.len(),
        "Agentic analysis complete"
    );

    let sensitive = verdict.detected_sensitive_data.clone().unwrap_or_else(|| {
        log_entry
            .pre_analysis
            .as_ref()
            .map(|p| p.detected_sensitive_data.clone())
            .unwrap_or_default()
    });

    let mut result = AnalysisResult::new(log_entry, verdict.risk_category, verdict.risk_score, method)
        .with_reasoning(verdict.reasoning)
        .with_action(verdict.recommended_action)
        .with_sensitive_data(sensitive);
    result.user_message = verdict.user_message;
    result.agent_steps = Some(steps);
    result.mitigation_actions = Some(actions);
    result
}

fn error_result(log_entry: LogEntry, error: &WorkflowError) -> AnalysisResult {
    warn!(error = %error, "Agent workflow failed");
    let mut result = AnalysisResult::new(
        log_entry,
        RiskCategory::MediumRisk,
        FALLBACK_SCORE,
        AnalysisMethod::Fallback,
    )
    .with_reasoning(format!("Agent workflow error: {}", error))
    .with_action(MANUAL_REVIEW)
    .with_error(error.to_string());
    result.agent_steps = Some(vec!["error".to_string()]);
    result.mitigation_actions = Some(Vec::new());
    result
}
