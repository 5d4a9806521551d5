//! Prompt construction

use sentinel_common::{LogEntry, PolicyStore, PreAnalysis};

/// Appended for backends without a native JSON mode
pub const JSON_ONLY_SUFFIX: &str = r#"Respond with ONLY valid JSON in this exact format:
{
  "risk_category": "APPROVED or LOW_RISK or MEDIUM_RISK or HIGH_RISK or CRITICAL",
  "risk_score": 0-100,
  "reasoning": "Brief explanation",
  "detected_sensitive_data": ["list of data types"],
  "recommended_action": "Action to take",
  "user_message": "Message for user or null"
}"#;

/// Analyst system prompt listing the sanctioned and scrutinized services
pub fn system_prompt(policy: &PolicyStore) -> String {
    format!(
        r#"You are an AI security analyst for a leading financial institution.

Your task is to analyze network requests to AI services and assess their security risk level.

APPROVED AI PLATFORMS:
{approved}

EXTERNAL AI SERVICES (require scrutiny):
{external}

RISK ASSESSMENT CRITERIA:
1. Is the endpoint approved by the organization?
2. Does the payload contain sensitive banking data (IBANs, account numbers, customer PII, financial amounts)?
3. What is the user's department sensitivity level?
4. Is the payload size unusually large (potential data dump)?

RESPONSE FORMAT (JSON):
{{
  "risk_category": "APPROVED|LOW_RISK|MEDIUM_RISK|HIGH_RISK|CRITICAL",
  "risk_score": 0-100,
  "reasoning": "Brief explanation of the risk assessment",
  "detected_sensitive_data": ["list of sensitive data types found"],
  "recommended_action": "Action to take",
  "user_message": "Friendly message to educate the user (if applicable)"
}}

Be strict but fair. The goal is to protect the organization's data while supporting legitimate AI use.
"#,
        approved = policy.approved_domains().join(", "),
        external = policy.external_ai_services().join(", "),
    )
}

/// Request context for a single model analysis
pub fn request_context(log: &LogEntry, pre: &PreAnalysis) -> String {
    let sensitive = if pre.detected_sensitive_data.is_empty() {
        "None".to_string()
    } else {
        pre.detected_sensitive_data.join(", ")
    };

    format!(
        r#"
NETWORK REQUEST DETAILS:
- URL: {url}
- User: {user}
- Department: {department} (Risk Level: {tier})
- Payload Size: {size} KB
- Payload Content: "{payload}"
- Pre-detected Sensitive Data: {sensitive}

Analyze this request and provide a risk assessment.
"#,
        url = log.request_url,
        user = log.user_or_unknown(),
        department = log.department_or_unknown(),
        tier = pre.department_sensitivity.as_str(),
        size = log.payload_size_kb,
        payload = log.payload_snippet,
        sensitive = sensitive,
    )
}

/// Request context for the agentic analyzer: the annotated entry as JSON
/// followed by the pre-detection evidence.
pub fn agentic_context(log: &LogEntry) -> String {
    let rendered = serde_json::to_string_pretty(log).unwrap_or_else(|_| log.request_url.clone());
    let mut content = format!("Analyze this request: {}\n", rendered);

    if let Some(pre) = &log.pre_analysis {
        content.push_str("\nPRE-DETECTION METADATA:\n");
        if pre.is_known_malicious {
            content.push_str("- LOCAL POLICY: Domain is on known MALICIOUS list.\n");
        }
        if pre.threat_intel_flagged {
            content.push_str(&format!(
                "- THREAT INTEL: Flagged as malicious ({})\n",
                pre.threat_intel_evidence
            ));
        }
        if pre.has_sensitive_data() {
            content.push_str(&format!(
                "- SENSITIVE DATA: Identified {}\n",
                pre.detected_sensitive_data.join(", ")
            ));
        }
        content.push_str(&format!(
            "- DEPARTMENT: {}\n",
            pre.department_sensitivity.as_str()
        ));
    }

    content
}
