//! Backend verdict parsing
//!
//! Backend text is untrusted. The first well-formed JSON object is taken
//! from the response (surrounding prose and code fences are skipped) and
//! every field is validated before it becomes a verdict.

use sentinel_common::RiskCategory;
use serde_json::{Map, Value};
use thiserror::Error;

/// Recommended action attached to every conservative fallback
pub const MANUAL_REVIEW: &str = "Manual review required";

/// Score used for conservative fallbacks
pub const FALLBACK_SCORE: u8 = 50;

/// Verdict parse error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerdictError {
    /// No JSON object anywhere in the text
    #[error("no JSON object in response")]
    NoJson,

    /// Required field absent
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    /// Field present with the wrong type or value
    #[error("invalid field '{field}': {reason}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// What was wrong
        reason: String,
    },
}

/// Validated model verdict
#[derive(Debug, Clone, PartialEq)]
pub struct ModelVerdict {
    /// Risk category
    pub risk_category: RiskCategory,
    /// Score 0-100
    pub risk_score: u8,
    /// Reasoning
    pub reasoning: String,
    /// Sensitive data labels reported by the model, when present
    pub detected_sensitive_data: Option<Vec<String>>,
    /// Recommended action
    pub recommended_action: String,
    /// Message for the user
    pub user_message: Option<String>,
}

impl ModelVerdict {
    /// Conservative MEDIUM_RISK verdict
    pub fn fallback(reasoning: impl Into<String>) -> Self {
        Self {
            risk_category: RiskCategory::MediumRisk,
            risk_score: FALLBACK_SCORE,
            reasoning: reasoning.into(),
            detected_sensitive_data: None,
            recommended_action: MANUAL_REVIEW.to_string(),
            user_message: None,
        }
    }
}

/// Parse a backend response into a verdict
pub fn parse_verdict(raw: &str) -> Result<ModelVerdict, VerdictError> {
    let object = first_json_object(raw).ok_or(VerdictError::NoJson)?;
    validate(&object)
}

/// Opening braces tried before giving up on a response
const MAX_JSON_CANDIDATES: usize = 16;

/// First position in the text where a complete JSON object parses
fn first_json_object(raw: &str) -> Option<Map<String, Value>> {
    raw.char_indices()
        .filter(|(_, c)| *c == '{')
        .take(MAX_JSON_CANDIDATES)
        .find_map(|(start, _)| {
            let mut stream = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<Value>();
            match stream.next() {
                Some(Ok(Value::Object(map))) => Some(map),
                _ => None,
            }
        })
}

fn validate(object: &Map<String, Value>) -> Result<ModelVerdict, VerdictError> {
    let category_raw = object
        .get("risk_category")
        .ok_or(VerdictError::MissingField("risk_category"))?
        .as_str()
        .ok_or_else(|| invalid("risk_category", "not a string"))?;
    let risk_category: RiskCategory = category_raw
        .parse()
        .map_err(|e: String| invalid("risk_category", e))?;

    let risk_score = parse_score(object.get("risk_score").ok_or(VerdictError::MissingField("risk_score"))?)?;

    let reasoning = optional_string(object, "reasoning")?.unwrap_or_default();
    let recommended_action = optional_string(object, "recommended_action")?
        .unwrap_or_else(|| risk_category.default_action().to_string());
    let user_message = optional_string(object, "user_message")?;

    let detected_sensitive_data = match object.get("detected_sensitive_data") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| invalid("detected_sensitive_data", "non-string entry"))
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Some(_) => return Err(invalid("detected_sensitive_data", "not an array")),
    };

    Ok(ModelVerdict {
        risk_category,
        risk_score,
        reasoning,
        detected_sensitive_data,
        recommended_action,
        user_message,
    })
}

/// Integer 0-100; integral floats (`80.0`) and numeric strings are accepted
fn parse_score(value: &Value) -> Result<u8, VerdictError> {
    let number = match value {
        Value::Number(n) => match n.as_u64() {
            Some(v) => v as f64,
            None => n.as_f64().ok_or_else(|| invalid("risk_score", "not a number"))?,
        },
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid("risk_score", format!("'{}' is not a number", s)))?,
        _ => return Err(invalid("risk_score", "not a number")),
    };

    if number.fract() != 0.0 || !(0.0..=100.0).contains(&number) {
        return Err(invalid("risk_score", format!("{} is not an integer in 0-100", number)));
    }
    Ok(number as u8)
}

fn optional_string(object: &Map<String, Value>, field: &'static str) -> Result<Option<String>, VerdictError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(invalid(field, "not a string")),
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> VerdictError {
    VerdictError::InvalidField {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = r#"{"risk_category": "HIGH_RISK", "risk_score": 82, "reasoning": "IBAN to external AI", "detected_sensitive_data": ["iban"], "recommended_action": "Block", "user_message": null}"#;

    #[test]
    fn test_plain_json() {
        let verdict = parse_verdict(PLAIN).unwrap();
        assert_eq!(verdict.risk_category, RiskCategory::HighRisk);
        assert_eq!(verdict.risk_score, 82);
        assert_eq!(verdict.detected_sensitive_data, Some(vec!["iban".to_string()]));
        assert_eq!(verdict.user_message, None);
    }

    #[test]
    fn test_code_fence_and_prose() {
        let raw = format!("Sure! Here is my assessment:\n```json\n{}\n```\nLet me know.", PLAIN);
        assert_eq!(parse_verdict(&raw).unwrap().risk_score, 82);
    }

    #[test]
    fn test_skips_braces_in_prose() {
        let raw = "Using template {risk} below: {\"risk_category\": \"low risk\", \"risk_score\": 30}";
        let verdict = parse_verdict(raw).unwrap();
        assert_eq!(verdict.risk_category, RiskCategory::LowRisk);
        assert_eq!(verdict.recommended_action, "Monitor");
        assert_eq!(verdict.reasoning, "");
    }

    #[test]
    fn test_brace_flood_gives_up() {
        let flood = "{".repeat(50_000);
        assert_eq!(parse_verdict(&flood), Err(VerdictError::NoJson));

        // An object past the candidate limit is not searched for
        let late = format!("{}{}", "{ ".repeat(MAX_JSON_CANDIDATES), PLAIN);
        assert_eq!(parse_verdict(&late), Err(VerdictError::NoJson));
    }

    #[test]
    fn test_no_json() {
        assert_eq!(parse_verdict("I cannot help with that."), Err(VerdictError::NoJson));
        assert_eq!(parse_verdict("{ broken"), Err(VerdictError::NoJson));
    }

    #[test]
    fn test_invalid_fields() {
        assert!(matches!(
            parse_verdict(r#"{"risk_score": 10}"#),
            Err(VerdictError::MissingField("risk_category"))
        ));
        assert!(matches!(
            parse_verdict(r#"{"risk_category": "SEVERE", "risk_score": 10}"#),
            Err(VerdictError::InvalidField { field: "risk_category", .. })
        ));
        assert!(matches!(
            parse_verdict(r#"{"risk_category": "CRITICAL", "risk_score": 150}"#),
            Err(VerdictError::InvalidField { field: "risk_score", .. })
        ));
        assert!(matches!(
            parse_verdict(r#"{"risk_category": "CRITICAL", "risk_score": 90.5}"#),
            Err(VerdictError::InvalidField { field: "risk_score", .. })
        ));
        assert!(matches!(
            parse_verdict(r#"{"risk_category": "CRITICAL", "risk_score": 90, "reasoning": 7}"#),
            Err(VerdictError::InvalidField { field: "reasoning", .. })
        ));
    }

    #[test]
    fn test_lenient_score_forms() {
        let verdict = parse_verdict(r#"{"risk_category": "CRITICAL", "risk_score": "97"}"#).unwrap();
        assert_eq!(verdict.risk_score, 97);
        let verdict = parse_verdict(r#"{"risk_category": "APPROVED", "risk_score": 5.0}"#).unwrap();
        assert_eq!(verdict.risk_score, 5);
    }

    #[test]
    fn test_fallback() {
        let verdict = ModelVerdict::fallback("parse failed");
        assert_eq!(verdict.risk_category, RiskCategory::MediumRisk);
        assert_eq!(verdict.risk_score, 50);
        assert_eq!(verdict.recommended_action, "Manual review required");
    }
}
