use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

use ai_client::util::strip_code_fence;
use ai_client::{AiClientError, LmStudio};
use mlmradar_common::{CanonicalPostRecord, Classification, Verdict};

const SAMPLING_TEMPERATURE: f32 = 0.1;

/// How the system instruction asks the model to shape its `reasoning` key.
/// The live endpoint asks for a structured per-factor object; the evaluation
/// harness asks for a brief string that is easier to post-process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningFormat {
    Structured,
    Brief,
}

/// One prompt builder for both call sites; only the reasoning instruction
/// varies.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    reasoning: ReasoningFormat,
}

impl PromptTemplate {
    pub fn new(reasoning: ReasoningFormat) -> Self {
        Self { reasoning }
    }

    pub fn system_instruction(&self) -> String {
        let reasoning_line = match self.reasoning {
            ReasoningFormat::Structured => {
                "- 'reasoning': An object containing detailed explanations for different factors contributing to your verdict."
            }
            ReasoningFormat::Brief => "- 'reasoning': A brief explanation for your verdict.",
        };
        format!(
            "You are an expert in identifying multi-level marketing (MLM) schemes. \
             Analyze the given social media post for characteristics of MLM and provide \
             your response in valid JSON format only. Do not include code block markers \
             or additional text outside the JSON. The JSON object must include the \
             following keys:\n\
             - 'verdict': A 'Yes' or 'No' indicating if the content is MLM.\n\
             - 'certainty': A percentage (0-100) representing how certain you are.\n\
             {reasoning_line}"
        )
    }

    /// Flatten the canonical record into the user prompt. Only top-level
    /// comment text is included; reply text does not reach the model.
    pub fn user_prompt(&self, record: &CanonicalPostRecord) -> String {
        let tags = if record.post.tags.is_empty() {
            "None".to_string()
        } else {
            record.post.tags.join(", ")
        };
        let comments: Vec<&str> = record
            .comments
            .iter()
            .map(|comment| comment.comment.as_str())
            .collect();

        format!(
            "Profile Bio: {}\nFollower Count: {}\nPost Title/Caption: {}\nPost Tags: {}\nComments: {:?}",
            record.profile.bio, record.profile.follower_count, record.post.title, tags, comments
        )
    }
}

/// Seam over the chat endpoint so classification is testable without a
/// running model server.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, AiClientError>;
}

#[async_trait]
impl ChatModel for LmStudio {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, AiClientError> {
        self.chat_completion(system, user, temperature).await
    }
}

pub struct Classifier {
    model: Arc<dyn ChatModel>,
    template: PromptTemplate,
}

impl Classifier {
    pub fn new(model: Arc<dyn ChatModel>, reasoning: ReasoningFormat) -> Self {
        Self {
            model,
            template: PromptTemplate::new(reasoning),
        }
    }

    /// Classify a canonical record. This never fails past its own boundary:
    /// every model or response failure is recorded on the returned value's
    /// `error` field, with verdict and certainty left unset.
    pub async fn classify(&self, record: &CanonicalPostRecord) -> Classification {
        let system = self.template.system_instruction();
        let user = self.template.user_prompt(record);
        debug!(prompt = %user, "classifying post");

        let raw = match self.model.complete(&system, &user, SAMPLING_TEMPERATURE).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, "model call failed");
                return Classification::from_error(describe_model_error(&e), None);
            }
        };

        match parse_verdict(&raw) {
            Ok((verdict, certainty, reasoning)) => {
                info!(%verdict, certainty, "classified post");
                Classification::from_verdict(verdict, certainty, reasoning, raw)
            }
            Err(e) => {
                error!(error = %e, "failed to interpret model response");
                Classification::from_error(e.to_string(), Some(raw))
            }
        }
    }
}

fn describe_model_error(error: &AiClientError) -> String {
    match error {
        AiClientError::RateLimited(_) => {
            format!("{error}. Consider spacing out classification calls.")
        }
        _ => error.to_string(),
    }
}

#[derive(Debug, Error)]
pub(crate) enum ParseError {
    #[error("JSON Decode Error: {0}")]
    Decode(String),

    #[error("JSON Content Error: {0}")]
    Content(String),
}

/// Interpret a raw model response: strip a wrapping code fence, slice
/// between the first `{` and last `}` to shed any surrounding prose, parse,
/// then validate verdict and certainty.
pub(crate) fn parse_verdict(raw: &str) -> Result<(Verdict, u8, String), ParseError> {
    let cleaned = strip_code_fence(raw);

    let json_str = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if end > start => &cleaned[start..=end],
        _ => {
            return Err(ParseError::Decode(
                "no JSON object found in response".to_string(),
            ))
        }
    };

    let parsed: Value =
        serde_json::from_str(json_str).map_err(|e| ParseError::Decode(e.to_string()))?;

    // Key names are tolerated in capitalized form; key content is not.
    let verdict_value = parsed.get("verdict").or_else(|| parsed.get("Verdict"));
    let certainty_value = parsed.get("certainty").or_else(|| parsed.get("Certainty"));
    let reasoning_value = parsed.get("reasoning").or_else(|| parsed.get("Reasoning"));

    let (Some(verdict_value), Some(certainty_value)) = (verdict_value, certainty_value) else {
        return Err(ParseError::Content(
            "missing 'verdict' or 'certainty' in response".to_string(),
        ));
    };

    let verdict = match verdict_value {
        Value::String(s) => Verdict::parse(s)
            .ok_or_else(|| ParseError::Content(format!("invalid verdict value: {}", s.trim())))?,
        other => {
            return Err(ParseError::Content(format!(
                "verdict is not a string: {other}"
            )))
        }
    };

    let certainty = parse_certainty(certainty_value)?;

    let reasoning = match reasoning_value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    Ok((verdict, certainty, reasoning))
}

fn parse_certainty(value: &Value) -> Result<u8, ParseError> {
    let n = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    let n = n.ok_or_else(|| ParseError::Content(format!("invalid certainty value: {value}")))?;
    if !(0..=100).contains(&n) {
        return Err(ParseError::Content(format!("certainty out of range: {n}")));
    }
    Ok(n as u8)
}

#[cfg(test)]
mod tests {
    use mlmradar_common::{CommentRecord, PostRecord, ProfileRecord};

    use super::*;

    #[test]
    fn parses_a_clean_response() {
        let (verdict, certainty, reasoning) = parse_verdict(
            r#"{"verdict": "Yes", "certainty": 85, "reasoning": "recruitment language"}"#,
        )
        .unwrap();
        assert_eq!(verdict, Verdict::Yes);
        assert_eq!(certainty, 85);
        assert_eq!(reasoning, "recruitment language");
    }

    #[test]
    fn parses_fenced_response_with_surrounding_prose() {
        let raw = "```json\nSure! Here is my analysis: {\"verdict\": \"no\", \"certainty\": \"42\"} Hope that helps.\n```";
        let (verdict, certainty, reasoning) = parse_verdict(raw).unwrap();
        assert_eq!(verdict, Verdict::No);
        assert_eq!(certainty, 42);
        assert_eq!(reasoning, "");
    }

    #[test]
    fn tolerates_capitalized_key_names() {
        let (verdict, certainty, _) =
            parse_verdict(r#"{"Verdict": " YES ", "Certainty": 100}"#).unwrap();
        assert_eq!(verdict, Verdict::Yes);
        assert_eq!(certainty, 100);
    }

    #[test]
    fn structured_reasoning_is_stringified() {
        let (_, _, reasoning) = parse_verdict(
            r#"{"verdict": "Yes", "certainty": 70, "reasoning": {"tone": "salesy"}}"#,
        )
        .unwrap();
        assert_eq!(reasoning, r#"{"tone":"salesy"}"#);
    }

    #[test]
    fn missing_object_is_a_decode_error() {
        let err = parse_verdict("I could not find anything to analyze.").unwrap_err();
        assert!(matches!(err, ParseError::Decode(_)));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let err = parse_verdict(r#"{"verdict": "Yes", "certainty":"#).unwrap_err();
        assert!(matches!(err, ParseError::Decode(_)));
    }

    #[test]
    fn invalid_verdict_is_a_content_error_naming_the_value() {
        let err = parse_verdict(r#"{"verdict": "maybe", "certainty": 50}"#).unwrap_err();
        assert!(err.to_string().contains("maybe"));
        assert!(matches!(err, ParseError::Content(_)));
    }

    #[test]
    fn certainty_bounds_are_enforced() {
        for bad in [r#"-1"#, r#"101"#, r#""high""#] {
            let raw = format!(r#"{{"verdict": "Yes", "certainty": {bad}}}"#);
            assert!(
                matches!(parse_verdict(&raw), Err(ParseError::Content(_))),
                "certainty {bad} should fail"
            );
        }
        for (good, expected) in [("0", 0u8), ("100", 100), (r#""42""#, 42)] {
            let raw = format!(r#"{{"verdict": "Yes", "certainty": {good}}}"#);
            let (_, certainty, _) = parse_verdict(&raw).unwrap();
            assert_eq!(certainty, expected);
        }
    }

    #[test]
    fn missing_certainty_is_a_content_error() {
        let err = parse_verdict(r#"{"verdict": "Yes"}"#).unwrap_err();
        assert!(matches!(err, ParseError::Content(_)));
    }

    struct CannedModel(&'static str);

    #[async_trait]
    impl ChatModel for CannedModel {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _temperature: f32,
        ) -> Result<String, AiClientError> {
            Ok(self.0.to_string())
        }
    }

    struct DownModel;

    #[async_trait]
    impl ChatModel for DownModel {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _temperature: f32,
        ) -> Result<String, AiClientError> {
            Err(AiClientError::Connection("connection refused".to_string()))
        }
    }

    fn sample_record() -> CanonicalPostRecord {
        CanonicalPostRecord {
            profile: ProfileRecord {
                bio: "dream big".into(),
                follower_count: 15300,
                ..Default::default()
            },
            post: PostRecord {
                title: "Join my team".into(),
                tags: vec!["#bossbabe".into(), "#hustle".into()],
                ..Default::default()
            },
            comments: vec![CommentRecord {
                user: "curious_carl".into(),
                comment: "How do I sign up?".into(),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn user_prompt_contains_only_top_level_comment_text() {
        let template = PromptTemplate::new(ReasoningFormat::Brief);
        let prompt = template.user_prompt(&sample_record());
        assert!(prompt.contains("Profile Bio: dream big"));
        assert!(prompt.contains("Follower Count: 15300"));
        assert!(prompt.contains("Post Tags: #bossbabe, #hustle"));
        assert!(prompt.contains("How do I sign up?"));
    }

    #[test]
    fn empty_tags_render_as_the_literal_none() {
        let template = PromptTemplate::new(ReasoningFormat::Brief);
        let mut record = sample_record();
        record.post.tags.clear();
        assert!(template.user_prompt(&record).contains("Post Tags: None"));
    }

    #[tokio::test]
    async fn classify_returns_a_verdict_on_success() {
        let classifier = Classifier::new(
            Arc::new(CannedModel(
                r#"{"verdict": "Yes", "certainty": 90, "reasoning": "recruiting"}"#,
            )),
            ReasoningFormat::Structured,
        );
        let result = classifier.classify(&sample_record()).await;
        assert_eq!(result.verdict, Some(Verdict::Yes));
        assert_eq!(result.certainty, Some(90));
        assert!(result.error.is_none());
        assert!(result.raw_response.is_some());
    }

    #[tokio::test]
    async fn classify_captures_model_errors_instead_of_raising() {
        let classifier = Classifier::new(Arc::new(DownModel), ReasoningFormat::Brief);
        let result = classifier.classify(&sample_record()).await;
        assert!(result.is_error());
        assert_eq!(result.verdict, None);
        assert_eq!(result.certainty, None);
    }

    #[tokio::test]
    async fn classify_captures_garbage_responses_with_the_raw_text() {
        let classifier =
            Classifier::new(Arc::new(CannedModel("total nonsense")), ReasoningFormat::Brief);
        let result = classifier.classify(&sample_record()).await;
        assert!(result.is_error());
        assert_eq!(result.raw_response.as_deref(), Some("total nonsense"));
    }
}
