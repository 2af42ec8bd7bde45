use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MlmRadarError;

// --- Platform registry ---

/// Social platforms the scraper understands. Detection is a substring match
/// on the post URL; the first known domain token wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    TikTok,
    Instagram,
}

impl Platform {
    pub fn from_url(url: &str) -> Result<Self, MlmRadarError> {
        if url.contains("tiktok.com") {
            Ok(Self::TikTok)
        } else if url.contains("instagram.com") {
            Ok(Self::Instagram)
        } else {
            Err(MlmRadarError::UnsupportedPlatform(url.to_string()))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TikTok => "tiktok",
            Self::Instagram => "instagram",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Canonical Post Record ---

/// Platform-agnostic normalized representation of a scraped post, its
/// author's profile, and the comment thread. Constructed once per request
/// and consumed once by the classifier; never persisted here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalPostRecord {
    pub profile: ProfileRecord,
    pub post: PostRecord,
    pub comments: Vec<CommentRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileRecord {
    pub username: String,
    pub nickname: String,
    pub bio: String,
    pub verified: bool,
    /// External link from the profile; an empty string collapses to `None`.
    pub bio_links: Option<String>,
    pub follower_count: u64,
    pub following_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostRecord {
    pub title: String,
    pub likes: Option<i64>,
    /// Caption hashtags in encounter order; deduplication is not guaranteed.
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentRecord {
    pub user: String,
    pub comment: String,
    pub replies: Vec<ReplyRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyRecord {
    pub user: String,
    pub comment: String,
}

// --- Classification verdict ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Yes,
    No,
}

impl Verdict {
    /// Normalize a model-supplied verdict string: trimmed and
    /// case-insensitive, so "yes", "YES" and " Yes " all parse.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single classification call. `verdict`/`certainty` unset
/// with `error` set means the model call or response handling failed;
/// `None` verdict is the unknown sentinel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Classification {
    pub verdict: Option<Verdict>,
    /// Model-reported confidence, 0..=100.
    pub certainty: Option<u8>,
    pub reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl Classification {
    pub fn from_verdict(
        verdict: Verdict,
        certainty: u8,
        reasoning: String,
        raw_response: String,
    ) -> Self {
        Self {
            verdict: Some(verdict),
            certainty: Some(certainty),
            reasoning,
            error: None,
            raw_response: Some(raw_response),
        }
    }

    /// Record a failure. An errored result never carries a partial verdict:
    /// verdict and certainty stay unset.
    pub fn from_error(error: impl Into<String>, raw_response: Option<String>) -> Self {
        Self {
            verdict: None,
            certainty: None,
            reasoning: String::new(),
            error: Some(error.into()),
            raw_response,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_detection_by_domain_substring() {
        assert_eq!(
            Platform::from_url("https://www.instagram.com/p/CTwgvhTMSqM/").unwrap(),
            Platform::Instagram
        );
        assert_eq!(
            Platform::from_url("https://www.tiktok.com/@user/video/7440071783539150087").unwrap(),
            Platform::TikTok
        );
        assert!(matches!(
            Platform::from_url("https://example.com/post/1"),
            Err(MlmRadarError::UnsupportedPlatform(_))
        ));
    }

    #[test]
    fn verdict_normalization() {
        assert_eq!(Verdict::parse("yes"), Some(Verdict::Yes));
        assert_eq!(Verdict::parse("YES"), Some(Verdict::Yes));
        assert_eq!(Verdict::parse(" Yes "), Some(Verdict::Yes));
        assert_eq!(Verdict::parse("no"), Some(Verdict::No));
        assert_eq!(Verdict::parse("maybe"), None);
        assert_eq!(Verdict::parse(""), None);
    }

    #[test]
    fn profile_record_serializes_camel_case() {
        let record = CanonicalPostRecord {
            profile: ProfileRecord {
                username: "wellnessqueen".into(),
                follower_count: 15300,
                bio_links: Some("https://linktr.ee/wellnessqueen".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["profile"]["followerCount"], 15300);
        assert_eq!(
            json["profile"]["bioLinks"],
            "https://linktr.ee/wellnessqueen"
        );
        assert_eq!(json["profile"]["followingCount"], 0);
    }

    #[test]
    fn error_classification_clears_verdict() {
        let result = Classification::from_error("JSON Decode Error: oops", Some("junk".into()));
        assert!(result.is_error());
        assert_eq!(result.verdict, None);
        assert_eq!(result.certainty, None);
    }

    #[test]
    fn error_field_omitted_on_success() {
        let result =
            Classification::from_verdict(Verdict::No, 90, "looks organic".into(), "{}".into());
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["verdict"], "No");
        assert_eq!(json["certainty"], 90);
    }
}
