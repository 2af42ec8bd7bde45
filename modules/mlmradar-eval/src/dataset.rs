use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use tracing::info;

use mlmradar_common::{CanonicalPostRecord, CommentRecord, PostRecord, ProfileRecord};

/// One labeled dataset row, in the exported column layout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvalRow {
    #[serde(rename = "Post link", default)]
    pub post_link: String,
    #[serde(rename = "Profile_nickname", default)]
    pub nickname: String,
    #[serde(rename = "Profile_bio", default)]
    pub bio: String,
    #[serde(rename = "Profile_verified", default)]
    pub verified: String,
    #[serde(rename = "Profile_biolinks", default)]
    pub bio_links: String,
    #[serde(rename = "Profile_followerCount", default)]
    pub follower_count: String,
    #[serde(rename = "Profile_followingCount", default)]
    pub following_count: String,
    #[serde(rename = "Post_title", default)]
    pub title: String,
    #[serde(rename = "Post_tags", default)]
    pub tags: String,
    #[serde(rename = "Comments", default)]
    pub comments: String,
    /// Ground truth, attached at load time from which file the row came from.
    #[serde(skip)]
    pub is_mlm: bool,
}

/// Load both labeled datasets: MLM rows label 1, non-MLM rows label 0.
pub fn load_labeled_rows(mlm: &Path, non_mlm: &Path) -> Result<Vec<EvalRow>> {
    let mut rows = read_rows(mlm, true)?;
    rows.extend(read_rows(non_mlm, false)?);
    info!(total = rows.len(), "loaded labeled dataset rows");
    Ok(rows)
}

fn read_rows(path: &Path, is_mlm: bool) -> Result<Vec<EvalRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open dataset {}", path.display()))?;
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let mut row: EvalRow =
            result.with_context(|| format!("malformed row in {}", path.display()))?;
        row.is_mlm = is_mlm;
        rows.push(row);
    }
    Ok(rows)
}

impl EvalRow {
    /// Standardize the exported row into the canonical schema the classifier
    /// consumes. The export flattens everything to strings, so numerics are
    /// coerced leniently and junk falls back to 0.
    pub fn to_canonical(&self) -> CanonicalPostRecord {
        CanonicalPostRecord {
            profile: ProfileRecord {
                // The export carries no separate username; the nickname
                // stands in for both.
                username: self.nickname.clone(),
                nickname: self.nickname.clone(),
                bio: self.bio.clone(),
                verified: parse_bool(&self.verified),
                bio_links: non_empty(&self.bio_links),
                follower_count: lenient_u64(&self.follower_count),
                following_count: lenient_i64(&self.following_count),
            },
            post: PostRecord {
                title: self.title.clone(),
                likes: None,
                tags: split_tags(&self.tags),
            },
            comments: split_comments(&self.comments),
        }
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn lenient_u64(raw: &str) -> u64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| *n >= 0.0)
        .map(|n| n as u64)
        .unwrap_or(0)
}

fn lenient_i64(raw: &str) -> i64 {
    raw.trim().parse::<f64>().map(|n| n as i64).unwrap_or(0)
}

/// Comma-separated tags, trimmed, empties dropped.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(|tag| tag.to_string())
        .collect()
}

static COMMENT_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r";\s*").unwrap());
static USER_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[^:]+:\s*(.*)$").unwrap());

/// The export concatenates a thread as `"user: text; user: text"`. Split on
/// semicolons and drop the `user:` prefix when one is present; segments
/// without a prefix are kept whole.
pub fn split_comments(raw: &str) -> Vec<CommentRecord> {
    COMMENT_SPLIT_RE
        .split(raw)
        .filter(|segment| !segment.trim().is_empty())
        .map(|segment| {
            let (user, text) = match USER_PREFIX_RE.captures(segment) {
                Some(captures) => {
                    let prefix = segment.split(':').next().unwrap_or("").trim();
                    (prefix.to_string(), captures[1].trim().to_string())
                }
                None => (String::new(), segment.trim().to_string()),
            };
            CommentRecord {
                user,
                comment: text,
                replies: Vec::new(),
            }
        })
        .collect()
}
