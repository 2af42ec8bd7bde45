pub mod error;
pub mod throttle;
pub mod types;

pub use error::{InstagramError, Result};
pub use types::{Dimensions, RawComment, RawPost, RawProfile, RawReply};

use std::time::Duration;

use rand::seq::IndexedRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use throttle::Throttle;
use types::{PostEnvelope, ProfileEnvelope};

const GRAPHQL_URL: &str = "https://www.instagram.com/graphql/query";

/// Document ID for post/comment queries. Externally versioned by Instagram.
const POST_DOCUMENT_ID: &str = "8845758582119845";
/// Document ID for profile queries.
const PROFILE_DOCUMENT_ID: &str = "9539110062771438";

/// Outbound request cap per fetcher type: 5 requests per 1-second window.
const THROTTLE_MAX_REQUESTS: usize = 5;
const THROTTLE_WINDOW: Duration = Duration::from_secs(1);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36",
];

/// Client for Instagram's internal GraphQL query endpoint. Holds one
/// sliding-window throttle per fetcher type, so the cap applies regardless
/// of caller.
pub struct InstagramClient {
    http: reqwest::Client,
    post_throttle: Throttle,
    profile_throttle: Throttle,
}

impl InstagramClient {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            post_throttle: Throttle::new(THROTTLE_MAX_REQUESTS, THROTTLE_WINDOW),
            profile_throttle: Throttle::new(THROTTLE_MAX_REQUESTS, THROTTLE_WINDOW),
        })
    }

    /// Fetch a single post (with comments) by URL or bare shortcode.
    /// Returns `None` when the response carries no media envelope.
    pub async fn fetch_post(&self, url_or_shortcode: &str) -> Result<Option<RawPost>> {
        self.post_throttle.acquire().await;

        let shortcode = extract_shortcode(url_or_shortcode);
        debug!(shortcode, "scraping post data");

        let variables = serde_json::json!({
            "shortcode": shortcode,
            "fetch_tagged_user_count": null,
            "hoisted_comment_id": null,
            "hoisted_reply_id": null,
        });

        let envelope: PostEnvelope = self.query(&variables, POST_DOCUMENT_ID).await?;
        let post = envelope.data.media.map(RawPost::from_media);
        if post.is_some() {
            info!(shortcode, "scraped post data");
        }
        Ok(post)
    }

    /// Fetch profile data by owner id (the `pk` extracted from a post).
    /// Returns `None` when the response carries no user envelope.
    pub async fn fetch_profile(&self, pk: &str) -> Result<Option<RawProfile>> {
        self.profile_throttle.acquire().await;

        debug!(pk, "scraping profile data");

        let variables = serde_json::json!({
            "id": pk,
            "render_surface": "PROFILE",
        });

        let envelope: ProfileEnvelope = self.query(&variables, PROFILE_DOCUMENT_ID).await?;
        let profile = envelope.data.user.map(RawProfile::from_user);
        if profile.is_some() {
            info!(pk, "scraped profile data");
        }
        Ok(profile)
    }

    /// POST a form-encoded GraphQL query: compact-JSON `variables` plus the
    /// fixed `doc_id`, with a user-agent drawn from the pool per request.
    async fn query<T: DeserializeOwned>(
        &self,
        variables: &serde_json::Value,
        doc_id: &str,
    ) -> Result<T> {
        let variables_json = serde_json::to_string(variables)?;

        let response = self
            .http
            .post(GRAPHQL_URL)
            .header(USER_AGENT, user_agent())
            .form(&[("variables", variables_json.as_str()), ("doc_id", doc_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(InstagramError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&response.bytes().await?)?)
    }
}

fn user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Pull the shortcode out of a post URL; bare shortcodes pass through.
fn extract_shortcode(url_or_shortcode: &str) -> &str {
    match url_or_shortcode.split_once("/p/") {
        Some((_, rest)) => rest.split('/').next().unwrap_or(rest),
        None => url_or_shortcode,
    }
}
