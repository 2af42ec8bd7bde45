use std::future::Future;

use async_trait::async_trait;
use tracing::{info, warn};

use instagram_client::{InstagramClient, RawPost, RawProfile};
use mlmradar_common::{MlmRadarError, RetryPolicy};

/// Combined output of the two dependent fetches.
#[derive(Debug, Clone)]
pub struct AggregatedCapture {
    pub profile_data: RawProfile,
    pub post_data: RawPost,
}

// Seams over the raw fetchers so aggregation is testable without the network.

#[async_trait]
pub trait FetchPost: Send + Sync {
    async fn fetch_post(&self, url_or_shortcode: &str) -> anyhow::Result<Option<RawPost>>;
}

#[async_trait]
pub trait FetchProfile: Send + Sync {
    async fn fetch_profile(&self, pk: &str) -> anyhow::Result<Option<RawProfile>>;
}

#[async_trait]
impl FetchPost for InstagramClient {
    async fn fetch_post(&self, url_or_shortcode: &str) -> anyhow::Result<Option<RawPost>> {
        Ok(InstagramClient::fetch_post(self, url_or_shortcode).await?)
    }
}

#[async_trait]
impl FetchProfile for InstagramClient {
    async fn fetch_profile(&self, pk: &str) -> anyhow::Result<Option<RawProfile>> {
        Ok(InstagramClient::fetch_profile(self, pk).await?)
    }
}

/// Sequence the two dependent fetches: post first, then the profile keyed by
/// the owner id extracted from the post. Each step runs under the single
/// retry policy; a step that exhausts its budget without a result aborts the
/// whole aggregation.
pub async fn aggregate(
    posts: &dyn FetchPost,
    profiles: &dyn FetchProfile,
    policy: &RetryPolicy,
    post_url: &str,
) -> Result<AggregatedCapture, MlmRadarError> {
    info!(post_url, "aggregating post and profile data");

    let post_data = fetch_with_retry(policy, "post", || posts.fetch_post(post_url))
        .await
        .ok_or(MlmRadarError::FetchExhausted("post"))?;

    let pk = post_data
        .pk
        .clone()
        .filter(|pk| !pk.is_empty())
        .ok_or(MlmRadarError::MissingIdentifier)?;

    let profile_data = fetch_with_retry(policy, "profile", || profiles.fetch_profile(&pk))
        .await
        .ok_or(MlmRadarError::FetchExhausted("profile"))?;

    info!(post_url, "aggregated scraped data");

    Ok(AggregatedCapture {
        profile_data,
        post_data,
    })
}

/// Run one logical fetch under the retry policy. An `Err` or an empty result
/// both count as a failed attempt.
async fn fetch_with_retry<T, F, Fut>(policy: &RetryPolicy, what: &'static str, fetch: F) -> Option<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = anyhow::Result<Option<T>>>,
{
    for attempt in 0..policy.max_attempts {
        if attempt > 0 {
            tokio::time::sleep(policy.delay_for(attempt - 1)).await;
        }
        match fetch().await {
            Ok(Some(value)) => return Some(value),
            Ok(None) => warn!(what, attempt = attempt + 1, "fetch returned no data"),
            Err(e) => warn!(what, attempt = attempt + 1, error = %e, "fetch failed"),
        }
    }
    warn!(
        what,
        attempts = policy.max_attempts,
        "fetch retry budget exhausted"
    );
    None
}
