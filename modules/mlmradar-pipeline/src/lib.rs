pub mod aggregator;
pub mod classifier;
pub mod standardizer;


pub use aggregator::{aggregate, AggregatedCapture, FetchPost, FetchProfile};
pub use classifier::{ChatModel, Classifier, PromptTemplate, ReasoningFormat};
pub use standardizer::standardize;

use std::sync::Arc;

use tracing::info;

use mlmradar_common::{Classification, MlmRadarError, Platform, RetryPolicy};

/// End-to-end analysis of a post URL: platform detection, the two dependent
/// fetches, standardization, classification. Every collaborator is injected;
/// the pipeline owns no global state.
pub struct Pipeline {
    posts: Arc<dyn FetchPost>,
    profiles: Arc<dyn FetchProfile>,
    classifier: Classifier,
    retry: RetryPolicy,
}

impl Pipeline {
    pub fn new(
        posts: Arc<dyn FetchPost>,
        profiles: Arc<dyn FetchProfile>,
        classifier: Classifier,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            posts,
            profiles,
            classifier,
            retry,
        }
    }

    pub async fn analyze(&self, url: &str) -> Result<Classification, MlmRadarError> {
        let platform = Platform::from_url(url)?;
        info!(url, platform = %platform, "analyzing post");

        // Fetchers are registered for Instagram only; other recognized
        // platforms fail dispatch the same way standardization would.
        if platform != Platform::Instagram {
            return Err(MlmRadarError::UnsupportedPlatform(platform.to_string()));
        }

        let capture =
            aggregate(self.posts.as_ref(), self.profiles.as_ref(), &self.retry, url).await?;
        let record = standardize(platform, &capture)?;

        Ok(self.classifier.classify(&record).await)
    }
}
