//! Minify many assets with bounded concurrency.
//!
//! Each asset runs the full minimizer pipeline as one scheduler task, so at
//! most `limit` assets are being minified at any moment. Results come back in
//! asset order. The first failing asset fails the whole batch; assets still
//! in flight at that point are handled per the configured [`FailurePolicy`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use squash_core::SquashConfig;
use squash_throttle::{FailurePolicy, Throttle};
use tracing::{info, warn};

use crate::error::MinifyError;
use crate::html::HtmlMinifierTerser;
use crate::pipeline::minify;
use crate::types::{InternalOptions, MinimizedResult, MinimizerStep};

/// A named source file waiting to be minified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub code: String,
}

impl Asset {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimizedAsset {
    pub name: String,
    pub result: MinimizedResult,
}

/// Runs one minimizer pipeline over a batch of assets.
pub struct BatchMinifier {
    throttle: Throttle,
    steps: Arc<[MinimizerStep]>,
}

impl BatchMinifier {
    /// Validates `limit` up front; no asset is touched on failure.
    pub fn new(limit: usize, steps: Vec<MinimizerStep>) -> Result<Self, MinifyError> {
        Ok(Self {
            throttle: Throttle::try_new(limit)?,
            steps: steps.into(),
        })
    }

    /// HTML batch using configured parallelism, binary and user options.
    pub fn from_config(config: &SquashConfig) -> Result<Self, MinifyError> {
        config.log_summary();
        let step = MinimizerStep::new(HtmlMinifierTerser::from_config(&config.html))
            .with_options(config.html.options.clone());
        Self::new(config.throttle.parallelism, vec![step])
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.throttle = self.throttle.with_failure_policy(policy);
        self
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    pub async fn run(&self, assets: Vec<Asset>) -> Result<Vec<MinimizedAsset>, MinifyError> {
        let total = assets.len();
        info!(
            assets = total,
            limit = %self.throttle.limit(),
            steps = self.steps.len(),
            "minifying assets"
        );

        let tasks = assets.into_iter().map(|asset| {
            let steps = Arc::clone(&self.steps);
            move || async move {
                let options = InternalOptions {
                    name: asset.name,
                    input: asset.code,
                    minimizer: steps.to_vec(),
                };
                let result = minify(&options).await?;
                Ok::<_, MinifyError>(MinimizedAsset {
                    name: options.name,
                    result,
                })
            }
        });

        match self.throttle.run(tasks).await {
            Ok(minimized) => {
                info!(assets = total, "batch minified");
                Ok(minimized)
            }
            Err(err) => {
                warn!(assets = total, error = %err, "batch failed");
                Err(err)
            }
        }
    }
}

/// Minify `assets` through `steps` with at most `limit` assets in flight.
pub async fn minify_assets(
    limit: usize,
    assets: Vec<Asset>,
    steps: Vec<MinimizerStep>,
) -> Result<Vec<MinimizedAsset>, MinifyError> {
    BatchMinifier::new(limit, steps)?.run(assets).await
}
