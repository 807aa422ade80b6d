//! Pipeline types shared by minimizers, the registry and batch runs.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::MinifyError;

/// Asset name to source code, as handed to a minimizer.
pub type Input = IndexMap<String, String>;

/// Free-form minimizer options, passed through untouched.
pub type MinimizerOptions = Map<String, Value>;

/// What a minimizer returns: bare code, or code with diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Minified {
    Code(String),
    Detailed {
        code: String,
        #[serde(default)]
        warnings: Vec<String>,
        #[serde(default)]
        errors: Vec<String>,
    },
}

impl From<String> for Minified {
    fn from(code: String) -> Self {
        Minified::Code(code)
    }
}

/// Final code of an asset plus every warning and error collected on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimizedResult {
    pub code: String,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Result of a full pipeline run.
pub type InternalResult = MinimizedResult;

/// A code transformer that can take part in a pipeline.
///
/// Implementations receive the current code keyed by asset name and return
/// the transformed code.
#[async_trait]
pub trait Minimizer: Send + Sync {
    /// Registry name, also used in logs.
    fn name(&self) -> &str;

    async fn minify(&self, input: &Input, options: &MinimizerOptions) -> Result<Minified, MinifyError>;
}

/// One pipeline stage: a minimizer and the options it runs with.
#[derive(Clone)]
pub struct MinimizerStep {
    pub implementation: Arc<dyn Minimizer>,
    pub options: MinimizerOptions,
}

impl MinimizerStep {
    pub fn new(implementation: impl Minimizer + 'static) -> Self {
        Self::from_arc(Arc::new(implementation))
    }

    pub fn from_arc(implementation: Arc<dyn Minimizer>) -> Self {
        Self {
            implementation,
            options: MinimizerOptions::new(),
        }
    }

    pub fn with_options(mut self, options: MinimizerOptions) -> Self {
        self.options = options;
        self
    }
}

impl fmt::Debug for MinimizerStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinimizerStep")
            .field("implementation", &self.implementation.name())
            .field("options", &self.options)
            .finish()
    }
}

/// Everything needed to minify one asset.
#[derive(Debug, Clone)]
pub struct InternalOptions {
    /// Asset name, used as the key of the minimizer input.
    pub name: String,
    /// Source code before the first step.
    pub input: String,
    /// Steps applied in order.
    pub minimizer: Vec<MinimizerStep>,
}

impl InternalOptions {
    pub fn new(name: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            minimizer: Vec::new(),
        }
    }

    pub fn step(mut self, step: MinimizerStep) -> Self {
        self.minimizer.push(step);
        self
    }
}
