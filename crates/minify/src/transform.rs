//! Entry point for pipeline definitions that arrive serialized, e.g. from a
//! parent process handing work to a worker.
//!
//! ```json
//! {
//!   "name": "index.html",
//!   "input": "<p> hi </p>",
//!   "minimizer": [
//!     { "implementation": "html-minifier-terser", "options": { "removeComments": false } }
//!   ]
//! }
//! ```
//!
//! `minimizer` may also be a single step object. Implementations are resolved
//! by name through a [`MinimizerRegistry`].

use serde::Deserialize;

use crate::error::MinifyError;
use crate::pipeline::minify;
use crate::registry::MinimizerRegistry;
use crate::types::{InternalOptions, InternalResult, MinimizerOptions, MinimizerStep};

#[derive(Debug, Deserialize)]
struct SerializedOptions {
    name: String,
    input: String,
    minimizer: OneOrMany<SerializedStep>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SerializedStep {
    implementation: String,
    #[serde(default)]
    options: MinimizerOptions,
}

/// Parse a serialized pipeline definition and resolve its minimizers.
pub fn parse_options(
    serialized: &str,
    registry: &MinimizerRegistry,
) -> Result<InternalOptions, MinifyError> {
    let parsed: SerializedOptions = serde_json::from_str(serialized)?;
    let minimizer = parsed
        .minimizer
        .into_vec()
        .into_iter()
        .map(|step| {
            registry
                .get(&step.implementation)
                .map(|implementation| MinimizerStep::from_arc(implementation).with_options(step.options))
                .ok_or(MinifyError::UnknownMinimizer(step.implementation))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(InternalOptions {
        name: parsed.name,
        input: parsed.input,
        minimizer,
    })
}

/// Parse a serialized pipeline definition and run it.
pub async fn transform(
    serialized: &str,
    registry: &MinimizerRegistry,
) -> Result<InternalResult, MinifyError> {
    let options = parse_options(serialized, registry)?;
    minify(&options).await
}
