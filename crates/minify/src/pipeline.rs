//! Sequential minimizer chain over a single asset.

use tracing::debug;

use crate::error::MinifyError;
use crate::types::{Input, InternalOptions, InternalResult, Minified, MinimizedResult};

/// Run every step of `options.minimizer` in order.
///
/// Each step receives the previous step's code under the asset name.
/// Warnings and errors accumulate across steps in order. The first failing
/// step ends the run.
pub async fn minify(options: &InternalOptions) -> Result<InternalResult, MinifyError> {
    let mut result = MinimizedResult {
        code: options.input.clone(),
        ..MinimizedResult::default()
    };

    for (index, step) in options.minimizer.iter().enumerate() {
        let minimizer = step.implementation.name();
        debug!(asset = %options.name, minimizer, step = index, "running minimizer");

        let mut input = Input::new();
        input.insert(options.name.clone(), std::mem::take(&mut result.code));

        match step.implementation.minify(&input, &step.options).await? {
            Minified::Code(code) => result.code = code,
            Minified::Detailed {
                code,
                warnings,
                errors,
            } => {
                result.code = code;
                result.warnings.extend(warnings);
                result.errors.extend(errors);
            }
        }
    }

    debug!(
        asset = %options.name,
        warnings = result.warnings.len(),
        errors = result.errors.len(),
        "pipeline finished"
    );
    Ok(result)
}
