//! Minimizer pipeline and batch minification.
//!
//! A pipeline chains [`Minimizer`]s over one asset's code. [`BatchMinifier`]
//! runs the pipeline over many assets with bounded concurrency.

pub mod batch;
pub mod error;
pub mod html;
pub mod merge;
pub mod pipeline;
pub mod registry;
pub mod transform;
pub mod types;

pub use batch::{minify_assets, Asset, BatchMinifier, MinimizedAsset};
pub use error::MinifyError;
pub use html::{CommandBackend, HtmlMinifierBackend, HtmlMinifierTerser};
pub use merge::deep_merge;
pub use pipeline::minify;
pub use registry::MinimizerRegistry;
pub use transform::{parse_options, transform};
pub use types::{
    Input, InternalOptions, InternalResult, Minified, MinimizedResult, Minimizer,
    MinimizerOptions, MinimizerStep,
};
