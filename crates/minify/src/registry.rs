use std::collections::HashMap;
use std::sync::Arc;

use squash_core::HtmlConfig;

use crate::error::MinifyError;
use crate::html::{HtmlMinifierTerser, HTML_MINIFIER_TERSER};
use crate::types::Minimizer;

/// Named minimizers available to serialized pipeline definitions.
pub struct MinimizerRegistry {
    minimizers: HashMap<String, Arc<dyn Minimizer>>,
}

impl MinimizerRegistry {
    pub fn new() -> Self {
        Self {
            minimizers: HashMap::new(),
        }
    }

    /// Registry with the stock HTML adapter configured from `config`.
    pub fn with_defaults(config: &HtmlConfig) -> Self {
        let mut registry = Self::new();
        registry.minimizers.insert(
            HTML_MINIFIER_TERSER.to_string(),
            Arc::new(HtmlMinifierTerser::from_config(config)),
        );
        registry
    }

    /// Register a minimizer under its own name. Returns error if the name is taken.
    pub fn register(&mut self, minimizer: impl Minimizer + 'static) -> Result<(), MinifyError> {
        self.register_arc(Arc::new(minimizer))
    }

    pub fn register_arc(&mut self, minimizer: Arc<dyn Minimizer>) -> Result<(), MinifyError> {
        let name = minimizer.name().to_string();
        if self.minimizers.contains_key(&name) {
            return Err(MinifyError::DuplicateMinimizer(name));
        }
        self.minimizers.insert(name, minimizer);
        Ok(())
    }

    /// Look up a minimizer by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Minimizer>> {
        self.minimizers.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.minimizers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.minimizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.minimizers.is_empty()
    }
}

impl Default for MinimizerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
