use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use squash_throttle::Limit;

use crate::error::CoreError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled key: tries `{PROFILE}_{KEY}` first, falls back to `{KEY}`.
fn profiled_opt(lookup: &dyn Fn(&str) -> Option<String>, profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        if let Some(v) = lookup(&format!("{}_{}", profile, key)) {
            return Some(v);
        }
    }
    lookup(key)
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> T {
    match raw {
        Some(v) => v.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %v, "ignoring unparsable config value");
            default
        }),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

/// Runtime settings for batch minification.
///
/// Built from `SQUASH_*` environment variables or a TOML file. Environment
/// variables always override file values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SquashConfig {
    /// Active profile name (empty = default).
    #[serde(default)]
    pub profile: String,

    #[serde(default)]
    pub throttle: ThrottleConfig,

    #[serde(default)]
    pub html: HtmlConfig,
}

impl SquashConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    ///
    /// Profile is read from `SQUASH_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(&env_opt)
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let profile = lookup("SQUASH_PROFILE").unwrap_or_default().to_uppercase();
        let mut config = Self {
            profile,
            ..Self::default()
        };
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse config from a TOML string, then apply env overrides and validate.
    pub fn from_toml(toml_str: &str) -> Result<Self, CoreError> {
        Self::from_toml_with(toml_str, &env_opt)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    fn from_toml_with(
        toml_str: &str,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, CoreError> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.profile = config.profile.to_uppercase();
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SQUASH_*` overrides.
    ///
    /// - `SQUASH_PARALLELISM` -> `throttle.parallelism` (must parse as a [`Limit`])
    /// - `SQUASH_HTML_MINIFIER_BIN` -> `html.binary`
    /// - `SQUASH_HTML_MINIFIER_TIMEOUT_SECS` -> `html.timeout_secs`
    fn apply_overrides(&mut self, lookup: &dyn Fn(&str) -> Option<String>) -> Result<(), CoreError> {
        let p = self.profile.clone();
        if let Some(raw) = profiled_opt(lookup, &p, "SQUASH_PARALLELISM") {
            let limit: Limit = raw
                .trim()
                .parse()
                .map_err(|e| CoreError::Invalid(format!("SQUASH_PARALLELISM: {e}")))?;
            self.throttle.parallelism = limit.get();
        }
        if let Some(v) = profiled_opt(lookup, &p, "SQUASH_HTML_MINIFIER_BIN") {
            self.html.binary = v;
        }
        self.html.timeout_secs = parse_or(
            profiled_opt(lookup, &p, "SQUASH_HTML_MINIFIER_TIMEOUT_SECS"),
            "SQUASH_HTML_MINIFIER_TIMEOUT_SECS",
            self.html.timeout_secs,
        );
        Ok(())
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        Limit::new(self.throttle.parallelism)
            .map_err(|e| CoreError::Invalid(format!("throttle.parallelism: {e}")))?;
        if self.html.binary.trim().is_empty() {
            return Err(CoreError::Invalid("html.binary must not be empty".into()));
        }
        if self.html.timeout_secs == 0 {
            return Err(CoreError::Invalid(
                "html.timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  throttle:  parallelism={}", self.throttle.parallelism);
        tracing::info!(
            "  html:      binary={}, timeout={}s, options={}",
            self.html.binary,
            self.html.timeout_secs,
            self.html.options.len()
        );
    }
}

// ── Throttle ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Maximum number of assets minified at once.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

/// Host CPUs minus one, at least one.
fn default_parallelism() -> usize {
    Limit::available_parallelism().get()
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
        }
    }
}

// ── HTML minifier ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlConfig {
    /// Executable invoked for HTML minification.
    #[serde(default = "default_html_binary")]
    pub binary: String,

    #[serde(default = "default_html_timeout")]
    pub timeout_secs: u64,

    /// User options merged over the adapter defaults.
    #[serde(default)]
    pub options: Map<String, Value>,
}

fn default_html_binary() -> String {
    "html-minifier-terser".into()
}

fn default_html_timeout() -> u64 {
    30
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            binary: default_html_binary(),
            timeout_secs: default_html_timeout(),
            options: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let cfg = SquashConfig::from_lookup(&lookup_from(&[])).unwrap();
        assert_eq!(cfg.profile_label(), "default");
        assert!(cfg.throttle.parallelism >= 1);
        assert_eq!(cfg.html.binary, "html-minifier-terser");
        assert_eq!(cfg.html.timeout_secs, 30);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn env_values_are_read() {
        let cfg = SquashConfig::from_lookup(&lookup_from(&[
            ("SQUASH_PARALLELISM", "6"),
            ("SQUASH_HTML_MINIFIER_BIN", "/opt/bin/htmlmin"),
            ("SQUASH_HTML_MINIFIER_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(cfg.throttle.parallelism, 6);
        assert_eq!(cfg.html.binary, "/opt/bin/htmlmin");
        assert_eq!(cfg.html.timeout_secs, 5);
    }

    #[test]
    fn profile_prefixed_keys_win() {
        let cfg = SquashConfig::from_lookup(&lookup_from(&[
            ("SQUASH_PROFILE", "prod"),
            ("SQUASH_PARALLELISM", "2"),
            ("PROD_SQUASH_PARALLELISM", "12"),
            ("SQUASH_HTML_MINIFIER_BIN", "plain"),
        ]))
        .unwrap();
        assert_eq!(cfg.profile_label(), "PROD");
        assert_eq!(cfg.throttle.parallelism, 12);
        assert_eq!(cfg.html.binary, "plain");
    }

    #[test]
    fn malformed_parallelism_is_rejected() {
        for raw in ["-2", "1.5", "lots", "0"] {
            let err = SquashConfig::from_lookup(&lookup_from(&[("SQUASH_PARALLELISM", raw)]))
                .unwrap_err();
            assert!(matches!(err, CoreError::Invalid(_)), "{raw:?}: {err}");
            assert!(err.to_string().contains(raw), "{raw:?}: {err}");

            let err = SquashConfig::from_toml_with("", &lookup_from(&[("SQUASH_PARALLELISM", raw)]))
                .unwrap_err();
            assert!(matches!(err, CoreError::Invalid(_)), "{raw:?}: {err}");
        }
    }

    #[test]
    fn integral_float_parallelism_is_accepted() {
        let cfg = SquashConfig::from_lookup(&lookup_from(&[("SQUASH_PARALLELISM", "4.0")])).unwrap();
        assert_eq!(cfg.throttle.parallelism, 4);
    }

    #[test]
    fn unparsable_timeout_keeps_default() {
        let cfg = SquashConfig::from_lookup(&lookup_from(&[(
            "SQUASH_HTML_MINIFIER_TIMEOUT_SECS",
            "soon",
        )]))
        .unwrap();
        assert_eq!(cfg.html.timeout_secs, 30);
    }

    #[test]
    fn parse_toml_with_options() {
        let toml = r#"
[throttle]
parallelism = 3

[html]
binary = "minify-html"
timeout_secs = 10

[html.options]
removeComments = false
maxLineLength = 120
"#;
        let cfg = SquashConfig::from_toml_with(toml, &lookup_from(&[])).unwrap();
        assert_eq!(cfg.throttle.parallelism, 3);
        assert_eq!(cfg.html.binary, "minify-html");
        assert_eq!(cfg.html.options["removeComments"], Value::Bool(false));
        assert_eq!(cfg.html.options["maxLineLength"], Value::from(120));
    }

    #[test]
    fn env_overrides_toml() {
        let toml = "[throttle]\nparallelism = 3\n";
        let cfg =
            SquashConfig::from_toml_with(toml, &lookup_from(&[("SQUASH_PARALLELISM", "9")])).unwrap();
        assert_eq!(cfg.throttle.parallelism, 9);
    }

    #[test]
    fn zero_parallelism_is_invalid() {
        let toml = "[throttle]\nparallelism = 0\n";
        let err = SquashConfig::from_toml_with(toml, &lookup_from(&[])).unwrap_err();
        assert!(matches!(err, CoreError::Invalid(_)));
    }

    #[test]
    fn empty_binary_is_invalid() {
        let toml = "[html]\nbinary = \"  \"\n";
        assert!(SquashConfig::from_toml_with(toml, &lookup_from(&[])).is_err());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = SquashConfig::from_toml_with("[throttle\n", &lookup_from(&[])).unwrap_err();
        assert!(matches!(err, CoreError::TomlParse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[html]\ntimeout_secs = 45").unwrap();
        let cfg = SquashConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.html.timeout_secs, 45);
    }
}
