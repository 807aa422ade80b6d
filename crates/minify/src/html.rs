//! `html-minifier-terser` adapter.
//!
//! The adapter owns the default option set and the merge with user options;
//! the actual minification is delegated to an [`HtmlMinifierBackend`]. The
//! stock backend is [`CommandBackend`], which drives the external executable.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use squash_core::HtmlConfig;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::MinifyError;
use crate::merge::deep_merge;
use crate::types::{Input, Minified, Minimizer, MinimizerOptions};

/// Registry name of the adapter.
pub const HTML_MINIFIER_TERSER: &str = "html-minifier-terser";

/// Options applied unless the caller overrides them.
///
/// Options that are unsafe for arbitrary markup (attribute quote removal,
/// empty/redundant attribute removal, boolean attribute collapsing, URL
/// minification, short doctype) stay off.
pub fn default_options() -> MinimizerOptions {
    [
        "caseSensitive",
        "collapseWhitespace",
        "conservativeCollapse",
        "keepClosingSlash",
        "minifyCSS",
        "minifyJS",
        "removeComments",
        "removeScriptTypeAttributes",
        "removeStyleLinkTypeAttributes",
    ]
    .into_iter()
    .map(|key| (key.to_string(), Value::Bool(true)))
    .collect()
}

/// Something that turns HTML into minified HTML given a full option set.
#[async_trait]
pub trait HtmlMinifierBackend: Send + Sync {
    async fn minify(&self, code: &str, options: &MinimizerOptions) -> Result<String, MinifyError>;
}

/// Minimizer that forwards to an HTML minifier backend with merged options.
pub struct HtmlMinifierTerser<B = CommandBackend> {
    backend: B,
}

impl<B: HtmlMinifierBackend> HtmlMinifierTerser<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Defaults overlaid with `user`, which wins key by key.
    pub fn effective_options(user: &MinimizerOptions) -> MinimizerOptions {
        deep_merge(&default_options(), user)
    }
}

impl HtmlMinifierTerser<CommandBackend> {
    pub fn from_config(config: &HtmlConfig) -> Self {
        Self::new(CommandBackend::from_config(config))
    }
}

#[async_trait]
impl<B: HtmlMinifierBackend> Minimizer for HtmlMinifierTerser<B> {
    fn name(&self) -> &str {
        HTML_MINIFIER_TERSER
    }

    async fn minify(&self, input: &Input, options: &MinimizerOptions) -> Result<Minified, MinifyError> {
        let code = input.values().next().ok_or(MinifyError::EmptyInput)?;
        let effective = Self::effective_options(options);
        Ok(self.backend.minify(code, &effective).await?.into())
    }
}

// ── External executable backend ──────────────────────────────────────

/// Runs an external HTML minifier, feeding code on stdin and reading stdout.
///
/// Options become command-line flags, see [`option_flags`].
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: String,
    timeout: Duration,
}

impl CommandBackend {
    const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_config(config: &HtmlConfig) -> Self {
        Self::new(config.binary.clone()).with_timeout(Duration::from_secs(config.timeout_secs))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    async fn run(&self, code: &str, args: &[String]) -> Result<String, MinifyError> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MinifyError::Process(format!("failed to spawn '{}': {e}", self.program)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| MinifyError::Process("child stdin was not captured".into()))?;
        let source = code.as_bytes().to_vec();

        // Write and read concurrently so a large document cannot fill both pipes.
        let feed = async move {
            stdin.write_all(&source).await?;
            drop(stdin);
            Ok::<_, std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MinifyError::Process(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        fed?;

        String::from_utf8(output.stdout)
            .map_err(|e| MinifyError::Process(format!("'{}' produced non-UTF-8 output: {e}", self.program)))
    }
}

#[async_trait]
impl HtmlMinifierBackend for CommandBackend {
    async fn minify(&self, code: &str, options: &MinimizerOptions) -> Result<String, MinifyError> {
        let args = option_flags(options);
        debug!(
            program = %self.program,
            args = ?args,
            bytes = code.len(),
            "invoking external HTML minifier"
        );

        match tokio::time::timeout(self.timeout, self.run(code, &args)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(program = %self.program, timeout = ?self.timeout, "HTML minifier timed out");
                Err(MinifyError::Timeout(self.timeout))
            }
        }
    }
}

/// Translate options into kebab-case command-line flags.
///
/// `true` becomes a bare flag, `false` and `null` are omitted, strings and
/// numbers follow the flag as its value, arrays and objects are passed as JSON.
pub fn option_flags(options: &MinimizerOptions) -> Vec<String> {
    let mut args = Vec::with_capacity(options.len());
    for (key, value) in options {
        let flag = format!("--{}", kebab_case(key));
        match value {
            Value::Bool(true) => args.push(flag),
            Value::Bool(false) | Value::Null => {}
            Value::String(s) => {
                args.push(flag);
                args.push(s.clone());
            }
            other => {
                args.push(flag);
                args.push(other.to_string());
            }
        }
    }
    args
}

/// `removeStyleLinkTypeAttributes` -> `remove-style-link-type-attributes`,
/// `minifyCSS` -> `minify-css`.
fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev_lower = false;
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn kebab_case_handles_acronyms() {
        assert_eq!(kebab_case("caseSensitive"), "case-sensitive");
        assert_eq!(kebab_case("minifyCSS"), "minify-css");
        assert_eq!(kebab_case("minifyURLs"), "minify-urls");
        assert_eq!(kebab_case("removeStyleLinkTypeAttributes"), "remove-style-link-type-attributes");
        assert_eq!(kebab_case("html5"), "html5");
    }

    #[test]
    fn flags_from_option_values() {
        let options = match json!({
            "collapseWhitespace": true,
            "removeComments": false,
            "ignoreCustomComments": null,
            "maxLineLength": 80,
            "quoteCharacter": "'",
            "ignoreCustomFragments": ["<%[\\s\\S]*?%>"],
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let args = option_flags(&options);

        assert!(args.contains(&"--collapse-whitespace".to_string()));
        assert!(!args.iter().any(|a| a == "--remove-comments"));
        assert!(!args.iter().any(|a| a == "--ignore-custom-comments"));

        let pos = args.iter().position(|a| a == "--max-line-length").unwrap();
        assert_eq!(args[pos + 1], "80");
        let pos = args.iter().position(|a| a == "--quote-character").unwrap();
        assert_eq!(args[pos + 1], "'");
        let pos = args.iter().position(|a| a == "--ignore-custom-fragments").unwrap();
        assert_eq!(args[pos + 1], r#"["<%[\\s\\S]*?%>"]"#);
    }

    #[test]
    fn defaults_enable_only_safe_options() {
        let defaults = default_options();
        assert_eq!(defaults.len(), 9);
        assert!(defaults.values().all(|v| v == &Value::Bool(true)));
        assert!(!defaults.contains_key("removeAttributeQuotes"));
        assert!(!defaults.contains_key("useShortDoctype"));
    }

    #[test]
    fn user_options_override_defaults() {
        let user = match json!({ "removeComments": false, "sortAttributes": true }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let effective = HtmlMinifierTerser::<CommandBackend>::effective_options(&user);

        assert_eq!(effective["removeComments"], json!(false));
        assert_eq!(effective["sortAttributes"], json!(true));
        assert_eq!(effective["collapseWhitespace"], json!(true));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_backend_pipes_code_through_program() {
        let backend = CommandBackend::new("cat");
        let out = backend
            .minify("<p>  hello  </p>", &MinimizerOptions::new())
            .await
            .unwrap();
        assert_eq!(out, "<p>  hello  </p>");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_backend_reports_non_zero_exit() {
        let err = CommandBackend::new("false")
            .minify("<p></p>", &MinimizerOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MinifyError::Process(_)));
    }

    #[tokio::test]
    async fn command_backend_reports_missing_program() {
        let err = CommandBackend::new("squash-no-such-minifier-binary")
            .minify("<p></p>", &MinimizerOptions::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }
}
