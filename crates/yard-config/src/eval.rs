//! Expression functions embedded in configuration strings.
//!
//! Supports:
//! - `${env(NAME)}` - Value of an environment variable, empty when unset
//! - `${k8s_config(CLUSTER)}` - Path of the kubeconfig written for a cluster
//!
//! The argument may be wrapped in single or double quotes. Each load gets its
//! own [`EvalContext`], so separate loads never share environment or state.

use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::{ConfigError, ConfigResult};

/// State directory used when neither `YARD_STATE_DIR` nor `HOME` is set.
pub const DEFAULT_STATE_DIR: &str = ".yard";

// Regex for matching ${function(arg)} calls
static CALL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\$\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\(\s*["']?([^"'()]*?)["']?\s*\)\s*\}"#)
        .expect("expression regex is valid")
});

/// Evaluation context for one configuration load.
#[derive(Debug, Clone)]
pub struct EvalContext {
    /// Environment visible to `env()`.
    env: HashMap<String, String>,
    /// Root of generated state such as kubeconfigs.
    state_dir: PathBuf,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalContext {
    /// Create a context with an empty environment.
    pub fn new() -> Self {
        Self {
            env: HashMap::new(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
        }
    }

    /// Create a context from the current process environment.
    pub fn from_process() -> Self {
        EvalContextBuilder::from_process().build()
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Look up an environment variable in this context.
    pub fn env(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    /// Path of the kubeconfig for a cluster.
    pub fn kube_config_path(&self, cluster: &str) -> PathBuf {
        self.state_dir
            .join("config")
            .join(cluster)
            .join("kubeconfig.yaml")
    }

    /// Evaluate a single function call.
    pub fn call(&self, function: &str, arg: &str) -> ConfigResult<String> {
        match function {
            "env" => Ok(self.env(arg).unwrap_or_default().to_string()),
            "k8s_config" => Ok(self.kube_config_path(arg).to_string_lossy().into_owned()),
            _ => Err(ConfigError::UnknownFunction(function.to_string())),
        }
    }

    /// Replace every `${function(arg)}` in a string with its value.
    pub fn interpolate(&self, input: &str) -> ConfigResult<String> {
        let mut output = String::with_capacity(input.len());
        let mut last = 0;

        for caps in CALL_REGEX.captures_iter(input) {
            let (Some(whole), Some(function), Some(arg)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            output.push_str(&input[last..whole.start()]);
            output.push_str(&self.call(function.as_str(), arg.as_str())?);
            last = whole.end();
        }

        output.push_str(&input[last..]);
        Ok(output)
    }
}

/// Builder for creating EvalContext.
pub struct EvalContextBuilder {
    ctx: EvalContext,
}

impl EvalContextBuilder {
    pub fn new() -> Self {
        Self {
            ctx: EvalContext::new(),
        }
    }

    /// Start from the process environment.
    ///
    /// The state directory is `$YARD_STATE_DIR`, else `$HOME/.yard`.
    pub fn from_process() -> Self {
        let env: HashMap<String, String> = std::env::vars().collect();
        let state_dir = env
            .get("YARD_STATE_DIR")
            .map(PathBuf::from)
            .or_else(|| env.get("HOME").map(|h| Path::new(h).join(DEFAULT_STATE_DIR)))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));

        Self {
            ctx: EvalContext { env, state_dir },
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ctx.env.insert(key.into(), value.into());
        self
    }

    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ctx.state_dir = dir.into();
        self
    }

    pub fn build(self) -> EvalContext {
        self.ctx
    }
}

impl Default for EvalContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_function() {
        let ctx = EvalContextBuilder::new()
            .with_env("CONSUL_VERSION", "1.7.2")
            .build();

        assert_eq!(
            ctx.interpolate("consul:${env(CONSUL_VERSION)}").unwrap(),
            "consul:1.7.2"
        );
        assert_eq!(
            ctx.interpolate(r#"consul:${env("CONSUL_VERSION")}"#).unwrap(),
            "consul:1.7.2"
        );
    }

    #[test]
    fn test_unset_env_is_empty() {
        let ctx = EvalContext::new();
        assert_eq!(ctx.interpolate("[${env('MISSING')}]").unwrap(), "[]");
    }

    #[test]
    fn test_k8s_config_function() {
        let ctx = EvalContextBuilder::new()
            .with_state_dir("/home/dev/.yard")
            .build();

        assert_eq!(
            ctx.interpolate("${k8s_config(k3s)}").unwrap(),
            "/home/dev/.yard/config/k3s/kubeconfig.yaml"
        );
    }

    #[test]
    fn test_unknown_function() {
        let ctx = EvalContext::new();
        assert!(matches!(
            ctx.interpolate("${file(README.md)}"),
            Err(ConfigError::UnknownFunction(ref f)) if f == "file"
        ));
    }

    #[test]
    fn test_plain_text_and_braces_preserved() {
        let ctx = EvalContextBuilder::new().with_env("A", "1").build();
        assert_eq!(
            ctx.interpolate(r#"{"a": "${env(A)}", "b": "${b}"}"#).unwrap(),
            r#"{"a": "1", "b": "${b}"}"#
        );
    }

    #[test]
    fn test_contexts_are_isolated() {
        let first = EvalContextBuilder::new().with_env("NAME", "first").build();
        let second = EvalContextBuilder::new().with_env("NAME", "second").build();

        assert_eq!(first.interpolate("${env(NAME)}").unwrap(), "first");
        assert_eq!(second.interpolate("${env(NAME)}").unwrap(), "second");
    }
}
