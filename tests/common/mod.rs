//! Shared helpers for the integration tests.
//!
//! `TestEnv` keeps the session and context files in a temporary config
//! directory so tests never touch `~/.config/kidsview-cli` and can run in
//! parallel.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use kidsview_cli::config::Settings;
use kidsview_cli::context::{Context, ContextStore};
use kidsview_cli::session::{now, SessionStore, Tokens};
pub use tempfile::TempDir;

/// A session that stays valid for the whole test run.
pub fn fresh_tokens(id_token: &str) -> Tokens {
    Tokens::new(
        id_token,
        format!("{id_token}-ACCESS"),
        Some("R1".to_string()),
        now() + 3600,
    )
}

pub struct TestEnv {
    pub config_dir: TempDir,
    vars: HashMap<String, String>,
}

impl TestEnv {
    pub fn new() -> Self {
        let config_dir = TempDir::new().unwrap();
        let mut vars = HashMap::new();
        vars.insert(
            "KIDSVIEW_CONFIG_DIR".to_string(),
            config_dir.path().display().to_string(),
        );
        vars.insert(
            "KIDSVIEW_DOWNLOAD_DIR".to_string(),
            config_dir.path().join("downloads").display().to_string(),
        );
        Self { config_dir, vars }
    }

    /// Point the GraphQL client at `url`.
    pub fn with_api(mut self, url: impl Into<String>) -> Self {
        self.vars.insert("KIDSVIEW_API_URL".to_string(), url.into());
        self
    }

    /// Point the identity provider at `url`.
    pub fn with_cognito(mut self, url: impl Into<String>) -> Self {
        self.vars.insert("KIDSVIEW_COGNITO_URL".to_string(), url.into());
        self
    }

    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn path(&self) -> &Path {
        self.config_dir.path()
    }

    pub fn session_file(&self) -> PathBuf {
        self.path().join("session.json")
    }

    pub fn context_file(&self) -> PathBuf {
        self.path().join("context.json")
    }

    /// Settings built from this environment only.
    pub fn settings(&self) -> Settings {
        Settings::from_lookup(|key| self.vars.get(key).cloned()).unwrap()
    }

    pub fn write_session(&self, tokens: &Tokens) {
        SessionStore::new(self.session_file()).save(tokens).unwrap();
    }

    pub fn read_session(&self) -> Option<Tokens> {
        SessionStore::new(self.session_file()).load()
    }

    pub fn write_context(&self, context: &Context) {
        ContextStore::new(self.context_file()).save(context).unwrap();
    }

    pub fn read_context(&self) -> Option<Context> {
        ContextStore::new(self.context_file()).load()
    }

    /// The binary with this environment and nothing inherited that could
    /// change its behavior.
    pub fn cli(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_kidsview-cli"));
        cmd.current_dir(self.path());
        for key in [
            "KIDSVIEW_COOKIES",
            "KIDSVIEW_DEBUG",
            "KIDSVIEW_USERNAME",
            "KIDSVIEW_PASSWORD",
            "KIDSVIEW_AUTH_TOKEN_PREFERENCE",
            "RUST_LOG",
        ] {
            cmd.env_remove(key);
        }
        cmd.envs(&self.vars);
        cmd.arg("--no-interactive");
        cmd
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
