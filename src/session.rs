// Cached Cognito tokens and the file they live in.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::config::TokenPreference;
use crate::error::{Error, Result};
use crate::store::JsonFile;

/// Tokens count as expired this many seconds before the provider says so.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// Token set returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokens {
    pub id_token: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds). Missing in old files, which makes them
    /// expired on first use.
    #[serde(default)]
    pub expires_at: i64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "JWT".to_string()
}

impl Tokens {
    pub fn new(
        id_token: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_at: i64,
    ) -> Self {
        Tokens {
            id_token: id_token.into(),
            access_token: access_token.into(),
            refresh_token,
            expires_at,
            token_type: default_token_type(),
        }
    }

    /// Whether the tokens must be refreshed before use at `now` (unix seconds).
    pub fn is_expired(&self, now: i64) -> bool {
        now + EXPIRY_MARGIN_SECS >= self.expires_at
    }

    /// Value of the `Authorization` header, e.g. `JWT eyJ...`. Falls back to
    /// the other token when the preferred one is empty.
    pub fn authorization(&self, preference: TokenPreference) -> Result<String> {
        let (first, second) = match preference {
            TokenPreference::Id => (&self.id_token, &self.access_token),
            TokenPreference::Access => (&self.access_token, &self.id_token),
        };
        let token = [first, second]
            .into_iter()
            .find(|t| !t.is_empty())
            .ok_or_else(|| Error::Auth("session holds no usable token".into()))?;
        let prefix = if self.token_type.is_empty() {
            "JWT"
        } else {
            self.token_type.as_str()
        };
        Ok(format!("{prefix} {token}"))
    }
}

/// Read the `exp` claim of a JWT without verifying it.
pub fn jwt_expiry(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_i64()
}

/// Current unix time in seconds.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Session file holding the last issued tokens.
#[derive(Debug, Clone)]
pub struct SessionStore {
    file: JsonFile,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionStore {
            file: JsonFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn load(&self) -> Option<Tokens> {
        self.file.load()
    }

    pub fn save(&self, tokens: &Tokens) -> Result<()> {
        tracing::debug!(path = %self.path().display(), expires_at = tokens.expires_at, "saving session");
        self.file.save(tokens)
    }

    pub fn delete(&self) -> Result<()> {
        self.file.delete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tokens(expires_at: i64) -> Tokens {
        Tokens::new("ID", "ACCESS", Some("REFRESH".into()), expires_at)
    }

    #[test]
    fn expiry_boundary_sits_at_the_margin() {
        let now = 1_700_000_000;
        assert!(tokens(now - 10).is_expired(now));
        assert!(tokens(now).is_expired(now));
        assert!(tokens(now + EXPIRY_MARGIN_SECS).is_expired(now));
        assert!(tokens(now + EXPIRY_MARGIN_SECS - 1).is_expired(now));
        assert!(!tokens(now + EXPIRY_MARGIN_SECS + 1).is_expired(now));
        assert!(!tokens(now + 3600).is_expired(now));
    }

    #[test]
    fn authorization_follows_preference() {
        let t = tokens(0);
        assert_eq!(t.authorization(TokenPreference::Id).unwrap(), "JWT ID");
        assert_eq!(t.authorization(TokenPreference::Access).unwrap(), "JWT ACCESS");

        let only_access = Tokens::new("", "ACCESS", None, 0);
        assert_eq!(
            only_access.authorization(TokenPreference::Id).unwrap(),
            "JWT ACCESS"
        );
        assert!(Tokens::new("", "", None, 0)
            .authorization(TokenPreference::Id)
            .is_err());
    }

    #[test]
    fn jwt_expiry_reads_exp_claim() {
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"u","exp":1700000123}"#);
        let token = format!("eyJhbGciOiJub25lIn0.{payload}.sig");
        assert_eq!(jwt_expiry(&token), Some(1_700_000_123));
        assert_eq!(jwt_expiry("not-a-jwt"), None);
        assert_eq!(jwt_expiry("a.!!!.c"), None);
    }

    #[test]
    fn store_round_trips_and_ignores_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert!(store.load().is_none());

        let t = tokens(42);
        store.save(&t).unwrap();
        assert_eq!(store.load(), Some(t));

        fs::write(store.path(), "{\"id_token\": \"ID\", \"access_").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn legacy_file_without_expiry_loads_as_expired() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        fs::write(
            store.path(),
            r#"{"id_token":"ID","access_token":"AT","refresh_token":null,"expires_in":null,"token_type":"JWT"}"#,
        )
        .unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.expires_at, 0);
        assert!(loaded.is_expired(now()));
        assert!(loaded.refresh_token.is_none());
    }
}
