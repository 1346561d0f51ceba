// Settings: everything the client needs to know about the outside world,
// resolved once per run from `KIDSVIEW_*` environment variables on top of
// built-in defaults. Components receive a `Settings` value when they are
// constructed; nothing reads the environment behind their back.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

pub const ENV_PREFIX: &str = "KIDSVIEW_";

const DEFAULT_CLIENT_ID: &str = "4k8c50cn6ri9hk6197p9bnl0g4";
const DEFAULT_USER_POOL_ID: &str = "eu-west-1_PZZVGIN20";
const DEFAULT_REGION: &str = "eu-west-1";
const DEFAULT_API_URL: &str = "https://backend.kidsview.pl/graphql";
const DEFAULT_APP_URL: &str = "https://app.kidsview.pl";
const DEFAULT_LOCALE: &str = "pl";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/605.1.15 (KHTML, like Gecko) Version/26.0 Safari/605.1.15";
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Which JWT goes into the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenPreference {
    #[default]
    Id,
    Access,
}

impl std::str::FromStr for TokenPreference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(TokenPreference::Id),
            "access" => Ok(TokenPreference::Access),
            other => Err(Error::Config(format!(
                "{ENV_PREFIX}AUTH_TOKEN_PREFERENCE must be `id` or `access`, got `{other}`"
            ))),
        }
    }
}

/// Process-wide configuration. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Settings {
    pub region: String,
    pub user_pool_id: Option<String>,
    pub client_id: String,
    /// Cognito endpoint; derived from `region` unless overridden.
    pub cognito_url: String,
    pub api_url: String,
    pub app_url: String,
    pub locale: String,
    pub user_agent: String,
    pub config_dir: PathBuf,
    pub session_file: PathBuf,
    pub context_file: PathBuf,
    pub download_dir: PathBuf,
    /// Verbatim cookie header that replaces the stored context.
    pub cookies: Option<String>,
    pub auth_token_preference: TokenPreference,
    pub timeout: Duration,
    pub debug: bool,
}

impl Settings {
    /// Resolve settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings from an arbitrary key lookup. Keys are the full
    /// variable names, e.g. `KIDSVIEW_REGION`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let config_dir = get("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".config").join("kidsview-cli"));
        let session_file = get("SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| config_dir.join("session.json"));
        let context_file = get("CONTEXT_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| config_dir.join("context.json"));
        let download_dir = get("DOWNLOAD_DIR").map(PathBuf::from).unwrap_or_else(|| {
            dirs::picture_dir()
                .unwrap_or_else(|| home.join("Pictures"))
                .join("Kidsview")
        });

        let region = get("REGION").unwrap_or_else(|| DEFAULT_REGION.to_string());
        let cognito_url = get("COGNITO_URL")
            .unwrap_or_else(|| format!("https://cognito-idp.{region}.amazonaws.com/"));

        let cookies = get("COOKIES");
        if let Some(cookies) = &cookies {
            validate_cookie_override(cookies)?;
        }

        let auth_token_preference = match get("AUTH_TOKEN_PREFERENCE") {
            Some(value) => value.parse()?,
            None => TokenPreference::default(),
        };

        let debug = match get("DEBUG") {
            Some(value) => parse_bool("DEBUG", &value)?,
            None => false,
        };

        let timeout = match get("TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(value.parse().map_err(|_| {
                Error::Config(format!(
                    "{ENV_PREFIX}TIMEOUT_SECS must be a whole number of seconds, got `{value}`"
                ))
            })?),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Settings {
            region,
            // An explicitly empty value disables the default pool.
            user_pool_id: match lookup(&format!("{ENV_PREFIX}USER_POOL_ID")) {
                Some(v) if v.trim().is_empty() => None,
                Some(v) => Some(v.trim().to_string()),
                None => Some(DEFAULT_USER_POOL_ID.to_string()),
            },
            client_id: get("CLIENT_ID").unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
            cognito_url,
            api_url: get("API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            app_url: get("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.to_string()),
            locale: get("LOCALE").unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            user_agent: get("USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            config_dir,
            session_file,
            context_file,
            download_dir,
            cookies,
            auth_token_preference,
            timeout,
            debug,
        })
    }

    /// Same settings with debug output forced on (the `--debug` flag).
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = self.debug || debug;
        self
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "{ENV_PREFIX}{name} must be a boolean (1/0, true/false), got `{value}`"
        ))),
    }
}

/// The override replaces the whole cookie header, so it has to look like one.
fn validate_cookie_override(cookies: &str) -> Result<()> {
    let mut pairs = 0;
    for part in cookies.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('=') {
            Some((name, _)) if !name.trim().is_empty() => pairs += 1,
            _ => {
                return Err(Error::Config(format!(
                    "{ENV_PREFIX}COOKIES: `{part}` is not a name=value pair"
                )))
            }
        }
    }
    if pairs == 0 {
        return Err(Error::Config(format!(
            "{ENV_PREFIX}COOKIES does not contain any name=value pair"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_point_at_the_hosted_platform() {
        let s = settings(&[("KIDSVIEW_CONFIG_DIR", "/tmp/kv")]).unwrap();
        assert_eq!(s.api_url, DEFAULT_API_URL);
        assert_eq!(s.region, "eu-west-1");
        assert_eq!(s.cognito_url, "https://cognito-idp.eu-west-1.amazonaws.com/");
        assert_eq!(s.user_pool_id.as_deref(), Some(DEFAULT_USER_POOL_ID));
        assert_eq!(s.auth_token_preference, TokenPreference::Id);
        assert_eq!(s.session_file, PathBuf::from("/tmp/kv/session.json"));
        assert_eq!(s.context_file, PathBuf::from("/tmp/kv/context.json"));
        assert_eq!(s.timeout, Duration::from_secs(20));
        assert!(!s.debug);
        assert!(s.cookies.is_none());
    }

    #[test]
    fn environment_overrides_apply() {
        let s = settings(&[
            ("KIDSVIEW_REGION", "eu-central-1"),
            ("KIDSVIEW_AUTH_TOKEN_PREFERENCE", "ACCESS"),
            ("KIDSVIEW_DEBUG", "1"),
            ("KIDSVIEW_TIMEOUT_SECS", "5"),
            ("KIDSVIEW_SESSION_FILE", "/elsewhere/s.json"),
            ("KIDSVIEW_COOKIES", "active_child=1; locale=pl"),
        ])
        .unwrap();
        assert_eq!(s.cognito_url, "https://cognito-idp.eu-central-1.amazonaws.com/");
        assert_eq!(s.auth_token_preference, TokenPreference::Access);
        assert!(s.debug);
        assert_eq!(s.timeout, Duration::from_secs(5));
        assert_eq!(s.session_file, PathBuf::from("/elsewhere/s.json"));
        assert_eq!(s.cookies.as_deref(), Some("active_child=1; locale=pl"));
    }

    #[test]
    fn empty_user_pool_disables_default() {
        let s = settings(&[("KIDSVIEW_USER_POOL_ID", "")]).unwrap();
        assert!(s.user_pool_id.is_none());
    }

    #[test]
    fn malformed_values_are_config_errors() {
        for (key, value) in [
            ("KIDSVIEW_AUTH_TOKEN_PREFERENCE", "refresh"),
            ("KIDSVIEW_DEBUG", "maybe"),
            ("KIDSVIEW_TIMEOUT_SECS", "soon"),
            ("KIDSVIEW_COOKIES", "active_child"),
            ("KIDSVIEW_COOKIES", "=value"),
            ("KIDSVIEW_COOKIES", ";;"),
        ] {
            let err = settings(&[(key, value)]).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{key}={value} gave {err:?}");
        }
    }

    #[test]
    fn debug_flag_only_turns_debug_on() {
        let s = settings(&[("KIDSVIEW_DEBUG", "true")]).unwrap();
        assert!(s.with_debug(false).debug);
        let s = settings(&[]).unwrap();
        assert!(s.with_debug(true).debug);
    }
}
