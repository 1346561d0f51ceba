// GraphQL client for the Kidsview backend. Holds the blocking reqwest client,
// the session file and the active context, and takes care of the token
// lifecycle around each request: log in when there is no session, refresh
// when the cached token is stale, and refresh-and-retry once when the
// platform rejects the token anyway.

use reqwest::blocking::Client;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CACHE_CONTROL, COOKIE, ORIGIN,
    PRAGMA, REFERER, USER_AGENT,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::auth::{CredentialPrompt, IdentityProvider};
use crate::config::Settings;
use crate::context::{cookie_header, Context};
use crate::error::{Error, Result};
use crate::resolver::{profile_request, Profile, ProfileSource};
use crate::session::{now, SessionStore, Tokens};

/// A GraphQL response envelope without errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    envelope: Value,
}

impl Response {
    /// Wrap a decoded envelope. An `errors` array turns into
    /// `Error::GraphQL` carrying the messages, any partial data and the
    /// envelope itself.
    pub fn from_envelope(envelope: Value) -> Result<Self> {
        if !envelope.is_object() {
            return Err(Error::UnexpectedResponse(
                "GraphQL response is not a JSON object".into(),
            ));
        }
        let messages = error_messages(&envelope);
        if !messages.is_empty() {
            let data = envelope.get("data").filter(|d| !d.is_null()).cloned();
            return Err(Error::GraphQL {
                messages,
                data,
                envelope,
            });
        }
        Ok(Response { envelope })
    }

    /// The `data` object, or `null` when the server sent none.
    pub fn data(&self) -> &Value {
        self.envelope.get("data").unwrap_or(&Value::Null)
    }

    /// `data.<key>`, or `null`.
    pub fn field(&self, key: &str) -> &Value {
        self.data().get(key).unwrap_or(&Value::Null)
    }

    /// The full envelope as the server sent it.
    pub fn envelope(&self) -> &Value {
        &self.envelope
    }
}

/// Messages of the `errors` array, verbatim.
fn error_messages(envelope: &Value) -> Vec<String> {
    envelope
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .map(|e| match e.get("message").and_then(Value::as_str) {
                    Some(message) => message.to_string(),
                    None => e.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub struct GraphQLClient {
    http: Client,
    settings: Settings,
    sessions: SessionStore,
    identity: Box<dyn IdentityProvider>,
    prompt: Box<dyn CredentialPrompt>,
    context: Option<Context>,
}

impl GraphQLClient {
    pub fn new(
        settings: Settings,
        identity: Box<dyn IdentityProvider>,
        prompt: Box<dyn CredentialPrompt>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(Error::Network)?;
        Ok(GraphQLClient {
            http,
            sessions: SessionStore::new(&settings.session_file),
            settings,
            identity,
            prompt,
            context: None,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Context sent with every following request. Ignored while the cookie
    /// override is configured.
    pub fn set_context(&mut self, context: Option<Context>) {
        self.context = context;
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Run one query or mutation.
    pub fn execute(&self, query: &str, variables: Value) -> Result<Response> {
        let body = json!({ "query": query, "variables": variables });
        let (mut tokens, mut refreshed) = self.current_tokens()?;

        for attempt in 0..=1 {
            let res = self
                .http
                .post(&self.settings.api_url)
                .headers(self.headers(&tokens)?)
                .json(&body)
                .send()?;
            let status = res.status();
            tracing::debug!(attempt, status = status.as_u16(), "GraphQL response");

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                if refreshed {
                    return Err(Error::Auth(format!(
                        "the platform rejected the session (HTTP {})",
                        status.as_u16()
                    )));
                }
                tracing::debug!("token rejected, refreshing and retrying once");
                tokens = self.renew(&tokens)?;
                refreshed = true;
                continue;
            }

            let text = res.text()?;
            return decode(status, text);
        }

        Err(Error::Auth("the platform rejected the session".into()))
    }

    /// Make sure a usable session exists before anything is drawn on the
    /// terminal, logging in or refreshing as needed.
    pub fn ensure_session(&self) -> Result<Tokens> {
        self.current_tokens().map(|(tokens, _)| tokens)
    }

    /// Refresh the stored session now (the `refresh` command).
    pub fn refresh_session(&self) -> Result<Tokens> {
        let tokens = self.sessions.load().ok_or(Error::NotLoggedIn)?;
        if tokens.refresh_token.is_none() {
            return Err(Error::Auth(
                "no refresh token in the session; log in again".into(),
            ));
        }
        self.renew(&tokens)
    }

    /// Cached tokens, renewed when stale. The flag tells whether a new token
    /// was already obtained during this call.
    fn current_tokens(&self) -> Result<(Tokens, bool)> {
        match self.sessions.load() {
            None => {
                tracing::debug!(path = %self.sessions.path().display(), "no session");
                Ok((self.login_interactively()?, true))
            }
            Some(tokens) if tokens.is_expired(now()) => {
                tracing::debug!(expires_at = tokens.expires_at, "session is stale");
                Ok((self.renew(&tokens)?, true))
            }
            Some(tokens) => Ok((tokens, false)),
        }
    }

    /// Exchange the refresh token, or fall back to a fresh login when there
    /// is none. A rejected refresh token removes the session file.
    fn renew(&self, tokens: &Tokens) -> Result<Tokens> {
        let Some(refresh_token) = tokens.refresh_token.as_deref() else {
            return self.login_interactively();
        };
        match self.identity.refresh(refresh_token) {
            Ok(mut renewed) => {
                if renewed.refresh_token.is_none() {
                    renewed.refresh_token = Some(refresh_token.to_string());
                }
                self.sessions.save(&renewed)?;
                Ok(renewed)
            }
            Err(err @ Error::Auth(_)) => {
                tracing::debug!(error = %err, "refresh rejected, removing session");
                self.sessions.delete()?;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    fn login_interactively(&self) -> Result<Tokens> {
        let credentials = self.prompt.credentials(None)?;
        let tokens = self
            .identity
            .login(&credentials.username, &credentials.password)?;
        self.sessions.save(&tokens)?;
        Ok(tokens)
    }

    fn headers(&self, tokens: &Tokens) -> Result<HeaderMap> {
        let settings = &self.settings;
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            header_value(
                "Authorization",
                &tokens.authorization(settings.auth_token_preference)?,
            )?,
        );
        let cookies = settings
            .cookies
            .clone()
            .or_else(|| cookie_header(self.context.as_ref(), &settings.locale));
        if let Some(cookies) = cookies {
            headers.insert(COOKIE, header_value("Cookie", &cookies)?);
        }
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ORIGIN, header_value("Origin", &settings.app_url)?);
        headers.insert(REFERER, header_value("Referer", &format!("{}/", settings.app_url))?);
        headers.insert(
            ACCEPT_LANGUAGE,
            header_value("Accept-Language", &format!("{},en;q=0.8", settings.locale))?,
        );
        headers.insert(USER_AGENT, header_value("User-Agent", &settings.user_agent)?);
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        Ok(headers)
    }
}

impl ProfileSource for GraphQLClient {
    fn profile(&self) -> Result<Profile> {
        let (query, variables) = profile_request();
        let response = self.execute(query, variables)?;
        Profile::from_graphql(response.data())
    }
}

/// Turn a non-auth HTTP answer into a `Response` or an error. A 400 whose
/// body is a GraphQL envelope reports the GraphQL errors.
fn decode(status: StatusCode, text: String) -> Result<Response> {
    let parsed: Option<Value> = serde_json::from_str(&text).ok();
    match parsed {
        Some(envelope) if status.is_success() => Response::from_envelope(envelope),
        Some(envelope)
            if status == StatusCode::BAD_REQUEST
                && (envelope.get("errors").is_some() || envelope.get("data").is_some()) =>
        {
            Response::from_envelope(envelope)
        }
        None if status.is_success() => Err(Error::UnexpectedResponse(
            "GraphQL endpoint returned a body that is not JSON".into(),
        )),
        _ => Err(Error::Http {
            status: status.as_u16(),
            body: text,
        }),
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| {
        Error::Config(format!("{name} header contains characters HTTP does not allow"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_with_errors_becomes_graphql_error() {
        let err = Response::from_envelope(json!({
            "errors": [ { "message": "Odmowa dostępu" }, { "path": ["x"] } ],
            "data": { "partial": 1 },
        }))
        .unwrap_err();
        match err {
            Error::GraphQL {
                messages,
                data,
                envelope,
            } => {
                assert_eq!(messages[0], "Odmowa dostępu");
                assert_eq!(envelope["errors"].as_array().map(Vec::len), Some(2));
                assert!(messages[1].contains("path"));
                assert_eq!(data, Some(json!({ "partial": 1 })));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_errors_array_is_success() {
        let res = Response::from_envelope(json!({ "data": { "me": { "id": "1" } }, "errors": [] }))
            .unwrap();
        assert_eq!(res.field("me")["id"], "1");
        assert_eq!(res.field("missing"), &Value::Null);
    }

    #[test]
    fn decode_classifies_statuses() {
        assert!(decode(StatusCode::OK, r#"{"data":{}}"#.into()).is_ok());
        assert!(matches!(
            decode(StatusCode::BAD_REQUEST, r#"{"errors":[{"message":"bad var"}]}"#.into()),
            Err(Error::GraphQL { .. })
        ));
        assert!(matches!(
            decode(StatusCode::BAD_REQUEST, "oops".into()),
            Err(Error::Http { status: 400, .. })
        ));
        assert!(matches!(
            decode(StatusCode::INTERNAL_SERVER_ERROR, r#"{"data":null}"#.into()),
            Err(Error::Http { status: 500, .. })
        ));
        assert!(matches!(
            decode(StatusCode::OK, "<html>".into()),
            Err(Error::UnexpectedResponse(_))
        ));
    }
}
