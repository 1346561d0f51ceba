// Cognito client: SRP password login and refresh-token renewal. Talks to the
// user-pool JSON API directly over the same blocking reqwest client the rest
// of the crate uses.

use std::collections::HashMap;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::session::{jwt_expiry, now, Tokens};
use crate::srp::{self, PasswordVerifier, SrpSession};

const AMZ_JSON: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService.";
const PASSWORD_VERIFIER: &str = "PASSWORD_VERIFIER";
/// Lifetime assumed when neither the response nor the token says otherwise.
const DEFAULT_LIFETIME_SECS: i64 = 3600;

/// Something that can issue and renew tokens.
pub trait IdentityProvider {
    fn login(&self, username: &str, password: &str) -> Result<Tokens>;
    fn refresh(&self, refresh_token: &str) -> Result<Tokens>;
}

/// Username and password typed by the user or passed on the command line.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Asks for credentials when a command needs a session and none exists.
pub trait CredentialPrompt {
    /// `username` pre-fills the prompt when already known.
    fn credentials(&self, username: Option<&str>) -> Result<Credentials>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    challenge_name: Option<String>,
    #[serde(default)]
    challenge_parameters: HashMap<String, String>,
    session: Option<String>,
    authentication_result: Option<AuthenticationResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    id_token: String,
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type", default)]
    kind: String,
    #[serde(default, alias = "Message")]
    message: String,
}

/// Cognito user-pool client.
pub struct AuthClient {
    http: Client,
    endpoint: String,
    client_id: String,
    user_pool_id: Option<String>,
}

impl AuthClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(Error::Network)?;
        Ok(AuthClient {
            http,
            endpoint: settings.cognito_url.clone(),
            client_id: settings.client_id.clone(),
            user_pool_id: settings.user_pool_id.clone(),
        })
    }

    fn user_pool_id(&self) -> Result<&str> {
        self.user_pool_id.as_deref().ok_or_else(|| {
            Error::Config(
                "Missing user pool ID. Set KIDSVIEW_USER_POOL_ID from the Kidsview app config."
                    .into(),
            )
        })
    }

    /// POST one Cognito action and decode its JSON answer.
    fn call(&self, action: &str, body: &Value) -> Result<InitiateAuthResponse> {
        tracing::debug!(action, endpoint = %self.endpoint, "calling identity provider");
        let res = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, AMZ_JSON)
            .header("X-Amz-Target", format!("{TARGET_PREFIX}{action}"))
            .body(body.to_string())
            .send()?;

        let status = res.status();
        let text = res.text()?;
        if !status.is_success() {
            return Err(provider_error(status.as_u16(), &text));
        }
        serde_json::from_str(&text).map_err(|e| {
            Error::UnexpectedResponse(format!("identity provider sent malformed JSON: {e}"))
        })
    }
}

impl IdentityProvider for AuthClient {
    fn login(&self, username: &str, password: &str) -> Result<Tokens> {
        let pool_id = self.user_pool_id()?;
        let handshake = SrpSession::new(pool_id)?;

        let initiated = self.call(
            "InitiateAuth",
            &json!({
                "AuthFlow": "USER_SRP_AUTH",
                "ClientId": self.client_id,
                "AuthParameters": {
                    "USERNAME": username,
                    "SRP_A": handshake.public_key_hex(),
                },
                "ClientMetadata": {},
            }),
        )?;

        match initiated.challenge_name.as_deref() {
            Some(PASSWORD_VERIFIER) => {}
            Some(other) => return Err(Error::Challenge(other.to_string())),
            None => {
                return Err(Error::UnexpectedResponse(
                    "identity provider skipped the password verifier challenge".into(),
                ))
            }
        }

        let params = &initiated.challenge_parameters;
        let user_id = challenge_param(params, "USER_ID_FOR_SRP")?;
        let secret_block = challenge_param(params, "SECRET_BLOCK")?;
        let verifier = PasswordVerifier {
            user_id_for_srp: user_id,
            salt_hex: challenge_param(params, "SALT")?,
            srp_b_hex: challenge_param(params, "SRP_B")?,
            secret_block,
        };
        let timestamp = srp::timestamp(chrono::Utc::now());
        let signature = handshake.password_claim(&verifier, password, &timestamp)?;

        let mut body = json!({
            "ChallengeName": PASSWORD_VERIFIER,
            "ClientId": self.client_id,
            "ChallengeResponses": {
                "USERNAME": user_id,
                "PASSWORD_CLAIM_SECRET_BLOCK": secret_block,
                "TIMESTAMP": timestamp,
                "PASSWORD_CLAIM_SIGNATURE": signature,
            },
        });
        if let Some(session) = &initiated.session {
            body["Session"] = Value::String(session.clone());
        }

        let answered = self.call("RespondToAuthChallenge", &body)?;
        if let Some(challenge) = answered.challenge_name {
            return Err(Error::Challenge(challenge));
        }
        let result = answered.authentication_result.ok_or_else(|| {
            Error::UnexpectedResponse("no authentication result after password verifier".into())
        })?;
        tracing::debug!(username, "login succeeded");
        Ok(tokens_from_result(result, None, now()))
    }

    fn refresh(&self, refresh_token: &str) -> Result<Tokens> {
        self.user_pool_id()?;
        let answered = self.call(
            "InitiateAuth",
            &json!({
                "AuthFlow": "REFRESH_TOKEN_AUTH",
                "ClientId": self.client_id,
                "AuthParameters": { "REFRESH_TOKEN": refresh_token },
            }),
        )?;
        if let Some(challenge) = answered.challenge_name {
            return Err(Error::Challenge(challenge));
        }
        let result = answered.authentication_result.ok_or_else(|| {
            Error::UnexpectedResponse("refresh returned no authentication result".into())
        })?;
        tracing::debug!("tokens refreshed");
        Ok(tokens_from_result(result, Some(refresh_token), now()))
    }
}

fn challenge_param<'a>(params: &'a HashMap<String, String>, name: &str) -> Result<&'a str> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| Error::UnexpectedResponse(format!("challenge is missing {name}")))
}

/// Build `Tokens`, keeping `previous_refresh` when the provider did not
/// rotate the refresh token.
fn tokens_from_result(
    result: AuthenticationResult,
    previous_refresh: Option<&str>,
    now: i64,
) -> Tokens {
    let expires_at = result
        .expires_in
        .map(|secs| now + secs)
        .or_else(|| jwt_expiry(&result.id_token))
        .unwrap_or(now + DEFAULT_LIFETIME_SECS);
    let refresh_token = result
        .refresh_token
        .filter(|t| !t.is_empty())
        .or_else(|| previous_refresh.map(str::to_string));
    Tokens::new(result.id_token, result.access_token, refresh_token, expires_at)
}

/// Map a Cognito error body onto the crate error.
fn provider_error(status: u16, body: &str) -> Error {
    let parsed: ErrorBody = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(_) => {
            return Error::Http {
                status,
                body: body.to_string(),
            }
        }
    };
    // `__type` is sometimes namespaced, e.g. `com.amazon...#NotAuthorizedException`.
    let kind = parsed.kind.rsplit('#').next().unwrap_or_default();
    let message = if parsed.message.is_empty() {
        kind.to_string()
    } else {
        parsed.message
    };
    match kind {
        "NotAuthorizedException"
        | "UserNotFoundException"
        | "UserNotConfirmedException"
        | "PasswordResetRequiredException" => Error::Auth(message),
        "ResourceNotFoundException" => Error::Config(message),
        _ => Error::Http {
            status,
            body: format!("{kind}: {message}"),
        },
    }
}
