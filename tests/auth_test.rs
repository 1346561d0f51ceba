//! Cognito client against a mock user-pool endpoint.

mod common;

use common::TestEnv;
use kidsview_cli::auth::{AuthClient, IdentityProvider};
use kidsview_cli::error::Error;
use kidsview_cli::session::now;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TARGET: &str = "x-amz-target";

async fn cognito() -> (MockServer, TestEnv) {
    let server = MockServer::start().await;
    let env = TestEnv::new().with_cognito(format!("{}/", server.uri()));
    (server, env)
}

fn amz(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/x-amz-json-1.1")
        .set_body_json(body)
}

#[tokio::test(flavor = "multi_thread")]
async fn srp_login_answers_the_password_verifier() {
    let (server, env) = cognito().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header(TARGET, "AWSCognitoIdentityProviderService.InitiateAuth"))
        .and(header("content-type", "application/x-amz-json-1.1"))
        .and(body_partial_json(json!({
            "AuthFlow": "USER_SRP_AUTH",
            "AuthParameters": { "USERNAME": "parent@example.com" }
        })))
        .respond_with(amz(json!({
            "ChallengeName": "PASSWORD_VERIFIER",
            "ChallengeParameters": {
                "USER_ID_FOR_SRP": "user-123",
                "SALT": "5a17",
                "SRP_B": "0badc0ffee",
                "SECRET_BLOCK": "c2VjcmV0LWJsb2Nr",
                "USERNAME": "user-123"
            },
            "Session": "sess"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header(
            TARGET,
            "AWSCognitoIdentityProviderService.RespondToAuthChallenge",
        ))
        .and(body_partial_json(json!({
            "ChallengeName": "PASSWORD_VERIFIER",
            "Session": "sess",
            "ChallengeResponses": {
                "USERNAME": "user-123",
                "PASSWORD_CLAIM_SECRET_BLOCK": "c2VjcmV0LWJsb2Nr"
            }
        })))
        .respond_with(amz(json!({
            "AuthenticationResult": {
                "IdToken": "ID",
                "AccessToken": "AT",
                "RefreshToken": "RT",
                "ExpiresIn": 3600,
                "TokenType": "Bearer"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    tokio::task::spawn_blocking(move || {
        let client = AuthClient::new(&env.settings()).unwrap();
        let before = now();
        let tokens = client.login("parent@example.com", "hunter2").unwrap();
        assert_eq!(tokens.id_token, "ID");
        assert_eq!(tokens.access_token, "AT");
        assert_eq!(tokens.refresh_token.as_deref(), Some("RT"));
        assert_eq!(tokens.token_type, "JWT");
        assert!(tokens.expires_at >= before + 3600);
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn other_challenges_are_reported() {
    let (server, env) = cognito().await;
    Mock::given(method("POST"))
        .respond_with(amz(json!({
            "ChallengeName": "SMS_MFA",
            "ChallengeParameters": {},
            "Session": "sess"
        })))
        .expect(1)
        .mount(&server)
        .await;

    tokio::task::spawn_blocking(move || {
        let client = AuthClient::new(&env.settings()).unwrap();
        match client.login("parent@example.com", "hunter2").unwrap_err() {
            Error::Challenge(name) => assert_eq!(name, "SMS_MFA"),
            other => panic!("unexpected {other:?}"),
        }
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn wrong_password_is_an_auth_error() {
    let (server, env) = cognito().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "NotAuthorizedException",
            "message": "Incorrect username or password."
        })))
        .mount(&server)
        .await;

    tokio::task::spawn_blocking(move || {
        let client = AuthClient::new(&env.settings()).unwrap();
        let err = client.login("parent@example.com", "wrong").unwrap_err();
        assert!(
            matches!(&err, Error::Auth(message) if message.contains("Incorrect")),
            "got {err:?}"
        );
        assert_eq!(err.exit_code(), 3);
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn refresh_keeps_the_refresh_token_when_not_rotated() {
    let (server, env) = cognito().await;
    Mock::given(method("POST"))
        .and(header(TARGET, "AWSCognitoIdentityProviderService.InitiateAuth"))
        .and(body_partial_json(json!({
            "AuthFlow": "REFRESH_TOKEN_AUTH",
            "AuthParameters": { "REFRESH_TOKEN": "R1" }
        })))
        .respond_with(amz(json!({
            "AuthenticationResult": { "IdToken": "ID2", "AccessToken": "AT2", "ExpiresIn": 3600 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    tokio::task::spawn_blocking(move || {
        let client = AuthClient::new(&env.settings()).unwrap();
        let tokens = client.refresh("R1").unwrap();
        assert_eq!(tokens.id_token, "ID2");
        assert_eq!(tokens.refresh_token.as_deref(), Some("R1"));
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn expired_refresh_token_is_an_auth_error() {
    let (server, env) = cognito().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "com.amazonaws.cognito#NotAuthorizedException",
            "message": "Refresh Token has expired"
        })))
        .mount(&server)
        .await;

    tokio::task::spawn_blocking(move || {
        let client = AuthClient::new(&env.settings()).unwrap();
        let err = client.refresh("R1").unwrap_err();
        assert!(matches!(err, Error::Auth(_)), "got {err:?}");
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_user_pool_is_a_config_error() {
    let (server, env) = cognito().await;
    Mock::given(method("POST"))
        .respond_with(amz(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let env = env.with_var("KIDSVIEW_USER_POOL_ID", "");
    tokio::task::spawn_blocking(move || {
        let client = AuthClient::new(&env.settings()).unwrap();
        let err = client.login("parent@example.com", "hunter2").unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got {err:?}");
    })
    .await
    .unwrap();
}
