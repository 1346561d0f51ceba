//! GraphQL client against a mock endpoint: headers, the refresh-and-retry
//! policy and error mapping. The identity provider is a fake that counts
//! refreshes.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{fresh_tokens, TestEnv};
use kidsview_cli::api::GraphQLClient;
use kidsview_cli::auth::IdentityProvider;
use kidsview_cli::context::Context;
use kidsview_cli::error::{Error, Result};
use kidsview_cli::session::{now, Tokens};
use kidsview_cli::ui::Headless;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct FakeIdentity {
    refreshes: Arc<AtomicUsize>,
    renewed: Option<Tokens>,
}

impl IdentityProvider for FakeIdentity {
    fn login(&self, _username: &str, _password: &str) -> Result<Tokens> {
        Err(Error::Auth("login is not expected in this test".into()))
    }

    fn refresh(&self, refresh_token: &str) -> Result<Tokens> {
        assert_eq!(refresh_token, "R1");
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        self.renewed
            .clone()
            .ok_or_else(|| Error::Auth("Refresh Token has expired".into()))
    }
}

/// Tokens the fake hands out on refresh. No refresh token, like Cognito.
fn renewed() -> Tokens {
    Tokens::new("NEW", "NEW-ACCESS", None, now() + 3600)
}

fn client(env: &TestEnv, renewed: Option<Tokens>) -> (GraphQLClient, Arc<AtomicUsize>) {
    let refreshes = Arc::new(AtomicUsize::new(0));
    let identity = FakeIdentity {
        refreshes: refreshes.clone(),
        renewed,
    };
    let client =
        GraphQLClient::new(env.settings(), Box::new(identity), Box::new(Headless)).unwrap();
    (client, refreshes)
}

async fn server() -> (MockServer, TestEnv) {
    let server = MockServer::start().await;
    let env = TestEnv::new().with_api(format!("{}/graphql", server.uri()));
    (server, env)
}

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "data": data }))
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_token_is_refreshed_and_retried_once() {
    let (server, env) = server().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "JWT OLD"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "JWT NEW"))
        .and(body_partial_json(json!({ "variables": { "first": 1 } })))
        .respond_with(ok(json!({ "me": { "id": "u1" } })))
        .expect(1)
        .mount(&server)
        .await;

    env.write_session(&fresh_tokens("OLD"));
    tokio::task::spawn_blocking(move || {
        let (client, refreshes) = client(&env, Some(renewed()));
        let response = client
            .execute("query { me { id } }", json!({ "first": 1 }))
            .unwrap();
        assert_eq!(response.field("me")["id"], "u1");
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);

        let saved = env.read_session().unwrap();
        assert_eq!(saved.id_token, "NEW");
        // The provider did not rotate the refresh token.
        assert_eq!(saved.refresh_token.as_deref(), Some("R1"));
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn second_rejection_is_an_auth_error() {
    let (server, env) = server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .expect(2)
        .mount(&server)
        .await;

    env.write_session(&fresh_tokens("OLD"));
    tokio::task::spawn_blocking(move || {
        let (client, refreshes) = client(&env, Some(renewed()));
        let err = client.execute("query { me { id } }", json!({})).unwrap_err();
        assert!(matches!(err, Error::Auth(_)), "got {err:?}");
        assert_eq!(err.exit_code(), 3);
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_session_is_refreshed_before_the_request() {
    let (server, env) = server().await;
    Mock::given(method("POST"))
        .and(header("authorization", "JWT OLD"))
        .respond_with(ok(json!({})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("authorization", "JWT NEW"))
        .respond_with(ok(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    // Inside the expiry margin.
    let stale = Tokens::new("OLD", "OLD-ACCESS", Some("R1".into()), now() + 30);
    env.write_session(&stale);
    tokio::task::spawn_blocking(move || {
        let (client, refreshes) = client(&env, Some(renewed()));
        client.execute("query { ok }", json!({})).unwrap();
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_refresh_token_removes_the_session() {
    let (server, env) = server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    env.write_session(&fresh_tokens("OLD"));
    tokio::task::spawn_blocking(move || {
        let (client, refreshes) = client(&env, None);
        let err = client.execute("query { me { id } }", json!({})).unwrap_err();
        assert!(matches!(err, Error::Auth(_)), "got {err:?}");
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
        assert!(!env.session_file().exists());
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_session_without_terminal_needs_login() {
    let (server, env) = server().await;
    Mock::given(method("POST"))
        .respond_with(ok(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    tokio::task::spawn_blocking(move || {
        let (client, _) = client(&env, None);
        let err = client.execute("query { ok }", json!({})).unwrap_err();
        assert!(matches!(err, Error::NotLoggedIn));
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn context_travels_as_cookies() {
    let (server, env) = server().await;
    Mock::given(method("POST"))
        .and(header(
            "cookie",
            "active_child=c1; active_year=y1; preschool=p1; locale=pl",
        ))
        .and(header("origin", "https://app.kidsview.pl"))
        .and(header("referer", "https://app.kidsview.pl/"))
        .respond_with(ok(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    env.write_session(&fresh_tokens("ID1"));
    tokio::task::spawn_blocking(move || {
        let (mut client, _) = client(&env, None);
        client.set_context(Some(Context::new("c1", "p1", "y1")));
        client.execute("query { ok }", json!({})).unwrap();
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn cookie_override_replaces_the_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("cookie", "active_child=X; locale=en"))
        .respond_with(ok(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::new()
        .with_api(format!("{}/graphql", server.uri()))
        .with_var("KIDSVIEW_COOKIES", "active_child=X; locale=en");
    env.write_session(&fresh_tokens("ID1"));
    tokio::task::spawn_blocking(move || {
        let (mut client, _) = client(&env, None);
        client.set_context(Some(Context::new("c1", "p1", "y1")));
        client.execute("query { ok }", json!({})).unwrap();
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn access_token_preference_changes_the_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "JWT ID1-ACCESS"))
        .respond_with(ok(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::new()
        .with_api(format!("{}/graphql", server.uri()))
        .with_var("KIDSVIEW_AUTH_TOKEN_PREFERENCE", "access");
    env.write_session(&fresh_tokens("ID1"));
    tokio::task::spawn_blocking(move || {
        let (client, _) = client(&env, None);
        client.execute("query { ok }", json!({})).unwrap();
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn graphql_errors_are_passed_through() {
    let (server, env) = server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [ { "message": "Brak uprawnień" } ],
            "data": null
        })))
        .mount(&server)
        .await;

    env.write_session(&fresh_tokens("ID1"));
    tokio::task::spawn_blocking(move || {
        let (client, refreshes) = client(&env, None);
        match client.execute("query { secret }", json!({})).unwrap_err() {
            Error::GraphQL { messages, data, .. } => {
                assert_eq!(messages, vec!["Brak uprawnień".to_string()]);
                assert!(data.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(refreshes.load(Ordering::SeqCst), 0);
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn server_errors_keep_status_and_body() {
    let (server, env) = server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    env.write_session(&fresh_tokens("ID1"));
    tokio::task::spawn_blocking(move || {
        let (client, _) = client(&env, None);
        let err = client.execute("query { ok }", json!({})).unwrap_err();
        assert!(matches!(err, Error::Http { status: 502, ref body } if body == "bad gateway"));
        assert_eq!(err.exit_code(), 1);
    })
    .await
    .unwrap();
}
