//! Gallery downloads against a mock image host.

mod common;

use std::fs;

use common::{fresh_tokens, TestEnv};
use kidsview_cli::download::{Downloader, Gallery};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn image(server: &MockServer, name: &str, bytes: &'static [u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/img/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn images_are_numbered_and_existing_galleries_skipped() {
    let server = MockServer::start().await;
    image(&server, "a.png", b"PNG-A").await;
    image(&server, "b", b"JPG-B").await;

    let uri = server.uri();
    let dir = tempfile::tempdir().unwrap();
    tokio::task::spawn_blocking(move || {
        let fresh = Gallery {
            id: "7".into(),
            name: "Bal / przebierańców".into(),
            image_urls: vec![format!("{uri}/img/a.png"), format!("{uri}/img/b")],
        };
        let done = Gallery {
            id: "8".into(),
            name: "Wycieczka".into(),
            image_urls: vec![format!("{uri}/img/never.jpg")],
        };
        fs::create_dir_all(done.target_dir(dir.path())).unwrap();

        let downloader = Downloader::new(std::time::Duration::from_secs(5)).unwrap();
        let written = downloader
            .download_all(&[fresh.clone(), done], dir.path(), true)
            .unwrap();

        let target = dir.path().join("Bal _ przebierańców - 7");
        assert_eq!(written, vec![target.clone()]);
        assert_eq!(fs::read(target.join("001.png")).unwrap(), b"PNG-A");
        assert_eq!(fs::read(target.join("002.jpg")).unwrap(), b"JPG-B");

        // Files already on disk are not fetched again (each mock expects one hit).
        downloader.download(&fresh, dir.path()).unwrap();
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_image_is_an_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let uri = server.uri();
    let dir = tempfile::tempdir().unwrap();
    tokio::task::spawn_blocking(move || {
        let gallery = Gallery {
            id: "1".into(),
            name: "Missing".into(),
            image_urls: vec![format!("{uri}/img/gone.jpg")],
        };
        let downloader = Downloader::new(std::time::Duration::from_secs(5)).unwrap();
        let err = downloader.download(&gallery, dir.path()).unwrap_err();
        assert!(
            matches!(err, kidsview_cli::error::Error::Http { status: 404, .. }),
            "got {err:?}"
        );
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn gallery_download_command_fetches_listed_galleries() {
    let server = MockServer::start().await;
    let uri = server.uri();
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({ "variables": { "first": 100, "imagesFirst": 1000 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "galleries": {
            "edges": [ { "node": {
                "id": "42",
                "name": "Dzień Mamy",
                "paginatedImages": { "edges": [
                    { "node": { "id": "i1", "imageUrl": format!("{uri}/img/thumb.jpg"), "imageUrlFull": format!("{uri}/img/full.jpg") } }
                ] }
            } } ],
            "pageInfo": { "hasNextPage": false, "endCursor": null }
        } } })))
        .expect(1)
        .mount(&server)
        .await;
    image(&server, "full.jpg", b"FULL").await;

    let env = TestEnv::new()
        .with_api(format!("{uri}/graphql"))
        .with_var("KIDSVIEW_COOKIES", "active_child=c1; locale=pl");
    env.write_session(&fresh_tokens("ID1"));
    tokio::task::spawn_blocking(move || {
        let out = env.path().join("photos");
        let output = env
            .cli()
            .args(["gallery-download", "--id", "42", "--json", "--output-dir"])
            .arg(&out)
            .output()
            .unwrap();
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["downloaded"].as_array().unwrap().len(), 1);
        assert_eq!(
            fs::read(out.join("Dzień Mamy - 42").join("001.jpg")).unwrap(),
            b"FULL"
        );
    })
    .await
    .unwrap();
}
