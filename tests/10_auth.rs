mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use common::{TestServer, MAGIC_KEY, UNKNOWN_KEY};

#[tokio::test]
async fn health_reports_database_and_key_version() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
    assert_eq!(body["key_version"].as_str().map(str::len), Some(16));
    Ok(())
}

#[tokio::test]
async fn login_with_known_key_issues_token() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .client
        .get(server.url(&format!("/api/login/{}", MAGIC_KEY)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    let token = body["token"].as_str().unwrap_or_default();
    assert_eq!(token.split('.').count(), 3, "expected a JWT, got {:?}", token);
    Ok(())
}

#[tokio::test]
async fn login_rejects_unknown_and_malformed_keys() -> Result<()> {
    let server = TestServer::spawn().await?;

    for candidate in [UNKNOWN_KEY, "not-a-uuid"] {
        let res = server
            .client
            .get(server.url(&format!("/api/login/{}", candidate)))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "candidate {}", candidate);

        let body: Value = res.json().await?;
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], "UNAUTHORIZED");
        assert!(body.get("token").is_none());
    }
    Ok(())
}

#[tokio::test]
async fn me_requires_a_valid_token() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.client.get(server.url("/api/me")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .get(server.url("/api/me"))
        .bearer_auth("not.a.token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let token = server.login().await?;
    let res = server
        .client
        .get(server.url("/api/me"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["user"], MAGIC_KEY);
    assert!(body["exp"].as_i64().unwrap_or_default() > chrono::Utc::now().timestamp());
    Ok(())
}
