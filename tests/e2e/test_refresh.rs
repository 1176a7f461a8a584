use crate::e2e::helpers;

use helpers::{issue_tokens, TestContext};
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_rotate_refresh_tokens(ctx: &TestContext) {
    let (_, refresh_1) = issue_tokens(ctx, "user-42").await.unwrap();

    let response = ctx.client.refresh(&refresh_1).await.unwrap();
    response.assert_status(StatusCode::OK);
    let (access_2, refresh_2) = response.token_pair();
    assert_eq!(ctx.jwt().verify(&access_2).unwrap().sub, "user-42");
    assert_ne!(refresh_2, refresh_1);

    // Already rotated
    ctx.client
        .refresh(&refresh_1)
        .await
        .unwrap()
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_message("Invalid refresh token");

    let response = ctx.client.refresh(&refresh_2).await.unwrap();
    response.assert_status(StatusCode::OK);
    let (access_3, _) = response.token_pair();
    assert_eq!(ctx.jwt().verify(&access_3).unwrap().sub, "user-42");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_keep_exactly_one_valid_credential(ctx: &TestContext) {
    let (_, mut refresh_token) = issue_tokens(ctx, "user-42").await.unwrap();

    for _ in 0..3 {
        let response = ctx.client.refresh(&refresh_token).await.unwrap();
        response.assert_status(StatusCode::OK);
        refresh_token = response.token_pair().1;
        assert_eq!(ctx.fixtures.valid_count("user-42").await.unwrap(), 1);
    }

    // Rotation adds records and never deletes them
    let records = ctx.fixtures.credentials_for("user-42").await.unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records.iter().filter(|r| r.valid).count(), 1);
    assert!(records.last().unwrap().valid);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_allow_only_one_concurrent_rotation(ctx: &TestContext) {
    let (_, refresh_token) = issue_tokens(ctx, "user-42").await.unwrap();

    let (first, second) = tokio::join!(
        ctx.client.refresh(&refresh_token),
        ctx.client.refresh(&refresh_token),
    );
    let mut statuses = vec![first.unwrap().status, second.unwrap().status];
    statuses.sort();

    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::UNAUTHORIZED]);
    assert_eq!(ctx.fixtures.valid_count("user-42").await.unwrap(), 1);
    assert_eq!(ctx.fixtures.credentials_for("user-42").await.unwrap().len(), 2);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_missing_authorization_header(ctx: &TestContext) {
    let response = ctx
        .client
        .post_raw("/refresh", "{}")
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("Invalid input: Authorization header is missing");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_malformed_authorization_header(ctx: &TestContext) {
    let (_, refresh_token) = issue_tokens(ctx, "user-42").await.unwrap();

    for value in [
        refresh_token.clone(),
        format!("Basic {}", refresh_token),
        format!("bearer {}", refresh_token),
        "Bearer ".to_string(),
    ] {
        ctx.client
            .post_with_authorization("/refresh", &value)
            .await
            .unwrap()
            .assert_status(StatusCode::BAD_REQUEST);
    }

    // The credential was never touched
    ctx.client
        .refresh(&refresh_token)
        .await
        .unwrap()
        .assert_status(StatusCode::OK);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_unknown_refresh_token(ctx: &TestContext) {
    for presented in [
        "not-a-refresh-token",
        "0123456789abcdef0123456789abcdef.AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
    ] {
        ctx.client
            .refresh(presented)
            .await
            .unwrap()
            .assert_status(StatusCode::UNAUTHORIZED)
            .assert_error_message("Invalid refresh token");
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_forged_secret_for_known_credential(ctx: &TestContext) {
    let (_, refresh_token) = issue_tokens(ctx, "user-42").await.unwrap();
    let id = refresh_token.split_once('.').unwrap().0;
    let forged = format!("{}.{}", id, "A".repeat(43));

    ctx.client
        .refresh(&forged)
        .await
        .unwrap()
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_message("Invalid refresh token");

    assert_eq!(ctx.fixtures.valid_count("user-42").await.unwrap(), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_expired_refresh_token_without_saying_why(ctx: &TestContext) {
    let (_, refresh_token) = issue_tokens(ctx, "user-42").await.unwrap();
    ctx.fixtures.expire_credentials("user-42").await.unwrap();

    ctx.client
        .refresh(&refresh_token)
        .await
        .unwrap()
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_message("Invalid refresh token");
}
