//! End-to-end dispatch tests against a local mock server, exercising the
//! real reqwest transport and the default token refresher together.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wechat_client::{wechat_config, Payload, RequestOptions, WechatClient};

async fn client_against(server: &MockServer) -> WechatClient {
    let config = wechat_config()
        .appid("wx-integration")
        .secret("app-secret")
        .api_base_url(format!("{}/cgi-bin/", server.uri()))
        .build()
        .unwrap();

    WechatClient::builder(config).build().unwrap()
}

#[tokio::test]
async fn issues_token_then_dispatches_authorized_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .and(query_param("grant_type", "client_credential"))
        .and(query_param("appid", "wx-integration"))
        .and(query_param("secret", "app-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "expires_in": 7200
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/user/info"))
        .and(query_param("access_token", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"openid": "u1"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_against(&server).await;

    let url = client.authorized_url("user/info").await.unwrap();
    let payload = client.request(url.as_str(), RequestOptions::new()).await.unwrap();
    assert_eq!(payload.into_json().unwrap()["openid"], "u1");

    // The stored token is still valid, so a second ensure does not re-issue.
    let token = client.ensure_access_token().await.unwrap();
    assert_eq!(token.access_token, "tok-1");
}

#[tokio::test]
async fn rejected_token_is_refreshed_and_request_retried() {
    let server = MockServer::start().await;

    // First issuance returns tok-1, the refresh after the rejection tok-2.
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "expires_in": 7200
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-2",
            "expires_in": 7200
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/user/info"))
        .and(query_param("access_token", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errcode": 40001,
            "errmsg": "invalid credential"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/user/info"))
        .and(query_param("access_token", "tok-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"openid": "u1"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_against(&server).await;

    let url = client.authorized_url("user/info").await.unwrap();
    let payload = client.request(url.as_str(), RequestOptions::new()).await.unwrap();
    assert_eq!(payload.into_json().unwrap()["openid"], "u1");

    // The refreshed credential replaced the rejected one.
    let token = client.ensure_access_token().await.unwrap();
    assert_eq!(token.access_token, "tok-2");
}

#[tokio::test]
async fn non_json_response_returns_raw_bytes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "expires_in": 7200
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/media/get"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"\xff\xd8jpeg-bytes".to_vec(), "image/jpeg"),
        )
        .mount(&server)
        .await;

    let client = client_against(&server).await;

    let url = client.authorized_url("media/get").await.unwrap();
    let payload = client.request(url.as_str(), RequestOptions::new()).await.unwrap();

    match payload {
        Payload::Bytes(bytes) => assert_eq!(bytes.as_ref(), b"\xff\xd8jpeg-bytes"),
        Payload::Json(value) => panic!("expected raw bytes, got {:?}", value),
    }
}

#[tokio::test]
async fn api_error_codes_surface_to_the_caller() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "expires_in": 7200
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/message/custom/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errcode": 45015,
            "errmsg": "response out of time limit"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_against(&server).await;

    let url = client.authorized_url("message/custom/send").await.unwrap();
    let err = client
        .request(
            url.as_str(),
            RequestOptions::new()
                .method(wechat_client::HttpMethod::Post)
                .json(&json!({"touser": "u1"}))
                .unwrap(),
        )
        .await
        .unwrap_err();

    match err {
        wechat_client::WechatError::Api { code, message } => {
            assert_eq!(code, 45015);
            assert_eq!(message, "response out of time limit");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
