use serde_json::json;

use crate::http::HttpMethod;
use crate::tests::test_http_client::{TestHttpClient, TestHttpReqRes};
use crate::tests::{ec_key, jwks_body, sign_test_jwt};
use crate::{fetch_userinfo, AuthorizationServer, ClientMetadata, SubjectCheck};

fn issuer(host: &str) -> AuthorizationServer {
    AuthorizationServer {
        issuer: format!("https://{}", host),
        userinfo_endpoint: Some(format!("https://{}/userinfo", host)),
        jwks_uri: Some(format!("https://{}/jwks", host)),
        ..Default::default()
    }
}

#[tokio::test]
async fn a_json_response_yields_the_claims() {
    let host = "op-ui-json.example.com";
    let issuer = issuer(host);
    let client = ClientMetadata::new("c");

    let http_client = TestHttpReqRes::new(format!("https://{}/userinfo", host))
        .assert_request_method(HttpMethod::GET)
        .assert_request_header("accept", vec!["application/json".to_string()])
        .assert_request_header("authorization", vec!["Bearer at".to_string()])
        .set_response_content_type_header("application/json")
        .set_response_body(json!({"sub": "u", "name": "Jane"}).to_string())
        .build();

    let userinfo = fetch_userinfo(
        &issuer,
        &client,
        "at",
        &SubjectCheck::Value("u".to_string()),
        None,
        &http_client,
    )
    .await
    .unwrap();

    assert_eq!("u", userinfo.sub);
    assert_eq!(Some("Jane"), userinfo.claims["name"].as_str());
}

#[tokio::test]
async fn a_subject_mismatch_is_rejected() {
    let host = "op-ui-sub.example.com";
    let issuer = issuer(host);
    let client = ClientMetadata::new("c");

    let http_client = TestHttpReqRes::new(format!("https://{}/userinfo", host))
        .set_response_content_type_header("application/json")
        .set_response_body(json!({"sub": "someone-else"}).to_string())
        .build();

    let err = fetch_userinfo(
        &issuer,
        &client,
        "at",
        &SubjectCheck::Value("u".to_string()),
        None,
        &http_client,
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("sub"));
}

#[tokio::test]
async fn skip_subject_check_is_explicit() {
    let host = "op-ui-skip.example.com";
    let issuer = issuer(host);
    let client = ClientMetadata::new("c");

    let http_client = TestHttpReqRes::new(format!("https://{}/userinfo", host))
        .set_response_content_type_header("application/json")
        .set_response_body(json!({"sub": "whoever"}).to_string())
        .build();

    let userinfo = fetch_userinfo(
        &issuer,
        &client,
        "at",
        &SubjectCheck::Skip,
        None,
        &http_client,
    )
    .await
    .unwrap();

    assert_eq!("whoever", userinfo.sub);
}

#[tokio::test]
async fn a_signed_response_is_validated() {
    let host = "op-ui-jwt.example.com";
    let issuer = issuer(host);
    let client = ClientMetadata {
        client_id: "c".to_string(),
        userinfo_signed_response_alg: Some("ES256".to_string()),
        ..Default::default()
    };

    let key = ec_key("ui-key");

    let jwt = sign_test_jwt(
        &key,
        "ES256",
        None,
        &json!({
            "iss": issuer.issuer,
            "aud": "c",
            "sub": "u",
            "email": "jane@example.com",
        }),
    );

    let http_client = TestHttpClient::new(vec![
        TestHttpReqRes::new(format!("https://{}/userinfo", host))
            .assert_request_header("accept", vec!["application/jwt".to_string()])
            .set_response_content_type_header("application/jwt")
            .set_response_body(jwt),
        TestHttpReqRes::new(format!("https://{}/jwks", host))
            .set_response_body(jwks_body(&[&key])),
    ]);

    let userinfo = fetch_userinfo(
        &issuer,
        &client,
        "at",
        &SubjectCheck::Value("u".to_string()),
        None,
        &http_client,
    )
    .await
    .unwrap();

    assert_eq!("u", userinfo.sub);
    assert_eq!(Some("jane@example.com"), userinfo.claims["email"].as_str());
    http_client.assert_consumed();
}

#[tokio::test]
async fn a_signed_response_with_a_foreign_issuer_is_rejected() {
    let host = "op-ui-iss.example.com";
    let issuer = issuer(host);
    let client = ClientMetadata {
        client_id: "c".to_string(),
        userinfo_signed_response_alg: Some("ES256".to_string()),
        ..Default::default()
    };

    let key = ec_key("ui-key");

    let jwt = sign_test_jwt(
        &key,
        "ES256",
        None,
        &json!({
            "iss": "https://evil.example.com",
            "sub": "u",
        }),
    );

    let http_client = TestHttpClient::new(vec![
        TestHttpReqRes::new(format!("https://{}/userinfo", host))
            .set_response_content_type_header("application/jwt")
            .set_response_body(jwt),
        TestHttpReqRes::new(format!("https://{}/jwks", host))
            .set_response_body(jwks_body(&[&key])),
    ]);

    let err = fetch_userinfo(
        &issuer,
        &client,
        "at",
        &SubjectCheck::Skip,
        None,
        &http_client,
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("iss"));
}
