use serde_json::json;

use crate::helpers::now;
use crate::http::HttpMethod;
use crate::tests::test_http_client::{TestHttpClient, TestHttpReqRes};
use crate::tests::{ec_key, jwks_body, sign_test_jwt};
use crate::{introspect_token, AuthorizationServer, ClientMetadata, RequestOptions};

fn issuer(host: &str) -> AuthorizationServer {
    AuthorizationServer {
        issuer: format!("https://{}", host),
        introspection_endpoint: Some(format!("https://{}/introspect", host)),
        jwks_uri: Some(format!("https://{}/jwks", host)),
        ..Default::default()
    }
}

#[tokio::test]
async fn a_json_response_yields_the_claims() {
    let host = "op-intro-json.example.com";
    let issuer = issuer(host);
    let client = ClientMetadata {
        client_id: "c".to_string(),
        client_secret: Some("s".to_string()),
        ..Default::default()
    };

    let http_client = TestHttpReqRes::new(format!("https://{}/introspect", host))
        .assert_request_method(HttpMethod::POST)
        .assert_request_header("accept", vec!["application/json".to_string()])
        .assert_form_field("token", "tok")
        .assert_form_field("token_type_hint", "access_token")
        .set_response_content_type_header("application/json")
        .set_response_body(
            json!({"active": true, "scope": "openid", "sub": "u"}).to_string(),
        )
        .build();

    let introspection = introspect_token(
        &issuer,
        &client,
        "tok",
        Some("access_token"),
        &RequestOptions::default(),
        &http_client,
    )
    .await
    .unwrap();

    assert!(introspection.active);
    assert_eq!(Some("openid"), introspection.claims["scope"].as_str());
}

#[tokio::test]
async fn a_signed_response_is_validated_and_unwrapped() {
    let host = "op-intro-jwt.example.com";
    let issuer = issuer(host);
    let client = ClientMetadata {
        client_id: "c".to_string(),
        client_secret: Some("s".to_string()),
        introspection_signed_response_alg: Some("ES256".to_string()),
        ..Default::default()
    };

    let key = ec_key("intro-key");
    let timestamp = now();

    let jwt = sign_test_jwt(
        &key,
        "ES256",
        Some("token-introspection+jwt"),
        &json!({
            "iss": issuer.issuer,
            "aud": "c",
            "iat": timestamp,
            "token_introspection": {"active": false},
        }),
    );

    let http_client = TestHttpClient::new(vec![
        TestHttpReqRes::new(format!("https://{}/introspect", host))
            .assert_request_header(
                "accept",
                vec!["application/token-introspection+jwt".to_string()],
            )
            .set_response_content_type_header("application/token-introspection+jwt")
            .set_response_body(jwt),
        TestHttpReqRes::new(format!("https://{}/jwks", host))
            .set_response_body(jwks_body(&[&key])),
    ]);

    let introspection = introspect_token(
        &issuer,
        &client,
        "tok",
        None,
        &RequestOptions::default(),
        &http_client,
    )
    .await
    .unwrap();

    assert!(!introspection.active);
    http_client.assert_consumed();
}

#[tokio::test]
async fn a_signed_response_with_the_wrong_typ_is_rejected() {
    let host = "op-intro-typ.example.com";
    let issuer = issuer(host);
    let client = ClientMetadata {
        client_id: "c".to_string(),
        client_secret: Some("s".to_string()),
        introspection_signed_response_alg: Some("ES256".to_string()),
        ..Default::default()
    };

    let key = ec_key("intro-key");
    let timestamp = now();

    let jwt = sign_test_jwt(
        &key,
        "ES256",
        Some("jwt"),
        &json!({
            "iss": issuer.issuer,
            "aud": "c",
            "iat": timestamp,
            "token_introspection": {"active": false},
        }),
    );

    let http_client = TestHttpReqRes::new(format!("https://{}/introspect", host))
        .set_response_content_type_header("application/token-introspection+jwt")
        .set_response_body(jwt)
        .build();

    let err = introspect_token(
        &issuer,
        &client,
        "tok",
        None,
        &RequestOptions::default(),
        &http_client,
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("typ"));
}

#[tokio::test]
async fn a_missing_active_boolean_is_rejected() {
    let host = "op-intro-active.example.com";
    let issuer = issuer(host);
    let client = ClientMetadata {
        client_id: "c".to_string(),
        client_secret: Some("s".to_string()),
        ..Default::default()
    };

    let http_client = TestHttpReqRes::new(format!("https://{}/introspect", host))
        .set_response_content_type_header("application/json")
        .set_response_body(json!({"active": "yes"}).to_string())
        .build();

    let err = introspect_token(
        &issuer,
        &client,
        "tok",
        None,
        &RequestOptions::default(),
        &http_client,
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("active"));
}
