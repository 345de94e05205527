use serde_json::json;

use crate::helpers::now;
use crate::http::{transmit, HttpMethod};
use crate::tests::test_http_client::{TestHttpClient, TestHttpReqRes};
use crate::tests::{ec_key, jwks_body, sign_test_jwt};
use crate::{
    authorization_code_grant_request, get_validated_id_token_claims,
    process_authorization_code_oauth2_response, process_authorization_code_openid_response,
    process_client_credentials_response, client_credentials_grant_request,
    refresh_token_grant_request, process_refresh_token_response, AuthorizationServer,
    ClientMetadata, NonceCheck, RequestOptions,
};

fn issuer(host: &str) -> AuthorizationServer {
    AuthorizationServer {
        issuer: format!("https://{}", host),
        token_endpoint: Some(format!("https://{}/token", host)),
        jwks_uri: Some(format!("https://{}/jwks", host)),
        id_token_signing_alg_values_supported: Some(vec!["ES256".to_string()]),
        ..Default::default()
    }
}

fn client() -> ClientMetadata {
    ClientMetadata {
        client_id: "c".to_string(),
        client_secret: Some("s".to_string()),
        ..Default::default()
    }
}

mod openid {
    use super::*;

    #[tokio::test]
    async fn a_valid_code_exchange_yields_the_id_token_claims() {
        let host = "op-code-happy.example.com";
        let issuer = issuer(host);
        let client = client();

        let key = ec_key("K1");
        let timestamp = now();

        let id_token = sign_test_jwt(
            &key,
            "ES256",
            None,
            &json!({
                "iss": issuer.issuer,
                "aud": "c",
                "sub": "u",
                "iat": timestamp,
                "exp": timestamp + 300,
                "nonce": "N",
            }),
        );

        let http_client = TestHttpClient::new(vec![
            TestHttpReqRes::new(format!("https://{}/token", host))
                .assert_request_method(HttpMethod::POST)
                .assert_request_header("accept", vec!["application/json".to_string()])
                .assert_request_header(
                    "content-type",
                    vec!["application/x-www-form-urlencoded".to_string()],
                )
                .assert_request_header("authorization", vec!["Basic Yzpz".to_string()])
                .assert_form_field("grant_type", "authorization_code")
                .assert_form_field("code", "abc")
                .assert_form_field("redirect_uri", "https://rp.example.com/cb")
                .assert_form_field("code_verifier", "verifier")
                .set_response_body(
                    json!({
                        "access_token": "a",
                        "token_type": "Bearer",
                        "id_token": id_token,
                    })
                    .to_string(),
                ),
            TestHttpReqRes::new(format!("https://{}/jwks", host))
                .set_response_body(jwks_body(&[&key])),
        ]);

        let request = authorization_code_grant_request(
            &issuer,
            &client,
            "abc",
            "https://rp.example.com/cb",
            Some("verifier"),
            &RequestOptions::default(),
        )
        .unwrap();

        let response = transmit(request, &http_client).await.unwrap();

        let tokens = process_authorization_code_openid_response(
            &issuer,
            &client,
            &response,
            &NonceCheck::Value("N".to_string()),
            None,
            &http_client,
        )
        .await
        .unwrap();

        assert_eq!("a", tokens.access_token);
        assert_eq!("bearer", tokens.token_type);

        let claims = get_validated_id_token_claims(&tokens).unwrap();
        assert_eq!(Some("u"), claims["sub"].as_str());
        assert_eq!(Some("N"), claims["nonce"].as_str());

        http_client.assert_consumed();
    }

    #[tokio::test]
    async fn the_id_token_is_required() {
        let host = "op-code-missing-idt.example.com";
        let issuer = issuer(host);

        let http_client = TestHttpReqRes::new(format!("https://{}/token", host))
            .set_response_body(json!({"access_token": "a", "token_type": "Bearer"}).to_string())
            .build();

        let request = authorization_code_grant_request(
            &issuer,
            &client(),
            "abc",
            "https://rp.example.com/cb",
            None,
            &RequestOptions::default(),
        )
        .unwrap();

        let response = transmit(request, &http_client).await.unwrap();

        let err = process_authorization_code_openid_response(
            &issuer,
            &client(),
            &response,
            &NonceCheck::ExpectNone,
            None,
            &http_client,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("id_token"));
    }

    #[tokio::test]
    async fn a_multi_audience_id_token_without_azp_is_rejected() {
        let host = "op-code-azp.example.com";
        let issuer = issuer(host);
        let client = client();

        let key = ec_key("K1");
        let timestamp = now();

        let id_token = sign_test_jwt(
            &key,
            "ES256",
            None,
            &json!({
                "iss": issuer.issuer,
                "aud": ["c", "other"],
                "sub": "u",
                "iat": timestamp,
                "exp": timestamp + 300,
            }),
        );

        let http_client = TestHttpClient::new(vec![
            TestHttpReqRes::new(format!("https://{}/token", host)).set_response_body(
                json!({"access_token": "a", "token_type": "Bearer", "id_token": id_token})
                    .to_string(),
            ),
            TestHttpReqRes::new(format!("https://{}/jwks", host))
                .set_response_body(jwks_body(&[&key])),
        ]);

        let request = authorization_code_grant_request(
            &issuer,
            &client,
            "abc",
            "https://rp.example.com/cb",
            None,
            &RequestOptions::default(),
        )
        .unwrap();

        let response = transmit(request, &http_client).await.unwrap();

        let err = process_authorization_code_openid_response(
            &issuer,
            &client,
            &response,
            &NonceCheck::ExpectNone,
            None,
            &http_client,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("azp"));
    }

    #[tokio::test]
    async fn an_expired_id_token_is_rejected() {
        let host = "op-code-expired.example.com";
        let issuer = issuer(host);
        let client = client();

        let key = ec_key("K1");
        let timestamp = now();

        let id_token = sign_test_jwt(
            &key,
            "ES256",
            None,
            &json!({
                "iss": issuer.issuer,
                "aud": "c",
                "sub": "u",
                "iat": timestamp - 600,
                "exp": timestamp - 120,
            }),
        );

        let http_client = TestHttpClient::new(vec![
            TestHttpReqRes::new(format!("https://{}/token", host)).set_response_body(
                json!({"access_token": "a", "token_type": "Bearer", "id_token": id_token})
                    .to_string(),
            ),
            TestHttpReqRes::new(format!("https://{}/jwks", host))
                .set_response_body(jwks_body(&[&key])),
        ]);

        let request = authorization_code_grant_request(
            &issuer,
            &client,
            "abc",
            "https://rp.example.com/cb",
            None,
            &RequestOptions::default(),
        )
        .unwrap();

        let response = transmit(request, &http_client).await.unwrap();

        let err = process_authorization_code_openid_response(
            &issuer,
            &client,
            &response,
            &NonceCheck::ExpectNone,
            None,
            &http_client,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("expired"));
    }
}

mod oauth2 {
    use super::*;

    #[tokio::test]
    async fn a_response_with_an_id_token_is_rejected() {
        let host = "op-oauth2-idt.example.com";
        let issuer = issuer(host);
        let client = client();

        let http_client = TestHttpReqRes::new(format!("https://{}/token", host))
            .set_response_body(
                json!({"access_token": "a", "token_type": "Bearer", "id_token": "x.y.z"})
                    .to_string(),
            )
            .build();

        let request = authorization_code_grant_request(
            &issuer,
            &client,
            "abc",
            "https://rp.example.com/cb",
            None,
            &RequestOptions::default(),
        )
        .unwrap();

        let response = transmit(request, &http_client).await.unwrap();

        let err =
            process_authorization_code_oauth2_response(&issuer, &client, &response, &http_client)
                .await
                .unwrap_err();

        assert!(err.to_string().contains("ID Token"));
    }
}

mod response_schema {
    use super::*;

    #[tokio::test]
    async fn access_token_is_required() {
        let host = "op-schema-at.example.com";
        let issuer = issuer(host);
        let client = client();

        let http_client = TestHttpReqRes::new(format!("https://{}/token", host))
            .set_response_body(json!({"token_type": "Bearer"}).to_string())
            .build();

        let request = client_credentials_grant_request(
            &issuer,
            &client,
            None,
            &RequestOptions::default(),
        )
        .unwrap();

        let response = transmit(request, &http_client).await.unwrap();

        let err = process_client_credentials_response(&issuer, &client, &response, &http_client)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("access_token"));
    }

    #[tokio::test]
    async fn a_non_positive_expires_in_is_rejected() {
        let host = "op-schema-exp.example.com";
        let issuer = issuer(host);
        let client = client();

        let http_client = TestHttpReqRes::new(format!("https://{}/token", host))
            .set_response_body(
                json!({"access_token": "a", "token_type": "Bearer", "expires_in": 0}).to_string(),
            )
            .build();

        let request = client_credentials_grant_request(
            &issuer,
            &client,
            None,
            &RequestOptions::default(),
        )
        .unwrap();

        let response = transmit(request, &http_client).await.unwrap();

        let err = process_client_credentials_response(&issuer, &client, &response, &http_client)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("expires_in"));
    }

    #[tokio::test]
    async fn a_token_endpoint_error_body_is_surfaced_as_a_value() {
        let host = "op-schema-err.example.com";
        let issuer = issuer(host);
        let client = client();

        let http_client = TestHttpReqRes::new(format!("https://{}/token", host))
            .set_response_status_code(400)
            .set_response_body(json!({"error": "invalid_grant"}).to_string())
            .build();

        let request = refresh_token_grant_request(
            &issuer,
            &client,
            "rt",
            &RequestOptions::default(),
        )
        .unwrap();

        let err = transmit(request, &http_client).await.unwrap_err();

        assert!(err.is_oauth2_error());
        assert_eq!("invalid_grant", err.oauth2_error().unwrap().error);
    }
}

mod client_credentials {
    use super::*;

    #[tokio::test]
    async fn id_token_and_refresh_token_members_are_ignored() {
        let host = "op-cc.example.com";
        let issuer = issuer(host);
        let client = client();

        let http_client = TestHttpReqRes::new(format!("https://{}/token", host))
            .assert_form_field("grant_type", "client_credentials")
            .assert_form_field("scope", "api:read")
            .set_response_body(
                json!({
                    "access_token": "a",
                    "token_type": "Bearer",
                    "expires_in": 60,
                    "id_token": "x.y.z",
                    "refresh_token": "rt",
                })
                .to_string(),
            )
            .build();

        let request = client_credentials_grant_request(
            &issuer,
            &client,
            Some("api:read"),
            &RequestOptions::default(),
        )
        .unwrap();

        let response = transmit(request, &http_client).await.unwrap();

        let tokens =
            process_client_credentials_response(&issuer, &client, &response, &http_client)
                .await
                .unwrap();

        assert_eq!("a", tokens.access_token);
        assert_eq!(Some(60), tokens.expires_in);
        assert!(tokens.id_token.is_none());
        assert!(tokens.refresh_token.is_none());
        assert!(get_validated_id_token_claims(&tokens).is_none());
    }
}

mod refresh {
    use super::*;

    #[tokio::test]
    async fn a_refresh_without_an_id_token_passes() {
        let host = "op-refresh.example.com";
        let issuer = issuer(host);
        let client = client();

        let http_client = TestHttpReqRes::new(format!("https://{}/token", host))
            .assert_form_field("grant_type", "refresh_token")
            .assert_form_field("refresh_token", "rt-1")
            .set_response_body(
                json!({
                    "access_token": "a2",
                    "token_type": "Bearer",
                    "refresh_token": "rt-2",
                    "scope": "openid",
                })
                .to_string(),
            )
            .build();

        let request =
            refresh_token_grant_request(&issuer, &client, "rt-1", &RequestOptions::default())
                .unwrap();

        let response = transmit(request, &http_client).await.unwrap();

        let tokens = process_refresh_token_response(&issuer, &client, &response, &http_client)
            .await
            .unwrap();

        assert_eq!("a2", tokens.access_token);
        assert_eq!(Some("rt-2".to_string()), tokens.refresh_token);
        assert_eq!(Some("openid".to_string()), tokens.scope);
    }
}
