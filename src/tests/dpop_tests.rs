use serde_json::json;
use url::Url;

use crate::dpop::peek_dpop_nonce;
use crate::http::HttpMethod;
use crate::tests::ec_key;
use crate::tests::test_http_client::{TestHttpClient, TestHttpReqRes};
use crate::{
    fetch_protected_resource, push_authorization_request, AuthorizationParameters,
    AuthorizationServer, ClientMetadata, DPoPOptions, RequestOptions,
};

fn issuer(host: &str) -> AuthorizationServer {
    AuthorizationServer {
        issuer: format!("https://{}", host),
        pushed_authorization_request_endpoint: Some(format!("https://{}/par", host)),
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

#[tokio::test]
async fn a_rejected_request_seeds_the_nonce_for_the_retry() {
    let host = "op-dpop-retry.example.com";
    let issuer = issuer(host);
    let client = client();
    let key = ec_key("dpop-key");
    let dpop = DPoPOptions::new(key);

    let parameters = AuthorizationParameters {
        redirect_uri: Some("https://rp.example.com/cb".to_string()),
        response_type: Some("code".to_string()),
        ..Default::default()
    };

    let http_client = TestHttpClient::new(vec![
        TestHttpReqRes::new(format!("https://{}/par", host))
            .assert_request_method(HttpMethod::POST)
            .assert_dpop_nonce_not_present()
            .set_response_status_code(400)
            .set_response_body(json!({"error": "use_dpop_nonce"}).to_string())
            .set_response_dpop_nonce_header("N1"),
        TestHttpReqRes::new(format!("https://{}/par", host))
            .assert_dpop_nonce_value("N1")
            .set_response_status_code(201)
            .set_response_body(
                json!({"request_uri": "urn:ietf:params:oauth:request_uri:x", "expires_in": 60})
                    .to_string(),
            ),
    ]);

    let options = RequestOptions {
        dpop: Some(&dpop),
        ..Default::default()
    };

    let err = push_authorization_request(&issuer, &client, &parameters, &options, &http_client)
        .await
        .unwrap_err();
    assert!(err.is_oauth2_error());
    assert_eq!("use_dpop_nonce", err.oauth2_error().unwrap().error);

    assert_eq!(
        Some("N1".to_string()),
        peek_dpop_nonce(&format!("https://{}", host))
    );

    // The caller retries by simply reissuing; the fresh proof carries N1.
    let par = push_authorization_request(&issuer, &client, &parameters, &options, &http_client)
        .await
        .unwrap();

    assert_eq!("urn:ietf:params:oauth:request_uri:x", par.request_uri);
    assert_eq!(60, par.expires_in);

    http_client.assert_consumed();
}

#[tokio::test]
async fn protected_resource_requests_bind_the_access_token() {
    let key = ec_key("dpop-key");
    let dpop = DPoPOptions::new(key);

    let http_client = TestHttpReqRes::new("https://rs-dpop.example.com/api/data?x=1")
        .assert_request_method(HttpMethod::GET)
        .assert_request_header("authorization", vec!["DPoP token-1".to_string()])
        .assert_dpop_ath()
        .set_response_status_code(200)
        .set_response_body("{}")
        .build();

    let response = fetch_protected_resource(
        "token-1",
        HttpMethod::GET,
        Url::parse("https://rs-dpop.example.com/api/data?x=1").unwrap(),
        None,
        None,
        Some(&dpop),
        &http_client,
    )
    .await
    .unwrap();

    assert_eq!(200, response.status_code);
}

#[tokio::test]
async fn without_dpop_the_bearer_scheme_is_used() {
    let http_client = TestHttpReqRes::new("https://rs-bearer.example.com/api")
        .assert_request_header("authorization", vec!["Bearer token-2".to_string()])
        .set_response_status_code(401)
        .set_response_www_authenticate_header(r#"Bearer error="invalid_token""#)
        .build();

    // Non-2xx resource responses are handed back, not raised.
    let response = fetch_protected_resource(
        "token-2",
        HttpMethod::GET,
        Url::parse("https://rs-bearer.example.com/api").unwrap(),
        None,
        None,
        None,
        &http_client,
    )
    .await
    .unwrap();

    assert_eq!(401, response.status_code);

    let challenges =
        crate::parse_www_authenticate_challenges(response.www_authenticate.as_deref().unwrap());
    assert_eq!("bearer", challenges[0].scheme);
    assert_eq!("invalid_token", challenges[0].parameters["error"]);
}

#[tokio::test]
async fn an_explicit_nonce_override_wins() {
    let key = ec_key("dpop-key");
    let dpop = DPoPOptions {
        private_key: key,
        nonce: Some("override".to_string()),
    };

    let http_client = TestHttpReqRes::new("https://rs-override.example.com/api")
        .assert_dpop_nonce_value("override")
        .set_response_status_code(200)
        .build();

    fetch_protected_resource(
        "token-3",
        HttpMethod::GET,
        Url::parse("https://rs-override.example.com/api").unwrap(),
        None,
        None,
        Some(&dpop),
        &http_client,
    )
    .await
    .unwrap();
}

#[test]
fn a_symmetric_key_is_refused() {
    let mut oct = crate::Jwk::new("oct");
    oct.set_key_value("secret");

    let dpop = DPoPOptions::new(oct);

    let err = crate::protected_resource_request(
        "t",
        HttpMethod::GET,
        Url::parse("https://rs.example.com/api").unwrap(),
        None,
        None,
        Some(&dpop),
    )
    .unwrap_err();

    assert!(matches!(*err, crate::OauthClientError::TypeError(..)));
}
