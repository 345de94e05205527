use josekit::jws::alg::ecdsa::EcdsaJwsAlgorithm;
use serde_json::Value;

use crate::tests::test_http_client::TestHttpReqRes;
use crate::tests::ec_key;
use crate::{
    authorization_request_url, issue_request_object,
    issue_signed_and_encrypted_request_object, AuthorizationParameters, AuthorizationServer,
    ClientMetadata,
};

fn issuer(host: &str) -> AuthorizationServer {
    AuthorizationServer {
        issuer: format!("https://{}", host),
        authorization_endpoint: Some(format!("https://{}/auth", host)),
        jwks_uri: Some(format!("https://{}/jwks", host)),
        ..Default::default()
    }
}

fn parameters() -> AuthorizationParameters {
    AuthorizationParameters {
        redirect_uri: Some("https://rp.example.com/cb".to_string()),
        response_type: Some("code".to_string()),
        scope: Some("openid".to_string()),
        state: Some("xyz".to_string()),
        max_age: Some(300),
        ..Default::default()
    }
}

#[test]
fn a_signed_request_object_carries_the_parameters_and_bounds() {
    let issuer = issuer("op-jar.example.com");
    let client = ClientMetadata::new("c");
    let key = ec_key("jar-key");

    let jar = issue_request_object(&issuer, &client, &parameters(), &key).unwrap();

    let segments: Vec<&str> = jar.split('.').collect();
    assert_eq!(3, segments.len());

    let header: Value =
        serde_json::from_slice(&base64_url::decode(segments[0]).unwrap()).unwrap();
    assert_eq!(Some("ES256"), header["alg"].as_str());
    assert_eq!(Some("oauth-authz-req+jwt"), header["typ"].as_str());
    assert_eq!(Some("jar-key"), header["kid"].as_str());

    let claims: Value =
        serde_json::from_slice(&base64_url::decode(segments[1]).unwrap()).unwrap();
    assert_eq!(Some("c"), claims["iss"].as_str());
    assert_eq!(Some("c"), claims["client_id"].as_str());
    assert_eq!(Some("https://op-jar.example.com"), claims["aud"].as_str());
    assert_eq!(Some("openid"), claims["scope"].as_str());
    assert_eq!(Some("xyz"), claims["state"].as_str());
    assert_eq!(Some(300), claims["max_age"].as_u64());
    assert!(claims["jti"].is_string());
    assert_eq!(
        300,
        claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap()
    );

    let public = key.to_public_key().unwrap();
    let verifier = EcdsaJwsAlgorithm::Es256.verifier_from_jwk(&public).unwrap();
    assert!(josekit::jws::deserialize_compact(&jar, &verifier).is_ok());
}

#[tokio::test]
async fn an_encrypted_request_object_is_a_five_segment_jwe() {
    let host = "op-jar-enc.example.com";
    let issuer = issuer(host);

    let client = ClientMetadata {
        client_id: "c".to_string(),
        request_object_encryption_alg: Some("RSA-OAEP-256".to_string()),
        ..Default::default()
    };

    let signing_key = ec_key("jar-key");

    let mut recipient = josekit::jwk::Jwk::generate_rsa_key(2048).unwrap();
    recipient.set_key_id("enc-key");
    recipient.set_key_use("enc");

    let http_client = TestHttpReqRes::new(format!("https://{}/jwks", host))
        .set_response_body(crate::tests::jwks_body(&[&recipient]))
        .build();

    let jwe = issue_signed_and_encrypted_request_object(
        &issuer,
        &client,
        &parameters(),
        &signing_key,
        &http_client,
    )
    .await
    .unwrap();

    let segments: Vec<&str> = jwe.split('.').collect();
    assert_eq!(5, segments.len());

    let header: Value =
        serde_json::from_slice(&base64_url::decode(segments[0]).unwrap()).unwrap();
    assert_eq!(Some("RSA-OAEP-256"), header["alg"].as_str());
    assert_eq!(Some("A128CBC-HS256"), header["enc"].as_str());
    assert_eq!(Some("oauth-authz-req+jwt"), header["cty"].as_str());
}

#[test]
fn the_authorization_url_composes_the_parameters() {
    let issuer = issuer("op-authz.example.com");
    let client = ClientMetadata::new("c");

    let url = authorization_request_url(
        &issuer,
        &client,
        &AuthorizationParameters {
            redirect_uri: Some("https://rp.example.com/cb".to_string()),
            scope: Some("openid".to_string()),
            code_challenge: Some("challenge".to_string()),
            code_challenge_method: Some("S256".to_string()),
            ..Default::default()
        },
    )
    .unwrap();

    let pairs: std::collections::HashMap<String, String> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    assert_eq!("c", pairs["client_id"]);
    assert_eq!("code", pairs["response_type"]);
    assert_eq!("openid", pairs["scope"]);
    assert_eq!("challenge", pairs["code_challenge"]);
    assert_eq!("S256", pairs["code_challenge_method"]);
    assert_eq!("https://rp.example.com/cb", pairs["redirect_uri"]);
}
