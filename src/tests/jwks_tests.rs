use josekit::jwk::Jwk;

use crate::jwks::{select_remote_key, JsonWebKeySet};
use crate::tests::test_http_client::{TestHttpClient, TestHttpReqRes};
use crate::tests::{ec_key, jwks_body};
use crate::AuthorizationServer;

fn metadata_only_rsa(kid: Option<&str>, alg: Option<&str>, key_use: Option<&str>) -> Jwk {
    let mut key = Jwk::new("RSA");
    if let Some(kid) = kid {
        key.set_key_id(kid);
    }
    if let Some(alg) = alg {
        key.set_algorithm(alg);
    }
    if let Some(key_use) = key_use {
        key.set_key_use(key_use);
    }
    key
}

mod selection {
    use super::*;

    #[test]
    fn a_single_applicable_key_is_selected() {
        let jwks = JsonWebKeySet::from(vec![
            metadata_only_rsa(Some("a"), None, None),
            ec_key("b").to_public_key().unwrap(),
        ]);

        let key = jwks.select("ES256", None).unwrap();
        assert_eq!(Some("b"), key.key_id());
    }

    #[test]
    fn zero_candidates_is_an_error() {
        let jwks = JsonWebKeySet::from(vec![metadata_only_rsa(Some("a"), None, None)]);

        let err = jwks.select("ES256", None).unwrap_err();
        assert!(err.to_string().contains("no applicable keys"));
    }

    #[test]
    fn multiple_candidates_require_a_kid() {
        let jwks = JsonWebKeySet::from(vec![
            metadata_only_rsa(Some("a"), None, None),
            metadata_only_rsa(Some("b"), None, None),
        ]);

        let err = jwks.select("RS256", None).unwrap_err();
        assert!(err.to_string().contains("kid"));

        let key = jwks.select("RS256", Some("b")).unwrap();
        assert_eq!(Some("b"), key.key_id());
    }

    #[test]
    fn a_declared_alg_must_match() {
        let jwks = JsonWebKeySet::from(vec![
            metadata_only_rsa(Some("a"), Some("PS256"), None),
            metadata_only_rsa(Some("b"), Some("RS256"), None),
        ]);

        let key = jwks.select("RS256", None).unwrap();
        assert_eq!(Some("b"), key.key_id());
    }

    #[test]
    fn a_declared_use_must_be_sig() {
        let jwks = JsonWebKeySet::from(vec![
            metadata_only_rsa(Some("enc-key"), None, Some("enc")),
            metadata_only_rsa(Some("sig-key"), None, Some("sig")),
        ]);

        let key = jwks.select("RS256", None).unwrap();
        assert_eq!(Some("sig-key"), key.key_id());
    }

    #[test]
    fn declared_key_ops_must_include_verify() {
        let mut signing = metadata_only_rsa(Some("a"), None, None);
        signing.set_key_operations(vec!["verify"]);

        let mut wrapping = metadata_only_rsa(Some("b"), None, None);
        wrapping.set_key_operations(vec!["wrapKey"]);

        let jwks = JsonWebKeySet::from(vec![signing, wrapping]);

        let key = jwks.select("RS256", None).unwrap();
        assert_eq!(Some("a"), key.key_id());
    }

    #[test]
    fn ec_curve_must_match_the_algorithm() {
        let p384 = Jwk::generate_ec_key(josekit::jwk::alg::ec::EcCurve::P384)
            .unwrap()
            .to_public_key()
            .unwrap();

        let jwks = JsonWebKeySet::from(vec![p384]);

        assert!(jwks.select("ES256", None).is_err());
        assert!(jwks.select("ES384", None).is_ok());
    }

    #[test]
    fn the_selected_key_is_annotated_with_the_alg() {
        let jwks = JsonWebKeySet::from(vec![ec_key("a").to_public_key().unwrap()]);

        let key = jwks.select("ES256", None).unwrap();
        assert_eq!(Some("ES256"), key.algorithm());
    }
}

mod cache {
    use super::*;

    #[tokio::test]
    async fn a_stale_entry_with_no_applicable_key_is_refetched() {
        let jwks_uri = "https://op-jwks-stale.example.com/jwks";

        let issuer = AuthorizationServer {
            issuer: "https://op-jwks-stale.example.com".to_string(),
            jwks_uri: Some(jwks_uri.to_string()),
            ..Default::default()
        };

        let k1 = ec_key("K1");
        let k2 = ec_key("K2");

        let http_client = TestHttpClient::new(vec![
            TestHttpReqRes::new(jwks_uri)
                .assert_request_header(
                    "accept",
                    vec!["application/json, application/jwk-set+json".to_string()],
                )
                .set_response_body(jwks_body(&[&k1])),
            TestHttpReqRes::new(jwks_uri).set_response_body(jwks_body(&[&k2])),
        ]);

        let selected = select_remote_key(&issuer, "ES256", Some("K1"), &http_client)
            .await
            .unwrap();
        assert_eq!(Some("K1"), selected.key_id());

        // Within the staleness window an unknown kid stays an error.
        assert!(select_remote_key(&issuer, "ES256", Some("K2"), &http_client)
            .await
            .is_err());

        crate::jwks::backdate_jwks_cache_entry(jwks_uri, 5 * 60 * 60 + 1);

        let rotated = select_remote_key(&issuer, "ES256", Some("K2"), &http_client)
            .await
            .unwrap();
        assert_eq!(Some("K2"), rotated.key_id());

        http_client.assert_consumed();
    }

    #[tokio::test]
    async fn a_fresh_cache_entry_is_reused() {
        let jwks_uri = "https://op-jwks-fresh.example.com/jwks";

        let issuer = AuthorizationServer {
            issuer: "https://op-jwks-fresh.example.com".to_string(),
            jwks_uri: Some(jwks_uri.to_string()),
            ..Default::default()
        };

        let k1 = ec_key("K1");

        let http_client = TestHttpReqRes::new(jwks_uri)
            .set_response_body(jwks_body(&[&k1]))
            .build();

        for _ in 0..3 {
            let selected = select_remote_key(&issuer, "ES256", Some("K1"), &http_client)
                .await
                .unwrap();
            assert_eq!(Some("K1"), selected.key_id());
        }

        http_client.assert_consumed();
    }
}
