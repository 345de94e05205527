
mod dpop_tests;
mod introspection_tests;
mod jwks_tests;
mod request_object_tests;
mod token_tests;
mod userinfo_tests;

use josekit::{jwk::Jwk, jws::JwsHeader};
use serde_json::Value;

use crate::jose::jws::sign_compact;

/// Signs `claims` into a compact JWS for test fixtures.
pub(crate) fn sign_test_jwt(key: &Jwk, alg: &str, typ: Option<&str>, claims: &Value) -> String {
    let mut header = JwsHeader::new();
    header.set_algorithm(alg);

    if let Some(typ) = typ {
        header.set_token_type(typ);
    }

    if let Some(kid) = key.key_id() {
        header.set_key_id(kid);
    }

    sign_compact(
        &serde_json::to_vec(claims).unwrap(),
        &header,
        key,
        alg,
    )
    .unwrap()
}

/// A fresh P-256 signing key with the given `kid`.
pub(crate) fn ec_key(kid: &str) -> Jwk {
    let mut key = Jwk::generate_ec_key(josekit::jwk::alg::ec::EcCurve::P256).unwrap();
    key.set_key_id(kid);
    key
}

/// The public JWK Set JSON for `keys`.
pub(crate) fn jwks_body(keys: &[&Jwk]) -> String {
    let public: Vec<Jwk> = keys.iter().map(|k| k.to_public_key().unwrap()).collect();
    serde_json::to_string(&crate::jwks::JsonWebKeySet::from(public)).unwrap()
}
