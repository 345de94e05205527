//! Client authentication at authenticated endpoints: `client_secret_basic`
//! (the default), `client_secret_post`, `client_secret_jwt`,
//! `private_key_jwt` and `none`.

use josekit::{jwk::Jwk, jws::JwsHeader, jwt::JwtPayload};
use serde_json::json;

use crate::helpers::{basic_auth_value, generate_random, now};
use crate::jose::alg::{jws_alg_for_key, SUPPORTED_HMAC_ALGS};
use crate::jose::jwk::CustomJwk;
use crate::jose::jws::sign_compact;
use crate::types::{AuthorizationServer, ClientMetadata, OauthClientError, OauthReturnType};

const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 60;

/// Header and body additions a client authentication method contributes
/// to a request.
pub(crate) struct ClientAuthentication {
    pub form: Vec<(String, String)>,
    pub authorization: Option<String>,
}

/// Resolves the client's authentication method and produces its request
/// additions. Inconsistent metadata combinations are argument errors:
/// the `client_secret_*` methods must not be paired with a client private
/// key, and `private_key_jwt`/`none` must not carry a `client_secret`.
pub(crate) fn client_authentication(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    client_private_key: Option<&Jwk>,
) -> OauthReturnType<ClientAuthentication> {
    let method = client.auth_method();

    match method {
        "client_secret_basic" | "client_secret_post" | "client_secret_jwt" => {
            if client_private_key.is_some() {
                return Err(Box::new(OauthClientError::new_type_error(
                    &format!("{} does not use a client private key", method),
                    None,
                )));
            }
        }
        "private_key_jwt" | "none" => {
            if client.client_secret.is_some() {
                return Err(Box::new(OauthClientError::new_type_error(
                    &format!("{} must not be combined with a client_secret", method),
                    None,
                )));
            }
        }
        _ => {
            return Err(Box::new(OauthClientError::new_type_error(
                &format!("unsupported token_endpoint_auth_method {}", method),
                None,
            )))
        }
    }

    match method {
        "client_secret_basic" => {
            let secret = require_secret(client, method)?;
            Ok(ClientAuthentication {
                form: vec![],
                authorization: Some(basic_auth_value(&client.client_id, secret)),
            })
        }
        "client_secret_post" => {
            let secret = require_secret(client, method)?;
            Ok(ClientAuthentication {
                form: vec![
                    ("client_id".to_string(), client.client_id.clone()),
                    ("client_secret".to_string(), secret.to_string()),
                ],
                authorization: None,
            })
        }
        "client_secret_jwt" => {
            let secret = require_secret(client, method)?;
            let assertion = client_secret_assertion(issuer, client, secret)?;
            Ok(assertion_authentication(client, assertion))
        }
        "private_key_jwt" => {
            let key = client_private_key.ok_or_else(|| {
                Box::new(OauthClientError::new_type_error(
                    "private_key_jwt client authentication requires a client private key",
                    None,
                ))
            })?;
            let assertion = private_key_assertion(issuer, client, key)?;
            Ok(assertion_authentication(client, assertion))
        }
        _ => Ok(ClientAuthentication {
            form: vec![("client_id".to_string(), client.client_id.clone())],
            authorization: None,
        }),
    }
}

fn require_secret<'a>(client: &'a ClientMetadata, method: &str) -> OauthReturnType<&'a str> {
    client.client_secret.as_deref().ok_or_else(|| {
        Box::new(OauthClientError::new_type_error(
            &format!("{} client authentication requires a client_secret", method),
            None,
        ))
    })
}

fn assertion_authentication(client: &ClientMetadata, assertion: String) -> ClientAuthentication {
    ClientAuthentication {
        form: vec![
            ("client_id".to_string(), client.client_id.clone()),
            (
                "client_assertion_type".to_string(),
                CLIENT_ASSERTION_TYPE.to_string(),
            ),
            ("client_assertion".to_string(), assertion),
        ],
        authorization: None,
    }
}

fn assertion_payload(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
) -> OauthReturnType<JwtPayload> {
    let iat = now();

    let mut audience = vec![issuer.issuer.clone()];
    if let Some(token_endpoint) = &issuer.token_endpoint {
        audience.push(token_endpoint.clone());
    }

    let mut payload = JwtPayload::new();
    let claim_error =
        |_| OauthClientError::new_protocol_error("invalid client assertion claim", None);

    payload.set_claim("jti", Some(json!(generate_random(None)))).map_err(claim_error)?;
    payload.set_claim("aud", Some(json!(audience))).map_err(claim_error)?;
    payload.set_claim("exp", Some(json!(iat + ASSERTION_LIFETIME_SECS))).map_err(claim_error)?;
    payload.set_claim("iat", Some(json!(iat))).map_err(claim_error)?;
    payload.set_claim("nbf", Some(json!(iat))).map_err(claim_error)?;
    payload.set_claim("iss", Some(json!(client.client_id))).map_err(claim_error)?;
    payload.set_claim("sub", Some(json!(client.client_id))).map_err(claim_error)?;

    Ok(payload)
}

/// An HS* assertion keyed on the client secret. The algorithm is the
/// client's configured `token_endpoint_auth_signing_alg`, or the first
/// HMAC algorithm the server advertises.
fn client_secret_assertion(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    secret: &str,
) -> OauthReturnType<String> {
    let alg = match &client.token_endpoint_auth_signing_alg {
        Some(alg) => alg.clone(),
        None => issuer
            .token_endpoint_auth_signing_alg_values_supported
            .as_ref()
            .and_then(|values| {
                values
                    .iter()
                    .find(|alg| SUPPORTED_HMAC_ALGS.contains(&alg.as_str()))
            })
            .cloned()
            .ok_or_else(|| {
                Box::new(OauthClientError::new_protocol_error(
                    "failed to determine a JWS algorithm to use for the client assertion",
                    None,
                ))
            })?,
    };

    if !SUPPORTED_HMAC_ALGS.contains(&alg.as_str()) {
        return Err(Box::new(OauthClientError::new_unsupported_operation(
            &format!("unsupported client_secret_jwt algorithm {}", alg),
            None,
        )));
    }

    let mut jwk = Jwk::new("oct");
    jwk.set_algorithm(&alg);
    jwk.set_key_value(secret);

    let payload = assertion_payload(issuer, client)?;

    let mut header = JwsHeader::new();
    header.set_algorithm(&alg);

    let payload_bytes = serde_json::to_vec(payload.claims_set()).map_err(|_| {
        OauthClientError::new_protocol_error("could not serialize client assertion", None)
    })?;

    sign_compact(&payload_bytes, &header, &jwk, &alg)
}

/// An asymmetric assertion signed with the caller supplied key; the
/// algorithm is derived from the key itself.
fn private_key_assertion(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    key: &Jwk,
) -> OauthReturnType<String> {
    if !key.is_private_key() || key.key_type() == "oct" {
        return Err(Box::new(OauthClientError::new_type_error(
            "the client private key must be a private asymmetric key",
            None,
        )));
    }

    let alg = jws_alg_for_key(key)?;

    let payload = assertion_payload(issuer, client)?;

    let mut header = JwsHeader::new();
    header.set_algorithm(&alg);
    if let Some(kid) = key.key_id() {
        header.set_key_id(kid);
    }

    let payload_bytes = serde_json::to_vec(payload.claims_set()).map_err(|_| {
        OauthClientError::new_protocol_error("could not serialize client assertion", None)
    })?;

    sign_compact(&payload_bytes, &header, key, &alg)
}
