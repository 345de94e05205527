use josekit::{jwk::Jwk, jws, jws::JwsHeader};
use serde_json::{Map, Value};

use crate::types::{OauthClientError, OauthReturnType};

use super::jwk::CustomJwk;

/// Signs `payload` into a compact JWS under `header` with `key`.
pub(crate) fn sign_compact(
    payload: &[u8],
    header: &JwsHeader,
    key: &Jwk,
    alg: &str,
) -> OauthReturnType<String> {
    let signer = key.to_signer(alg)?;

    jws::serialize_compact(payload, header, &*signer)
        .map_err(|_| Box::new(OauthClientError::new_protocol_error("error while signing jwt", None)))
}

/// Decodes the protected header of a compact JWS without verifying it.
///
/// Five segment tokens are JWEs and are refused outright; anything other
/// than three segments is malformed.
pub(crate) fn decode_protected_header(jwt: &str) -> OauthReturnType<Map<String, Value>> {
    let segments: Vec<&str> = jwt.split('.').collect();

    if segments.len() == 5 {
        return Err(Box::new(OauthClientError::new_unsupported_operation(
            "JWE structured JWTs are not supported",
            None,
        )));
    }

    if segments.len() != 3 {
        return Err(Box::new(OauthClientError::new_protocol_error(
            "JWTs must have three components",
            None,
        )));
    }

    let header_bytes = base64_url::decode(segments[0])
        .map_err(|_| Box::new(OauthClientError::new_protocol_error("JWT is malformed", None)))?;

    serde_json::from_slice::<Map<String, Value>>(&header_bytes)
        .map_err(|_| Box::new(OauthClientError::new_protocol_error("JWT is malformed", None)))
}

/// Verifies the signature of a compact JWS with `key` under `alg` and
/// returns the parsed header plus the raw payload bytes.
pub(crate) fn verify_compact(
    jwt: &str,
    key: &Jwk,
    alg: &str,
) -> OauthReturnType<(JwsHeader, Vec<u8>)> {
    let verifier = key.to_verifier(alg)?;

    let (payload, header) = jws::deserialize_compact(jwt, &*verifier).map_err(|_| {
        Box::new(OauthClientError::new_protocol_error(
            "failed to validate JWT signature",
            None,
        ))
    })?;

    Ok((header, payload))
}
