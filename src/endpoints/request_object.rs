//! Request object (JAR, RFC 9101) issuance: signed, and optionally
//! encrypted to the server's public key.

use josekit::{jwk::Jwk, jws::JwsHeader};
use serde_json::{json, Map, Value};

use crate::helpers::{generate_random, now};
use crate::http::OauthHttpClient;
use crate::jose::alg::jws_alg_for_key;
use crate::jose::jwe::encrypt_compact;
use crate::jose::jws::sign_compact;
use crate::jwks::remote_encryption_key;
use crate::types::{
    AuthorizationParameters, AuthorizationServer, ClientMetadata, OauthClientError,
    OauthReturnType,
};

const REQUEST_OBJECT_TYP: &str = "oauth-authz-req+jwt";
const REQUEST_OBJECT_LIFETIME_SECS: i64 = 300;
const DEFAULT_REQUEST_OBJECT_ENC: &str = "A128CBC-HS256";

/// Issues a signed request object over `parameters`.
///
/// The claims carry the authorization parameters plus `iss` and
/// `client_id` (the client), `aud` (the issuer), a random `jti`, and an
/// `iat`/`exp` pair five minutes apart. The signing algorithm is the
/// client's configured `request_object_signing_alg`, or derived from the
/// key.
pub fn issue_request_object(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    parameters: &AuthorizationParameters,
    signing_key: &Jwk,
) -> OauthReturnType<String> {
    let alg = match &client.request_object_signing_alg {
        Some(alg) => alg.clone(),
        None => jws_alg_for_key(signing_key)?,
    };

    let iat = now();

    let mut claims = Map::new();

    for (name, value) in parameters.to_pairs(&client.client_id) {
        claims.insert(name, Value::String(value));
    }

    if let Some(max_age) = parameters.max_age {
        claims.insert("max_age".to_string(), json!(max_age));
    }

    claims.insert("iss".to_string(), json!(client.client_id));
    claims.insert("aud".to_string(), json!(issuer.issuer));
    claims.insert("jti".to_string(), json!(generate_random(None)));
    claims.insert("iat".to_string(), json!(iat));
    claims.insert(
        "exp".to_string(),
        json!(iat + REQUEST_OBJECT_LIFETIME_SECS),
    );

    let mut header = JwsHeader::new();
    header.set_algorithm(&alg);
    header.set_token_type(REQUEST_OBJECT_TYP);
    if let Some(kid) = signing_key.key_id() {
        header.set_key_id(kid);
    }

    let payload = serde_json::to_vec(&claims).map_err(|_| {
        OauthClientError::new_protocol_error("could not serialize the request object", None)
    })?;

    sign_compact(&payload, &header, signing_key, &alg)
}

/// Issues a signed request object and encrypts it to the server.
///
/// The key management algorithm comes from the client's
/// `request_object_encryption_alg`; the content encryption defaults to
/// `A128CBC-HS256`. The recipient key is selected from the server's JWK
/// Set.
pub async fn issue_signed_and_encrypted_request_object<T>(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    parameters: &AuthorizationParameters,
    signing_key: &Jwk,
    http_client: &T,
) -> OauthReturnType<String>
where
    T: OauthHttpClient,
{
    let alg = client
        .request_object_encryption_alg
        .as_ref()
        .ok_or_else(|| {
            Box::new(OauthClientError::new_type_error(
                "request_object_encryption_alg must be configured on the client",
                None,
            ))
        })?;

    let enc = client
        .request_object_encryption_enc
        .as_deref()
        .unwrap_or(DEFAULT_REQUEST_OBJECT_ENC);

    let signed = issue_request_object(issuer, client, parameters, signing_key)?;

    let recipient_key = remote_encryption_key(issuer, alg, http_client).await?;

    encrypt_compact(
        signed.as_bytes(),
        alg,
        enc,
        Some(REQUEST_OBJECT_TYP),
        &recipient_key,
    )
}
