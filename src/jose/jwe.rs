use josekit::{jwe, jwe::JweHeader, jwk::Jwk};

use crate::types::{OauthClientError, OauthReturnType};

use super::alg::{SUPPORTED_JWE_ALGS, SUPPORTED_JWE_ENCS};
use super::jwk::CustomJwk;

/// Encrypts `payload` into a compact JWE for the recipient `key`.
///
/// Only issuance is supported, and only for the closed ECDH-ES /
/// RSA-OAEP* by AES-GCM / AES-CBC-HMAC matrix; response decryption is a
/// non-goal of this crate.
pub(crate) fn encrypt_compact(
    payload: &[u8],
    alg: &str,
    enc: &str,
    content_type: Option<&str>,
    key: &Jwk,
) -> OauthReturnType<String> {
    if !SUPPORTED_JWE_ALGS.contains(&alg) {
        return Err(Box::new(OauthClientError::new_unsupported_operation(
            &format!("unsupported JWE algorithm {}", alg),
            None,
        )));
    }

    if !SUPPORTED_JWE_ENCS.contains(&enc) {
        return Err(Box::new(OauthClientError::new_unsupported_operation(
            &format!("unsupported JWE content encryption algorithm {}", enc),
            None,
        )));
    }

    let mut header = JweHeader::new();
    header.set_algorithm(alg);
    header.set_content_encryption(enc);

    if let Some(cty) = content_type {
        header.set_content_type(cty);
    }

    if let Some(kid) = key.key_id() {
        header.set_key_id(kid);
    }

    let encrypter = key.to_encrypter(alg)?;

    jwe::serialize_compact(payload, &header, &*encrypter).map_err(|_| {
        Box::new(OauthClientError::new_protocol_error(
            "error while encrypting request object",
            None,
        ))
    })
}
