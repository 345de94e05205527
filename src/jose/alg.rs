use josekit::jwk::Jwk;

use crate::types::{OauthClientError, OauthReturnType};

/// JWS algorithms this crate signs and verifies with. Closed set; symmetric
/// algorithms are deliberately absent (HS* is accepted only for
/// `client_secret_jwt` client assertions, never for response validation).
pub const SUPPORTED_JWS_ALGS: [&str; 9] = [
    "PS256", "PS384", "PS512", "ES256", "ES384", "ES512", "RS256", "RS384", "RS512",
];

/// JWE key management algorithms accepted for request object encryption.
pub const SUPPORTED_JWE_ALGS: [&str; 5] = [
    "ECDH-ES",
    "RSA-OAEP",
    "RSA-OAEP-256",
    "RSA-OAEP-384",
    "RSA-OAEP-512",
];

/// JWE content encryption algorithms accepted for request object
/// encryption.
pub const SUPPORTED_JWE_ENCS: [&str; 6] = [
    "A128GCM",
    "A192GCM",
    "A256GCM",
    "A128CBC-HS256",
    "A192CBC-HS384",
    "A256CBC-HS512",
];

/// HMAC algorithms used exclusively by `client_secret_jwt`.
pub(crate) const SUPPORTED_HMAC_ALGS: [&str; 3] = ["HS256", "HS384", "HS512"];

/// EC curve required by an ES* algorithm.
pub(crate) fn curve_for_jws_alg(alg: &str) -> Option<&'static str> {
    match alg {
        "ES256" => Some("P-256"),
        "ES384" => Some("P-384"),
        "ES512" => Some("P-521"),
        _ => None,
    }
}

/// Key type required by a JWS algorithm, from its two-letter prefix.
pub(crate) fn kty_for_jws_alg(alg: &str) -> OauthReturnType<&'static str> {
    match &alg[..2.min(alg.len())] {
        "RS" | "PS" => Ok("RSA"),
        "ES" => Ok("EC"),
        _ => Err(Box::new(OauthClientError::new_unsupported_operation(
            &format!("unsupported JWS algorithm {}", alg),
            None,
        ))),
    }
}

/// Derives the JWS algorithm from key metadata by inspection, never by
/// trust: the key's declared `alg` is cross-checked against its type and
/// curve, and a declaration outside the supported set is refused.
pub(crate) fn jws_alg_for_key(jwk: &Jwk) -> OauthReturnType<String> {
    let derived = match jwk.key_type() {
        "EC" => match jwk.curve() {
            Some("P-256") => Some("ES256".to_string()),
            Some("P-384") => Some("ES384".to_string()),
            Some("P-521") => Some("ES512".to_string()),
            _ => {
                return Err(Box::new(OauthClientError::new_unsupported_operation(
                    "unsupported EC key curve",
                    None,
                )))
            }
        },
        "RSA" => None,
        _ => {
            return Err(Box::new(OauthClientError::new_unsupported_operation(
                "unsupported asymmetric key type",
                None,
            )))
        }
    };

    match (jwk.algorithm(), derived) {
        (Some(declared), Some(derived)) if declared == derived => Ok(derived),
        (Some(declared), Some(derived)) => Err(Box::new(
            OauthClientError::new_unsupported_operation(
                &format!(
                    "JWK alg {} does not match its curve, expected {}",
                    declared, derived
                ),
                None,
            ),
        )),
        (None, Some(derived)) => Ok(derived),
        (Some(declared), None) if SUPPORTED_JWS_ALGS.contains(&declared) => {
            check_rsa_modulus(jwk)?;
            Ok(declared.to_string())
        }
        (Some(declared), None) => Err(Box::new(
            OauthClientError::new_unsupported_operation(
                &format!("unsupported JWS algorithm {}", declared),
                None,
            ),
        )),
        (None, None) => Err(Box::new(OauthClientError::new_unsupported_operation(
            "RSA JWK must declare its alg",
            None,
        ))),
    }
}

/// RSA keys below 2048 bit moduli are refused for both signing and
/// verification.
pub(crate) fn check_rsa_modulus(jwk: &Jwk) -> OauthReturnType<()> {
    if jwk.key_type() != "RSA" {
        return Ok(());
    }

    let modulus = jwk
        .parameter("n")
        .and_then(|n| n.as_str())
        .and_then(|n| base64_url::decode(n).ok())
        .ok_or_else(|| {
            Box::new(OauthClientError::new_type_error(
                "RSA JWK is missing its modulus",
                None,
            ))
        })?;

    if modulus.len() * 8 < 2048 {
        return Err(Box::new(OauthClientError::new_unsupported_operation(
            &format!("unsupported RSA modulus bit count {}", modulus.len() * 8),
            None,
        )));
    }

    Ok(())
}
