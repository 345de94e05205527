//! DPoP proof issuance (draft-ietf-oauth-dpop) and the per-origin nonce
//! cache behind its self-correction behavior.

use std::sync::Mutex;

use josekit::{jwk::Jwk, jws::JwsHeader, jwt::JwtPayload};
use lazy_static::lazy_static;
use lru_time_cache::LruCache;
use regex::Regex;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;

use crate::helpers::{generate_random, now};
use crate::http::{HttpMethod, HttpResponse};
use crate::jose::alg::jws_alg_for_key;
use crate::jose::jwk::CustomJwk;
use crate::jose::jws::sign_compact;
use crate::types::{AuthorizationServer, OauthClientError, OauthReturnType};

const NONCE_CACHE_CAPACITY: usize = 100;

lazy_static! {
    static ref NQCHAR_REGEX: Regex = Regex::new(r"^[\x21\x23-\x5B\x5D-\x7E]+$").unwrap();
    static ref NONCE_CACHE: Mutex<LruCache<String, String>> =
        Mutex::new(LruCache::with_capacity(NONCE_CACHE_CAPACITY));
}

/// DPoP key binding for a request. The key must be a private asymmetric
/// JWK; its public projection is published in the proof header.
#[derive(Debug, Clone)]
pub struct DPoPOptions {
    /// The DPoP private key.
    pub private_key: Jwk,
    /// Explicit nonce override. When absent, the last nonce the origin
    /// handed out is used.
    pub nonce: Option<String>,
}

impl DPoPOptions {
    /// Binding with no nonce override.
    pub fn new(private_key: Jwk) -> Self {
        Self {
            private_key,
            nonce: None,
        }
    }
}

/// Builds a DPoP proof JWT for `method` on `url`.
///
/// `access_token` is hashed into the `ath` claim when authorizing a
/// protected resource request.
pub(crate) fn dpop_proof(
    options: &DPoPOptions,
    issuer: Option<&AuthorizationServer>,
    method: &HttpMethod,
    url: &Url,
    access_token: Option<&str>,
) -> OauthReturnType<String> {
    if !options.private_key.is_private_key() || options.private_key.key_type() == "oct" {
        return Err(Box::new(OauthClientError::new_type_error(
            "DPoP option must be a private asymmetric key",
            None,
        )));
    }

    let alg = jws_alg_for_key(&options.private_key)?;

    if let Some(supported) = issuer.and_then(|i| i.dpop_signing_alg_values_supported.as_ref()) {
        if !supported.contains(&alg) {
            return Err(Box::new(OauthClientError::new_unsupported_operation(
                "unsupported DPoP signing algorithm",
                None,
            )));
        }
    }

    let htu = dpop_htu(url);

    let nonce = match &options.nonce {
        Some(explicit) => Some(explicit.clone()),
        None => NONCE_CACHE
            .lock()
            .expect("dpop nonce cache poisoned")
            .get(&origin_of(url))
            .cloned(),
    };

    let claim_error =
        |_| OauthClientError::new_protocol_error("invalid DPoP claim value", None);

    let mut payload = JwtPayload::new();
    payload
        .set_claim("iat", Some(json!(now())))
        .map_err(claim_error)?;
    payload
        .set_claim("jti", Some(json!(generate_random(None))))
        .map_err(claim_error)?;
    payload
        .set_claim("htm", Some(json!(method.as_str())))
        .map_err(claim_error)?;
    payload.set_claim("htu", Some(json!(htu))).map_err(claim_error)?;

    if let Some(nonce) = nonce {
        payload
            .set_claim("nonce", Some(json!(nonce)))
            .map_err(claim_error)?;
    }

    if let Some(token) = access_token {
        let ath = base64_url::encode(&Sha256::digest(token.as_bytes()));
        payload.set_claim("ath", Some(json!(ath))).map_err(claim_error)?;
    }

    let mut header = JwsHeader::new();
    header.set_algorithm(&alg);
    header.set_token_type("dpop+jwt");
    header
        .set_claim("jwk", Some(options.private_key.minimal_public_jwk()))
        .map_err(|_| OauthClientError::new_protocol_error("invalid DPoP jwk", None))?;

    let payload_bytes = serde_json::to_vec(payload.claims_set()).map_err(|_| {
        OauthClientError::new_protocol_error("could not serialize DPoP payload", None)
    })?;

    sign_compact(&payload_bytes, &header, &options.private_key, &alg)
}

/// Records the `DPoP-Nonce` header of a response, successful or not, as
/// the nonce to use for this origin from now on. Every response handed to
/// [`crate::http::transmit`] passes through here, so a caller retries a
/// `use_dpop_nonce` rejection by simply reissuing the request.
pub fn record_dpop_nonce(url: &Url, response: &HttpResponse) {
    if let Some(nonce) = &response.dpop_nonce {
        if NQCHAR_REGEX.is_match(nonce) {
            debug!(origin = %origin_of(url), "recorded DPoP nonce");
            NONCE_CACHE
                .lock()
                .expect("dpop nonce cache poisoned")
                .insert(origin_of(url), nonce.clone());
        }
    }
}

/// The `htu` claim value: origin plus pathname, query and fragment
/// stripped.
pub(crate) fn dpop_htu(url: &Url) -> String {
    origin_of(url) + url.path()
}

fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

#[cfg(test)]
pub(crate) fn peek_dpop_nonce(origin: &str) -> Option<String> {
    NONCE_CACHE
        .lock()
        .expect("dpop nonce cache poisoned")
        .get(origin)
        .cloned()
}
