//! JWK Set fetching, caching and key selection.
//!
//! Fetched sets are cached per `jwks_uri` in a bounded LRU. An entry older
//! than five hours is stale: it is still used, but a selection miss on a
//! stale entry evicts it and retries once against a fresh fetch, which is
//! how rotated signing keys are picked up without configuration.

use std::sync::Mutex;

use josekit::jwk::Jwk;
use lazy_static::lazy_static;
use lru_time_cache::LruCache;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::helpers::now;
use crate::http::{transmit, HttpMethod, HttpRequest, HttpResponse, OauthHttpClient};
use crate::jose::alg::{curve_for_jws_alg, kty_for_jws_alg};
use crate::types::{AuthorizationServer, OauthClientError, OauthReturnType};

const JWKS_CACHE_CAPACITY: usize = 20;
const JWKS_MAX_AGE_SECS: i64 = 5 * 60 * 60;

/// A JSON Web Key Set as served from a `jwks_uri`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    keys: Vec<Jwk>,
}

impl From<Vec<Jwk>> for JsonWebKeySet {
    fn from(keys: Vec<Jwk>) -> Self {
        Self { keys }
    }
}

impl JsonWebKeySet {
    /// Narrows the set down to the keys applicable to a JWS header.
    ///
    /// A candidate must match the algorithm's key type, the header `kid`
    /// when one was present, its own `alg`/`use`/`key_ops` restrictions
    /// when it declares any, and for EC keys the curve the algorithm
    /// requires.
    pub(crate) fn filter(&self, alg: &str, kid: Option<&str>) -> OauthReturnType<Vec<&Jwk>> {
        let kty = kty_for_jws_alg(alg)?;
        let curve = curve_for_jws_alg(alg);

        Ok(self
            .keys
            .iter()
            .filter(|key| {
                if key.key_type() != kty {
                    return false;
                }

                if kid.is_some() && key.key_id() != kid {
                    return false;
                }

                if key.algorithm().is_some() && key.algorithm() != Some(alg) {
                    return false;
                }

                if key.key_use().is_some() && key.key_use() != Some("sig") {
                    return false;
                }

                if let Some(ops) = key.key_operations() {
                    if !ops.contains(&"verify") {
                        return false;
                    }
                }

                if let Some(required_curve) = curve {
                    if key.curve() != Some(required_curve) {
                        return false;
                    }
                }

                true
            })
            .collect())
    }

    /// The single applicable key, or an error when there is none or the
    /// match is ambiguous.
    pub(crate) fn select(&self, alg: &str, kid: Option<&str>) -> OauthReturnType<Jwk> {
        let candidates = self.filter(alg, kid)?;

        match candidates.len() {
            1 => {
                let mut key = candidates[0].clone();
                if key.algorithm().is_none() {
                    key.set_algorithm(alg);
                }
                Ok(key)
            }
            0 => Err(Box::new(OauthClientError::new_protocol_error(
                "error when selecting a JWT verification key, no applicable keys found",
                None,
            ))),
            _ => Err(Box::new(OauthClientError::new_protocol_error(
                "error when selecting a JWT verification key, multiple applicable keys found, a kid JWT Header Parameter is required",
                None,
            ))),
        }
    }

    fn is_empty_match(&self, alg: &str, kid: Option<&str>) -> bool {
        self.filter(alg, kid).map(|c| c.is_empty()).unwrap_or(false)
    }

    /// The first key usable for encrypting to the server under the given
    /// JWE key management algorithm.
    pub(crate) fn select_encryption_key(&self, alg: &str) -> OauthReturnType<Jwk> {
        let kty = if alg.starts_with("ECDH") { "EC" } else { "RSA" };

        self.keys
            .iter()
            .find(|key| {
                key.key_type() == kty
                    && key.key_use() != Some("sig")
                    && (key.algorithm().is_none() || key.algorithm() == Some(alg))
            })
            .cloned()
            .ok_or_else(|| {
                Box::new(OauthClientError::new_protocol_error(
                    "no applicable encryption key found in the JSON Web Key Set",
                    None,
                ))
            })
    }
}

#[derive(Clone)]
struct CacheEntry {
    jwks: JsonWebKeySet,
    iat: i64,
}

impl CacheEntry {
    fn is_stale(&self, timestamp: i64) -> bool {
        self.iat + JWKS_MAX_AGE_SECS < timestamp
    }
}

lazy_static! {
    static ref JWKS_CACHE: Mutex<LruCache<String, CacheEntry>> =
        Mutex::new(LruCache::with_capacity(JWKS_CACHE_CAPACITY));
}

/// Builds the JWK Set request for the server's `jwks_uri`.
pub fn jwks_request(issuer: &AuthorizationServer) -> OauthReturnType<HttpRequest> {
    let uri = issuer
        .jwks_uri
        .as_ref()
        .ok_or_else(|| {
            Box::new(OauthClientError::new_type_error(
                "jwks_uri must be configured on the authorization server",
                None,
            ))
        })?;

    let url = Url::parse(uri).map_err(|_| {
        Box::new(OauthClientError::new_type_error(
            "jwks_uri must be a valid URL",
            None,
        ))
    })?;

    Ok(HttpRequest::new(url)
        .method(HttpMethod::GET)
        .header("accept", "application/json, application/jwk-set+json")
        .expect_status_code(200))
}

/// Validates a JWK Set response: 200, a top-level object whose `keys`
/// member is an array of objects.
pub fn process_jwks_response(response: &HttpResponse) -> OauthReturnType<JsonWebKeySet> {
    let body = response.body.as_ref().ok_or_else(|| {
        Box::new(OauthClientError::new_op_error(
            "server_error".to_string(),
            Some("JWKS response was empty".to_string()),
            None,
            Some(response.clone()),
        ))
    })?;

    let json: serde_json::Value = serde_json::from_str(body).map_err(|_| {
        Box::new(OauthClientError::new_protocol_error(
            "failed to parse the JSON Web Key Set",
            Some(response.clone()),
        ))
    })?;

    if !json.is_object() || !json.get("keys").map(serde_json::Value::is_array).unwrap_or(false) {
        return Err(Box::new(OauthClientError::new_protocol_error(
            "JSON Web Key Set must be a JSON object with a keys array",
            Some(response.clone()),
        )));
    }

    serde_json::from_value(json).map_err(|_| {
        Box::new(OauthClientError::new_protocol_error(
            "failed to parse the JSON Web Key Set",
            Some(response.clone()),
        ))
    })
}

async fn fetch_jwks<T>(
    issuer: &AuthorizationServer,
    http_client: &T,
) -> OauthReturnType<JsonWebKeySet>
where
    T: OauthHttpClient,
{
    let request = jwks_request(issuer)?;
    let response = transmit(request, http_client).await?;
    let jwks = process_jwks_response(&response)?;

    if let Some(uri) = &issuer.jwks_uri {
        JWKS_CACHE.lock().expect("jwks cache poisoned").insert(
            uri.clone(),
            CacheEntry {
                jwks: jwks.clone(),
                iat: now(),
            },
        );
    }

    Ok(jwks)
}

/// Resolves the verification key a JWS header points at, fetching and
/// caching the server's JWK Set as needed.
///
/// When a cached set is stale and yields no candidate the entry is
/// evicted and the selection retried once against a fresh fetch.
pub(crate) async fn select_remote_key<T>(
    issuer: &AuthorizationServer,
    alg: &str,
    kid: Option<&str>,
    http_client: &T,
) -> OauthReturnType<Jwk>
where
    T: OauthHttpClient,
{
    let uri = issuer
        .jwks_uri
        .as_ref()
        .ok_or_else(|| {
            Box::new(OauthClientError::new_type_error(
                "jwks_uri must be configured on the authorization server",
                None,
            ))
        })?
        .clone();

    let cached = JWKS_CACHE
        .lock()
        .expect("jwks cache poisoned")
        .get(&uri)
        .cloned();

    match cached {
        Some(entry) => {
            let stale = entry.is_stale(now());

            if stale && entry.jwks.is_empty_match(alg, kid) {
                debug!(jwks_uri = %uri, "stale JWKS has no applicable key, refetching");
                JWKS_CACHE.lock().expect("jwks cache poisoned").remove(&uri);
                let fresh = fetch_jwks(issuer, http_client).await?;
                return fresh.select(alg, kid);
            }

            entry.jwks.select(alg, kid)
        }
        None => {
            let fresh = fetch_jwks(issuer, http_client).await?;
            fresh.select(alg, kid)
        }
    }
}

/// Resolves a key to encrypt a request object to, from the cached JWK
/// Set when one is held, freshly fetched otherwise.
pub(crate) async fn remote_encryption_key<T>(
    issuer: &AuthorizationServer,
    alg: &str,
    http_client: &T,
) -> OauthReturnType<Jwk>
where
    T: OauthHttpClient,
{
    if let Some(uri) = &issuer.jwks_uri {
        let cached = JWKS_CACHE
            .lock()
            .expect("jwks cache poisoned")
            .get(uri)
            .cloned();

        if let Some(entry) = cached {
            if !entry.is_stale(now()) {
                return entry.jwks.select_encryption_key(alg);
            }
        }
    }

    let fresh = fetch_jwks(issuer, http_client).await?;
    fresh.select_encryption_key(alg)
}

#[cfg(test)]
pub(crate) fn backdate_jwks_cache_entry(jwks_uri: &str, age_secs: i64) {
    let mut cache = JWKS_CACHE.lock().expect("jwks cache poisoned");
    if let Some(entry) = cache.get_mut(jwks_uri) {
        entry.iat -= age_secs;
    }
}
