//! The JWT validation pipeline.
//!
//! [`validate_signed_jwt`] covers the transport independent steps that
//! need the network (signature key resolution), producing a [`ParsedJwt`];
//! [`validate_jwt_claims`] runs the claim checks against it. Both
//! short-circuit on the first violation.

use serde_json::{Map, Value};

use crate::helpers::{constant_time_eq, left_half_hash, now, CLOCK_TOLERANCE_SECS};
use crate::http::OauthHttpClient;
use crate::jose::jws::{decode_protected_header, verify_compact};
use crate::jwks::select_remote_key;
use crate::types::{
    AuthorizationServer, MaxAgeCheck, NonceCheck, OauthClientError, OauthReturnType,
};

/// A signature-verified, parsed JWT. Never escapes the response
/// validators.
#[derive(Debug, Clone)]
pub(crate) struct ParsedJwt {
    pub header: Map<String, Value>,
    pub claims: Map<String, Value>,
}

/// Resolves the accepted JWS algorithms for a response kind, in priority
/// order: the client's configured expectation wins, otherwise whatever
/// the server metadata advertises, otherwise `RS256` alone. The fallback
/// matters: a server that advertises nothing gets `RS256` only.
pub(crate) fn accepted_algs(
    client_expected: Option<&String>,
    server_supported: Option<&Vec<String>>,
) -> Vec<String> {
    if let Some(expected) = client_expected {
        return vec![expected.clone()];
    }

    if let Some(supported) = server_supported {
        return supported.clone();
    }

    vec!["RS256".to_string()]
}

/// Signature-level pipeline: header decode (JWE structured tokens are
/// refused), algorithm policy, `crit` rejection, optional `typ` check,
/// key selection against the server's JWK Set, signature verification and
/// the payload object-literal check.
pub(crate) async fn validate_signed_jwt<T>(
    jwt: &str,
    accepted: &[String],
    expected_typ: Option<&str>,
    issuer: &AuthorizationServer,
    http_client: &T,
) -> OauthReturnType<ParsedJwt>
where
    T: OauthHttpClient,
{
    let header = decode_protected_header(jwt)?;

    let alg = match header.get("alg") {
        Some(Value::String(alg)) => alg.clone(),
        _ => {
            return Err(Box::new(OauthClientError::new_protocol_error(
                "missing JWT alg header parameter",
                None,
            )))
        }
    };

    if !accepted.contains(&alg) {
        return Err(Box::new(OauthClientError::new_protocol_error(
            &format!("unexpected JWT alg received, got: {}", alg),
            None,
        )));
    }

    if header.contains_key("crit") {
        return Err(Box::new(OauthClientError::new_unsupported_operation(
            "no JWT crit header parameter extensions are supported",
            None,
        )));
    }

    if let Some(expected) = expected_typ {
        let typ = header
            .get("typ")
            .and_then(Value::as_str)
            .map(normalize_typ)
            .unwrap_or_default();

        if typ != normalize_typ(expected) {
            return Err(Box::new(OauthClientError::new_protocol_error(
                &format!("unexpected JWT typ received, expected {}", expected),
                None,
            )));
        }
    }

    let kid = header.get("kid").and_then(Value::as_str);

    let key = select_remote_key(issuer, &alg, kid, http_client).await?;

    let (_, payload_bytes) = verify_compact(jwt, &key, &alg)?;

    let claims = match serde_json::from_slice::<Value>(&payload_bytes) {
        Ok(Value::Object(map)) => map,
        _ => {
            return Err(Box::new(OauthClientError::new_protocol_error(
                "JWT payload must be a top level JSON object",
                None,
            )))
        }
    };

    Ok(ParsedJwt { header, claims })
}

fn normalize_typ(typ: &str) -> String {
    typ.trim_start_matches("application/").to_lowercase()
}

/// How the `aud` claim relates to the client.
pub(crate) enum AudienceCheck<'a> {
    /// `aud` must be present and contain/equal `client_id`.
    Required(&'a str),
    /// Checked only when present (signed userinfo).
    Optional(&'a str),
}

/// How the `iss` claim relates to the authorization server.
pub(crate) enum IssuerCheck<'a> {
    /// `iss` must be present and equal this issuer.
    Required(&'a str),
    /// Checked only when present (signed userinfo).
    Optional(&'a str),
    /// Not checked at the JWT layer.
    Skip,
}

/// Claim-level checks applied to a [`ParsedJwt`].
pub(crate) struct ClaimChecks<'a> {
    pub required: &'a [&'a str],
    pub issuer: IssuerCheck<'a>,
    pub audience: AudienceCheck<'a>,
    pub nonce: Option<&'a NonceCheck>,
    pub require_auth_time: bool,
    pub max_age: &'a MaxAgeCheck,
    /// `access_token` that the `at_hash` claim, when present, must commit
    /// to.
    pub at_hash_source: Option<&'a str>,
}

impl<'a> ClaimChecks<'a> {
    pub(crate) fn new(required: &'a [&'a str], audience: AudienceCheck<'a>) -> Self {
        Self {
            required,
            issuer: IssuerCheck::Skip,
            audience,
            nonce: None,
            require_auth_time: false,
            max_age: &MaxAgeCheck::Skip,
            at_hash_source: None,
        }
    }
}

/// Claim-level pipeline: presence, claim types and timestamp windows,
/// issuer, audience, `azp`, `auth_time`, `at_hash` and `nonce`, in that
/// order.
pub(crate) fn validate_jwt_claims(parsed: &ParsedJwt, checks: &ClaimChecks) -> OauthReturnType<()> {
    let claims = &parsed.claims;

    for claim in checks.required {
        if !claims.contains_key(*claim) {
            return Err(Box::new(OauthClientError::new_protocol_error(
                &format!("missing required JWT claim {}", claim),
                None,
            )));
        }
    }

    let timestamp = now();

    if let Some(exp) = claims.get("exp") {
        let exp = exp.as_i64().ok_or_else(|| {
            Box::new(OauthClientError::new_protocol_error(
                "JWT exp claim must be a JSON numeric value",
                None,
            ))
        })?;

        if exp <= timestamp - CLOCK_TOLERANCE_SECS {
            return Err(Box::new(OauthClientError::new_protocol_error(
                &format!("JWT expired, now {}, exp {}", timestamp, exp),
                None,
            )));
        }
    }

    if let Some(iat) = claims.get("iat") {
        if !iat.is_number() {
            return Err(Box::new(OauthClientError::new_protocol_error(
                "JWT iat claim must be a JSON numeric value",
                None,
            )));
        }
    }

    if let Some(nbf) = claims.get("nbf") {
        let nbf = nbf.as_i64().ok_or_else(|| {
            Box::new(OauthClientError::new_protocol_error(
                "JWT nbf claim must be a JSON numeric value",
                None,
            ))
        })?;

        if nbf > timestamp + CLOCK_TOLERANCE_SECS {
            return Err(Box::new(OauthClientError::new_protocol_error(
                &format!("JWT not active yet, now {}, nbf {}", timestamp, nbf),
                None,
            )));
        }
    }

    let expected_issuer = match checks.issuer {
        IssuerCheck::Required(expected) => Some(expected),
        IssuerCheck::Optional(expected) if claims.contains_key("iss") => Some(expected),
        _ => None,
    };

    if let Some(expected_issuer) = expected_issuer {
        let iss = claims.get("iss").and_then(Value::as_str).ok_or_else(|| {
            Box::new(OauthClientError::new_protocol_error(
                "JWT iss claim must be a string",
                None,
            ))
        })?;

        if iss != expected_issuer {
            return Err(Box::new(OauthClientError::new_protocol_error(
                &format!(
                    "unexpected JWT iss value, expected {}, got: {}",
                    expected_issuer, iss
                ),
                None,
            )));
        }
    }

    let client_id = match checks.audience {
        AudienceCheck::Required(client_id) => {
            if !claims.contains_key("aud") {
                return Err(Box::new(OauthClientError::new_protocol_error(
                    "missing required JWT claim aud",
                    None,
                )));
            }
            client_id
        }
        AudienceCheck::Optional(client_id) => client_id,
    };

    if let Some(aud) = claims.get("aud") {
        validate_audience(aud, client_id, claims)?;
    }

    validate_auth_time(claims, checks, timestamp)?;

    if let Some(access_token) = checks.at_hash_source {
        if let Some(at_hash) = claims.get("at_hash") {
            let at_hash = at_hash.as_str().ok_or_else(|| {
                Box::new(OauthClientError::new_protocol_error(
                    "JWT at_hash claim must be a string",
                    None,
                ))
            })?;

            let alg = parsed
                .header
                .get("alg")
                .and_then(Value::as_str)
                .unwrap_or_default();

            let expected = left_half_hash(alg, access_token)?;

            if !constant_time_eq(at_hash, &expected) {
                return Err(Box::new(OauthClientError::new_protocol_error(
                    "invalid ID Token at_hash",
                    None,
                )));
            }
        }
    }

    if let Some(nonce_check) = checks.nonce {
        let claim = claims.get("nonce");

        match (nonce_check, claim) {
            (NonceCheck::ExpectNone, None) => {}
            (NonceCheck::ExpectNone, Some(_)) => {
                return Err(Box::new(OauthClientError::new_protocol_error(
                    "unexpected JWT nonce claim received",
                    None,
                )))
            }
            (NonceCheck::Value(expected), Some(Value::String(got))) => {
                if !constant_time_eq(got, expected) {
                    return Err(Box::new(OauthClientError::new_protocol_error(
                        "unexpected JWT nonce claim value received",
                        None,
                    )));
                }
            }
            (NonceCheck::Value(_), _) => {
                return Err(Box::new(OauthClientError::new_protocol_error(
                    "missing required JWT claim nonce",
                    None,
                )))
            }
        }
    }

    Ok(())
}

fn validate_audience(
    aud: &Value,
    client_id: &str,
    claims: &Map<String, Value>,
) -> OauthReturnType<()> {
    match aud {
        Value::String(aud) => {
            if aud != client_id {
                return Err(Box::new(OauthClientError::new_protocol_error(
                    &format!("aud mismatch, expected {}, got: {}", client_id, aud),
                    None,
                )));
            }
        }
        Value::Array(audiences) => {
            let mut values = Vec::with_capacity(audiences.len());
            for value in audiences {
                match value.as_str() {
                    Some(s) => values.push(s),
                    None => {
                        return Err(Box::new(OauthClientError::new_protocol_error(
                            "JWT aud claim must be a string or an array of strings",
                            None,
                        )))
                    }
                }
            }

            if !values.contains(&client_id) {
                return Err(Box::new(OauthClientError::new_protocol_error(
                    &format!(
                        "aud is missing the client_id, expected {} to be included in {:?}",
                        client_id, values
                    ),
                    None,
                )));
            }

            if audiences.len() != 1 {
                match claims.get("azp").and_then(Value::as_str) {
                    Some(azp) if azp == client_id => {}
                    Some(azp) => {
                        return Err(Box::new(OauthClientError::new_protocol_error(
                            &format!("azp mismatch, got: {}", azp),
                            None,
                        )))
                    }
                    None => {
                        return Err(Box::new(OauthClientError::new_protocol_error(
                            "missing required JWT claim azp",
                            None,
                        )))
                    }
                }
            }
        }
        _ => {
            return Err(Box::new(OauthClientError::new_protocol_error(
                "JWT aud claim must be a string or an array of strings",
                None,
            )))
        }
    }

    Ok(())
}

fn validate_auth_time(
    claims: &Map<String, Value>,
    checks: &ClaimChecks,
    timestamp: i64,
) -> OauthReturnType<()> {
    let max_age = match checks.max_age {
        MaxAgeCheck::Value(seconds) => Some(*seconds),
        MaxAgeCheck::Skip => None,
    };

    if checks.require_auth_time || max_age.is_some() {
        let auth_time = match claims.get("auth_time") {
            Some(value) => value.as_i64().ok_or_else(|| {
                Box::new(OauthClientError::new_protocol_error(
                    "JWT auth_time claim must be a JSON numeric value",
                    None,
                ))
            })?,
            None => {
                return Err(Box::new(OauthClientError::new_protocol_error(
                    "missing required JWT claim auth_time",
                    None,
                )))
            }
        };

        if let Some(max_age) = max_age {
            if auth_time + (max_age as i64) < timestamp - CLOCK_TOLERANCE_SECS {
                return Err(Box::new(OauthClientError::new_protocol_error(
                    &format!(
                        "too much time has elapsed since the last End-User authentication, max_age {}, auth_time: {}, now {}",
                        max_age, auth_time, timestamp
                    ),
                    None,
                )));
            }
        }
    }

    Ok(())
}
