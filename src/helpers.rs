//! Random value generation, PKCE, digest helpers and the
//! `WWW-Authenticate` challenge parser.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;
use rand::RngCore;
use regex::Regex;
use sha2::{Digest, Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;
use url::form_urlencoded;

use crate::types::{OauthClientError, OauthReturnType, WwwAuthenticateChallenge};

/// Allowed clock skew applied symmetrically to `exp`, `nbf` and
/// `auth_time` checks.
pub(crate) const CLOCK_TOLERANCE_SECS: i64 = 30;

lazy_static! {
    // HTTP token characters, RFC 7230 section 3.2.6.
    static ref WWW_PARAM_REGEX: Regex =
        Regex::new(r"(?:,|, )?[0-9a-zA-Z!#$%&'*+\-.^_`|~]+=").unwrap();
    static ref WWW_SCHEME_REGEX: Regex =
        Regex::new(r"[0-9a-zA-Z!#$%&'*+\-.^_`|~]+").unwrap();
}

/// Unix timestamp in seconds.
pub(crate) fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs() as i64
}

/// Generates `bytes_to_generate` (default 32) random bytes and returns
/// them base64url encoded without padding.
pub fn generate_random(bytes_to_generate: Option<u32>) -> String {
    let mut random_bytes = vec![0u8; bytes_to_generate.unwrap_or(32) as usize];
    rand::thread_rng().fill_bytes(&mut random_bytes);

    base64_url::encode(&random_bytes)
}

/// Generates a random `state` parameter value.
pub fn generate_random_state() -> String {
    generate_random(None)
}

/// Generates a random `nonce` parameter value.
pub fn generate_random_nonce() -> String {
    generate_random(None)
}

/// Generates a random PKCE `code_verifier` (RFC 7636).
pub fn generate_random_code_verifier() -> String {
    generate_random(None)
}

/// Calculates the S256 PKCE `code_challenge` for `code_verifier`:
/// `base64url(SHA-256(utf8(code_verifier)))`.
pub fn calculate_pkce_code_challenge(code_verifier: &str) -> String {
    base64_url::encode(&Sha256::digest(code_verifier.as_bytes()))
}

/// Digest under the hash implied by the given JWS `alg` suffix, used for
/// `at_hash` and DPoP `ath` style claims.
pub(crate) fn alg_digest(alg: &str, input: &str) -> OauthReturnType<Vec<u8>> {
    match alg {
        "RS256" | "PS256" | "ES256" | "HS256" => Ok(Sha256::digest(input)[..].to_vec()),
        "RS384" | "PS384" | "ES384" | "HS384" => Ok(Sha384::digest(input)[..].to_vec()),
        "RS512" | "PS512" | "ES512" | "HS512" => Ok(Sha512::digest(input)[..].to_vec()),
        _ => Err(Box::new(OauthClientError::new_unsupported_operation(
            "unrecognized or invalid JWS algorithm provided",
            None,
        ))),
    }
}

/// Left half of the `alg` implied digest of `source`, base64url encoded.
pub(crate) fn left_half_hash(alg: &str, source: &str) -> OauthReturnType<String> {
    let hash = alg_digest(alg, source)?;
    Ok(base64_url::encode(&hash[0..hash.len() / 2]))
}

/// Compares two strings in constant time. Length mismatches return false
/// without inspecting contents.
pub(crate) fn constant_time_eq(actual: &str, expected: &str) -> bool {
    actual.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// `application/x-www-form-urlencoded` serialization, preserving pair
/// order.
pub(crate) fn form_url_encode_pairs(pairs: &[(String, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        serializer.append_pair(k, v);
    }

    serializer.finish()
}

/// `Basic` authorization header value for `client_secret_basic`: both the
/// identifier and the secret are form-encoded (`%20` rewritten to `+`,
/// RFC 6749 appendix B) before base64.
pub(crate) fn basic_auth_value(client_id: &str, client_secret: &str) -> String {
    let credentials = format!(
        "{}:{}",
        urlencoding::encode(client_id),
        urlencoding::encode(client_secret)
    )
    .replace("%20", "+");

    use base64::{engine::general_purpose::STANDARD, Engine};
    format!("Basic {}", STANDARD.encode(credentials))
}

/// Parses a `WWW-Authenticate` header value into its challenges.
///
/// Each comma-leading scheme token starts a challenge; `name=value`
/// parameters are split on token boundaries, quoted-string continuations
/// are re-joined across splits, surrounding quotes are stripped, and the
/// scheme plus all parameter names are lowercased. The parse is
/// idempotent over this lowercase and unquoted normal form.
pub fn parse_www_authenticate_challenges(header_value: &str) -> Vec<WwwAuthenticateChallenge> {
    let mut scheme_positions: Vec<(usize, usize)> = vec![];

    for token in WWW_SCHEME_REGEX.find_iter(header_value) {
        let preceded = {
            let before = header_value[..token.start()].trim_end_matches(' ');
            before.is_empty() || before.ends_with(',')
        };
        let followed = match header_value[token.end()..].chars().next() {
            None => true,
            Some(c) => c == ' ' || c == ',',
        };

        if preceded && followed {
            scheme_positions.push((token.start(), token.end()));
        }
    }

    let mut challenges = vec![];

    for (i, (start, scheme_end)) in scheme_positions.iter().enumerate() {
        let mut section_end = scheme_positions
            .get(i + 1)
            .map(|(next_start, _)| *next_start)
            .unwrap_or(header_value.len());

        // The separator in front of the next scheme belongs to neither
        // challenge.
        let bytes = header_value.as_bytes();
        while section_end > *scheme_end && bytes[section_end - 1] == b' ' {
            section_end -= 1;
        }
        if section_end > *scheme_end && bytes[section_end - 1] == b',' {
            section_end -= 1;
        }

        let scheme = header_value[*start..*scheme_end].to_lowercase();
        let parameters =
            parse_challenge_parameters(&header_value[*scheme_end..section_end]);

        challenges.push(WwwAuthenticateChallenge { scheme, parameters });
    }

    challenges
}

fn parse_challenge_parameters(section: &str) -> HashMap<String, String> {
    // Split into [name, value, name, value, ...] the way a split-with-
    // captures would, dropping whatever precedes the first name.
    let mut segments: Vec<String> = vec![];
    let mut cursor = 0;

    for name in WWW_PARAM_REGEX.find_iter(section) {
        if !segments.is_empty() {
            segments.push(section[cursor..name.start()].to_string());
        }
        segments.push(name.as_str().to_string());
        cursor = name.end();
    }

    let mut parameters = HashMap::new();

    if segments.is_empty() {
        return parameters;
    }

    segments.push(section[cursor..].to_string());

    if let Some(last) = segments.last_mut() {
        if last.ends_with(',') {
            last.pop();
        }
    }

    let mut i = 1;
    while i < segments.len() {
        let name_index = i - 1;
        let mut value = segments[i].clone();

        if value.starts_with('"') {
            // A quoted value containing a name= boundary was split apart;
            // glue the following segments back on until the quote closes.
            while !value_closed(&value) && i + 1 < segments.len() {
                i += 1;
                value.push_str(&segments[i]);
            }
        }

        let name = segments[name_index]
            .trim_start_matches(", ")
            .trim_start_matches(',')
            .trim_end_matches('=')
            .to_lowercase();

        parameters.insert(name, unquote(&value));

        i += 2;
    }

    parameters
}

fn value_closed(value: &str) -> bool {
    value.len() > 1 && value.ends_with('"')
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    }
}
