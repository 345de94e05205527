//! Authorization response validation: the redirect callback parameters,
//! and their JARM (JWT Secured Authorization Response Mode) envelope.

use serde_json::Value;
use url::Url;

use crate::helpers::constant_time_eq;
use crate::http::OauthHttpClient;
use crate::jwt::{
    accepted_algs, validate_jwt_claims, validate_signed_jwt, AudienceCheck, ClaimChecks,
    IssuerCheck,
};
use crate::types::{
    AuthorizationServer, CallbackParameters, ClientMetadata, OauthClientError, OauthReturnType,
    StateCheck,
};

/// Validates the parameters of a redirect callback URL.
pub fn validate_auth_response_url(
    issuer: &AuthorizationServer,
    url: &Url,
    expected_state: &StateCheck,
) -> OauthReturnType<CallbackParameters> {
    let parameters: CallbackParameters = url
        .query_pairs()
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    validate_auth_response(issuer, &parameters, expected_state)
}

/// Validates authorization response parameters.
///
/// Enforces RFC 9207 `iss` when the server advertises it, applies the
/// three-valued `state` check, returns the server's error object verbatim
/// when the response is an error, and refuses hybrid/implicit responses
/// outright.
pub fn validate_auth_response(
    issuer: &AuthorizationServer,
    parameters: &CallbackParameters,
    expected_state: &StateCheck,
) -> OauthReturnType<CallbackParameters> {
    if parameters.contains_key("response") {
        return Err(Box::new(OauthClientError::new_type_error(
            "JARM responses must be validated with process_jarm_response",
            None,
        )));
    }

    match parameters.get("iss") {
        Some(iss) => {
            if iss != &issuer.issuer {
                return Err(Box::new(OauthClientError::new_protocol_error(
                    &format!(
                        "unexpected iss parameter value, expected {}, got: {}",
                        issuer.issuer, iss
                    ),
                    None,
                )));
            }
        }
        None => {
            if issuer
                .authorization_response_iss_parameter_supported
                .unwrap_or(false)
            {
                return Err(Box::new(OauthClientError::new_protocol_error(
                    "missing required authorization response parameter iss",
                    None,
                )));
            }
        }
    }

    match (expected_state, parameters.get("state")) {
        (StateCheck::Skip, _) => {}
        (StateCheck::ExpectNone, None) => {}
        (StateCheck::ExpectNone, Some(_)) => {
            return Err(Box::new(OauthClientError::new_protocol_error(
                "unexpected authorization response parameter state",
                None,
            )))
        }
        (StateCheck::Value(expected), Some(state)) => {
            if !constant_time_eq(state, expected) {
                return Err(Box::new(OauthClientError::new_protocol_error(
                    "unexpected state parameter value received",
                    None,
                )));
            }
        }
        (StateCheck::Value(_), None) => {
            return Err(Box::new(OauthClientError::new_protocol_error(
                "missing required authorization response parameter state",
                None,
            )))
        }
    }

    if let Some(error) = parameters.get("error") {
        if !error.is_empty() {
            return Err(Box::new(OauthClientError::new_op_error(
                error.clone(),
                parameters.get("error_description").cloned(),
                parameters.get("error_uri").cloned(),
                None,
            )));
        }
    }

    if parameters.contains_key("id_token") || parameters.contains_key("token") {
        return Err(Box::new(OauthClientError::new_unsupported_operation(
            "implicit and hybrid flows are not supported",
            None,
        )));
    }

    Ok(parameters.clone())
}

/// Validates a JARM authorization response: verifies the JWS in the
/// `response` parameter, requires `iss`, `aud` and `exp`, then carries
/// the string claims (audience excluded) into the plain authorization
/// response validation.
pub async fn process_jarm_response<T>(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    url: &Url,
    expected_state: &StateCheck,
    http_client: &T,
) -> OauthReturnType<CallbackParameters>
where
    T: OauthHttpClient,
{
    let response_jwt = url
        .query_pairs()
        .find(|(name, _)| name == "response")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| {
            Box::new(OauthClientError::new_protocol_error(
                "missing required authorization response parameter response",
                None,
            ))
        })?;

    let accepted = accepted_algs(
        client.authorization_signed_response_alg.as_ref(),
        issuer.authorization_signing_alg_values_supported.as_ref(),
    );

    let parsed = validate_signed_jwt(&response_jwt, &accepted, None, issuer, http_client).await?;

    let mut checks = ClaimChecks::new(
        &["iss", "aud", "exp"],
        AudienceCheck::Required(&client.client_id),
    );
    checks.issuer = IssuerCheck::Required(&issuer.issuer);

    validate_jwt_claims(&parsed, &checks)?;

    let mut parameters = CallbackParameters::new();
    for (name, value) in &parsed.claims {
        if name == "aud" {
            continue;
        }
        if let Value::String(value) = value {
            parameters.insert(name.clone(), value.clone());
        }
    }

    validate_auth_response(issuer, &parameters, expected_state)
}
