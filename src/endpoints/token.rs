//! Token endpoint grants and their response validators.

use serde_json::{Map, Value};

use crate::http::{HttpRequest, HttpResponse, OauthHttpClient};
use crate::jwt::{
    accepted_algs, validate_jwt_claims, validate_signed_jwt, AudienceCheck, ClaimChecks,
    IssuerCheck,
};
use crate::types::{
    AuthorizationServer, ClientMetadata, MaxAgeCheck, NonceCheck, OauthClientError,
    OauthReturnType, TokenEndpointResponse,
};

use super::{authenticated_post, endpoint_url, expect_status, json_object_body, RequestOptions};

const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Builds an `authorization_code` grant request.
pub fn authorization_code_grant_request(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    code: &str,
    redirect_uri: &str,
    code_verifier: Option<&str>,
    options: &RequestOptions<'_>,
) -> OauthReturnType<HttpRequest> {
    if code.is_empty() {
        return Err(Box::new(OauthClientError::new_type_error(
            "code must be a non-empty string",
            None,
        )));
    }

    let mut form = vec![
        ("grant_type".to_string(), "authorization_code".to_string()),
        ("code".to_string(), code.to_string()),
        ("redirect_uri".to_string(), redirect_uri.to_string()),
    ];

    if let Some(verifier) = code_verifier {
        form.push(("code_verifier".to_string(), verifier.to_string()));
    }

    token_endpoint_request(issuer, client, form, options)
}

/// Builds a `refresh_token` grant request.
pub fn refresh_token_grant_request(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    refresh_token: &str,
    options: &RequestOptions<'_>,
) -> OauthReturnType<HttpRequest> {
    if refresh_token.is_empty() {
        return Err(Box::new(OauthClientError::new_type_error(
            "refresh_token must be a non-empty string",
            None,
        )));
    }

    let form = vec![
        ("grant_type".to_string(), "refresh_token".to_string()),
        ("refresh_token".to_string(), refresh_token.to_string()),
    ];

    token_endpoint_request(issuer, client, form, options)
}

/// Builds a `client_credentials` grant request.
pub fn client_credentials_grant_request(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    scope: Option<&str>,
    options: &RequestOptions<'_>,
) -> OauthReturnType<HttpRequest> {
    let mut form = vec![("grant_type".to_string(), "client_credentials".to_string())];

    if let Some(scope) = scope {
        form.push(("scope".to_string(), scope.to_string()));
    }

    token_endpoint_request(issuer, client, form, options)
}

/// Builds a device code grant request (RFC 8628).
pub fn device_code_grant_request(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    device_code: &str,
    options: &RequestOptions<'_>,
) -> OauthReturnType<HttpRequest> {
    if device_code.is_empty() {
        return Err(Box::new(OauthClientError::new_type_error(
            "device_code must be a non-empty string",
            None,
        )));
    }

    let form = vec![
        ("grant_type".to_string(), DEVICE_CODE_GRANT_TYPE.to_string()),
        ("device_code".to_string(), device_code.to_string()),
    ];

    token_endpoint_request(issuer, client, form, options)
}

fn token_endpoint_request(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    form: Vec<(String, String)>,
    options: &RequestOptions<'_>,
) -> OauthReturnType<HttpRequest> {
    let url = endpoint_url(&issuer.token_endpoint, "token_endpoint")?;

    Ok(
        authenticated_post(issuer, client, url, form, Some("application/json"), options)?
            .expect_status_code(200),
    )
}

struct IdTokenPolicy<'a> {
    required: bool,
    forbidden: bool,
    ignored: bool,
    nonce: &'a NonceCheck,
    max_age: MaxAgeCheck,
}

/// Validates an authorization code grant response in OIDC mode: the ID
/// Token is required and its `nonce` and `auth_time` are enforced.
///
/// `max_age` falls back to the client's `default_max_age`; pass
/// [`MaxAgeCheck::Skip`] to disable the elapsed-time bound explicitly.
pub async fn process_authorization_code_openid_response<T>(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    response: &HttpResponse,
    expected_nonce: &NonceCheck,
    max_age: Option<MaxAgeCheck>,
    http_client: &T,
) -> OauthReturnType<TokenEndpointResponse>
where
    T: OauthHttpClient,
{
    let max_age = max_age.unwrap_or_else(|| default_max_age(client));

    process_token_response(
        issuer,
        client,
        response,
        IdTokenPolicy {
            required: true,
            forbidden: false,
            ignored: false,
            nonce: expected_nonce,
            max_age,
        },
        http_client,
    )
    .await
}

/// Validates an authorization code grant response in plain OAuth 2.0
/// mode: a response carrying an `id_token` fails, the caller used the
/// wrong mode.
pub async fn process_authorization_code_oauth2_response<T>(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    response: &HttpResponse,
    http_client: &T,
) -> OauthReturnType<TokenEndpointResponse>
where
    T: OauthHttpClient,
{
    process_token_response(
        issuer,
        client,
        response,
        IdTokenPolicy {
            required: false,
            forbidden: true,
            ignored: false,
            nonce: &NonceCheck::ExpectNone,
            max_age: MaxAgeCheck::Skip,
        },
        http_client,
    )
    .await
}

/// Validates a refresh token grant response. A refreshed ID Token, when
/// present, goes through the full pipeline.
pub async fn process_refresh_token_response<T>(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    response: &HttpResponse,
    http_client: &T,
) -> OauthReturnType<TokenEndpointResponse>
where
    T: OauthHttpClient,
{
    process_token_response(
        issuer,
        client,
        response,
        IdTokenPolicy {
            required: false,
            forbidden: false,
            ignored: false,
            nonce: &NonceCheck::ExpectNone,
            max_age: MaxAgeCheck::Skip,
        },
        http_client,
    )
    .await
}

/// Validates a device code grant response.
pub async fn process_device_code_response<T>(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    response: &HttpResponse,
    http_client: &T,
) -> OauthReturnType<TokenEndpointResponse>
where
    T: OauthHttpClient,
{
    process_token_response(
        issuer,
        client,
        response,
        IdTokenPolicy {
            required: false,
            forbidden: false,
            ignored: false,
            nonce: &NonceCheck::ExpectNone,
            max_age: MaxAgeCheck::Skip,
        },
        http_client,
    )
    .await
}

/// Validates a client credentials grant response. `id_token` and
/// `refresh_token` members are ignored outright.
pub async fn process_client_credentials_response<T>(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    response: &HttpResponse,
    http_client: &T,
) -> OauthReturnType<TokenEndpointResponse>
where
    T: OauthHttpClient,
{
    process_token_response(
        issuer,
        client,
        response,
        IdTokenPolicy {
            required: false,
            forbidden: false,
            ignored: true,
            nonce: &NonceCheck::ExpectNone,
            max_age: MaxAgeCheck::Skip,
        },
        http_client,
    )
    .await
}

/// The validated ID Token claims that traveled with a token endpoint
/// response, when the response contained one.
pub fn get_validated_id_token_claims(
    response: &TokenEndpointResponse,
) -> Option<&Map<String, Value>> {
    response.id_token_claims.as_ref()
}

fn default_max_age(client: &ClientMetadata) -> MaxAgeCheck {
    match client.default_max_age {
        Some(seconds) => MaxAgeCheck::Value(seconds),
        None => MaxAgeCheck::Skip,
    }
}

async fn process_token_response<T>(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    response: &HttpResponse,
    policy: IdTokenPolicy<'_>,
    http_client: &T,
) -> OauthReturnType<TokenEndpointResponse>
where
    T: OauthHttpClient,
{
    expect_status(response, 200)?;

    let mut body = json_object_body(response)?;

    let access_token = require_string_member(&body, "access_token", response)?;
    let token_type = require_string_member(&body, "token_type", response)?.to_lowercase();

    let expires_in = match body.get("expires_in") {
        None => None,
        Some(value) => match value.as_u64() {
            Some(seconds) if seconds > 0 => Some(seconds),
            _ => {
                return Err(Box::new(OauthClientError::new_protocol_error(
                    "expires_in must be a positive number",
                    Some(response.clone()),
                )))
            }
        },
    };

    let refresh_token = if policy.ignored {
        None
    } else {
        optional_string_member(&body, "refresh_token", response)?
    };

    let scope = optional_string_member(&body, "scope", response)?;
    let id_token = optional_string_member(&body, "id_token", response)?;

    if policy.forbidden && id_token.is_some() {
        return Err(Box::new(OauthClientError::new_protocol_error(
            "ID Token was returned from a plain OAuth 2.0 authorization code grant",
            Some(response.clone()),
        )));
    }

    if policy.required && id_token.is_none() {
        return Err(Box::new(OauthClientError::new_protocol_error(
            "missing required response member id_token",
            Some(response.clone()),
        )));
    }

    let mut id_token_claims = None;

    if !policy.ignored {
        if let Some(jwt) = &id_token {
            let accepted = accepted_algs(
                client.id_token_signed_response_alg.as_ref(),
                issuer.id_token_signing_alg_values_supported.as_ref(),
            );

            let parsed =
                validate_signed_jwt(jwt, &accepted, None, issuer, http_client).await?;

            let mut checks = ClaimChecks::new(
                &["iss", "aud", "sub", "iat", "exp"],
                AudienceCheck::Required(&client.client_id),
            );
            checks.issuer = IssuerCheck::Required(&issuer.issuer);
            checks.nonce = Some(policy.nonce);
            checks.require_auth_time = client.require_auth_time.unwrap_or(false);
            checks.max_age = &policy.max_age;
            checks.at_hash_source = Some(&access_token);

            validate_jwt_claims(&parsed, &checks)?;

            id_token_claims = Some(parsed.claims);
        }
    }

    for consumed in [
        "access_token",
        "token_type",
        "expires_in",
        "refresh_token",
        "scope",
        "id_token",
    ] {
        body.remove(consumed);
    }

    Ok(TokenEndpointResponse {
        access_token,
        token_type,
        expires_in,
        refresh_token,
        scope,
        id_token: if policy.ignored { None } else { id_token },
        other: body.into_iter().collect(),
        id_token_claims,
    })
}

fn require_string_member(
    body: &Map<String, Value>,
    name: &str,
    response: &HttpResponse,
) -> OauthReturnType<String> {
    match body.get(name) {
        Some(Value::String(value)) if !value.is_empty() => Ok(value.clone()),
        _ => Err(Box::new(OauthClientError::new_protocol_error(
            &format!("{} must be a non-empty string", name),
            Some(response.clone()),
        ))),
    }
}

fn optional_string_member(
    body: &Map<String, Value>,
    name: &str,
    response: &HttpResponse,
) -> OauthReturnType<Option<String>> {
    match body.get(name) {
        None => Ok(None),
        Some(Value::String(value)) if !value.is_empty() => Ok(Some(value.clone())),
        _ => Err(Box::new(OauthClientError::new_protocol_error(
            &format!("{} must be a non-empty string", name),
            Some(response.clone()),
        ))),
    }
}
