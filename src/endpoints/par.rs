//! Pushed authorization requests (RFC 9126).

use crate::http::{transmit, HttpRequest, HttpResponse, OauthHttpClient};
use crate::types::{
    AuthorizationParameters, AuthorizationServer, ClientMetadata, OauthClientError,
    OauthReturnType, ParResponse,
};

use super::{authenticated_post, endpoint_url, expect_status, json_object_body, RequestOptions};

/// Builds a pushed authorization request carrying `parameters`.
pub fn pushed_authorization_request(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    parameters: &AuthorizationParameters,
    options: &RequestOptions<'_>,
) -> OauthReturnType<HttpRequest> {
    let url = endpoint_url(
        &issuer.pushed_authorization_request_endpoint,
        "pushed_authorization_request_endpoint",
    )?;

    let form = parameters.to_pairs(&client.client_id);

    Ok(
        authenticated_post(issuer, client, url, form, Some("application/json"), options)?
            .expect_status_code(201),
    )
}

/// Validates a pushed authorization response: 201 with a non-empty
/// `request_uri` and a strictly positive `expires_in`.
pub fn process_pushed_authorization_response(
    response: &HttpResponse,
) -> OauthReturnType<ParResponse> {
    expect_status(response, 201)?;

    let body = json_object_body(response)?;

    let request_uri = match body.get("request_uri").and_then(serde_json::Value::as_str) {
        Some(uri) if !uri.is_empty() => uri.to_string(),
        _ => {
            return Err(Box::new(OauthClientError::new_protocol_error(
                "request_uri must be a non-empty string",
                Some(response.clone()),
            )))
        }
    };

    let expires_in = match body.get("expires_in").and_then(serde_json::Value::as_u64) {
        Some(seconds) if seconds > 0 => seconds,
        _ => {
            return Err(Box::new(OauthClientError::new_protocol_error(
                "expires_in must be a positive number",
                Some(response.clone()),
            )))
        }
    };

    Ok(ParResponse {
        request_uri,
        expires_in,
    })
}

/// Pushes `parameters` and returns the validated `request_uri`.
pub async fn push_authorization_request<T>(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    parameters: &AuthorizationParameters,
    options: &RequestOptions<'_>,
    http_client: &T,
) -> OauthReturnType<ParResponse>
where
    T: OauthHttpClient,
{
    let request = pushed_authorization_request(issuer, client, parameters, options)?;
    let response = transmit(request, http_client).await?;
    process_pushed_authorization_response(&response)
}
