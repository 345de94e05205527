//! Device authorization (RFC 8628).

use serde_json::Value;

use crate::http::{transmit, HttpRequest, HttpResponse, OauthHttpClient};
use crate::types::{
    AuthorizationServer, ClientMetadata, DeviceAuthorizationResponse, OauthClientError,
    OauthReturnType,
};

use super::{authenticated_post, endpoint_url, expect_status, json_object_body, RequestOptions};

/// Builds a device authorization request.
pub fn device_authorization_request(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    scope: Option<&str>,
    options: &RequestOptions<'_>,
) -> OauthReturnType<HttpRequest> {
    let url = endpoint_url(
        &issuer.device_authorization_endpoint,
        "device_authorization_endpoint",
    )?;

    let mut form = vec![];
    if let Some(scope) = scope {
        form.push(("scope".to_string(), scope.to_string()));
    }

    Ok(
        authenticated_post(issuer, client, url, form, Some("application/json"), options)?
            .expect_status_code(200),
    )
}

/// Validates a device authorization response: the code fields must be
/// non-empty strings, the numeric fields strictly positive.
pub fn process_device_authorization_response(
    response: &HttpResponse,
) -> OauthReturnType<DeviceAuthorizationResponse> {
    expect_status(response, 200)?;

    let body = json_object_body(response)?;

    let string_member = |name: &str| -> OauthReturnType<String> {
        match body.get(name).and_then(Value::as_str) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(Box::new(OauthClientError::new_protocol_error(
                &format!("{} must be a non-empty string", name),
                Some(response.clone()),
            ))),
        }
    };

    let device_code = string_member("device_code")?;
    let user_code = string_member("user_code")?;
    let verification_uri = string_member("verification_uri")?;

    let verification_uri_complete = match body.get("verification_uri_complete") {
        None => None,
        Some(Value::String(uri)) if !uri.is_empty() => Some(uri.clone()),
        _ => {
            return Err(Box::new(OauthClientError::new_protocol_error(
                "verification_uri_complete must be a non-empty string",
                Some(response.clone()),
            )))
        }
    };

    let expires_in = match body.get("expires_in").and_then(Value::as_u64) {
        Some(seconds) if seconds > 0 => seconds,
        _ => {
            return Err(Box::new(OauthClientError::new_protocol_error(
                "expires_in must be a positive number",
                Some(response.clone()),
            )))
        }
    };

    let interval = match body.get("interval") {
        None => None,
        Some(value) => match value.as_u64() {
            Some(seconds) if seconds > 0 => Some(seconds),
            _ => {
                return Err(Box::new(OauthClientError::new_protocol_error(
                    "interval must be a positive number",
                    Some(response.clone()),
                )))
            }
        },
    };

    Ok(DeviceAuthorizationResponse {
        device_code,
        user_code,
        verification_uri,
        verification_uri_complete,
        expires_in,
        interval,
    })
}

/// Starts a device authorization and returns the validated codes.
pub async fn device_authorization<T>(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    scope: Option<&str>,
    options: &RequestOptions<'_>,
    http_client: &T,
) -> OauthReturnType<DeviceAuthorizationResponse>
where
    T: OauthHttpClient,
{
    let request = device_authorization_request(issuer, client, scope, options)?;
    let response = transmit(request, http_client).await?;
    process_device_authorization_response(&response)
}
