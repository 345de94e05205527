//! Token revocation (RFC 7009).

use crate::http::{transmit, HttpRequest, HttpResponse, OauthHttpClient};
use crate::types::{AuthorizationServer, ClientMetadata, OauthClientError, OauthReturnType};

use super::{authenticated_post, endpoint_url, expect_status, RequestOptions};

/// Builds a revocation request for `token`.
pub fn revocation_request(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    token: &str,
    token_type_hint: Option<&str>,
    options: &RequestOptions<'_>,
) -> OauthReturnType<HttpRequest> {
    if token.is_empty() {
        return Err(Box::new(OauthClientError::new_type_error(
            "token must be a non-empty string",
            None,
        )));
    }

    let url = endpoint_url(&issuer.revocation_endpoint, "revocation_endpoint")?;

    let mut form = vec![("token".to_string(), token.to_string())];
    if let Some(hint) = token_type_hint {
        form.push(("token_type_hint".to_string(), hint.to_string()));
    }

    Ok(authenticated_post(issuer, client, url, form, None, options)?
        .expect_status_code(200)
        .expect_body(false)
        .expect_json_body(false))
}

/// Validates a revocation response; a 200 means the token is gone.
pub fn process_revocation_response(response: &HttpResponse) -> OauthReturnType<()> {
    expect_status(response, 200)
}

/// Revokes `token`.
pub async fn revoke_token<T>(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    token: &str,
    token_type_hint: Option<&str>,
    options: &RequestOptions<'_>,
    http_client: &T,
) -> OauthReturnType<()>
where
    T: OauthHttpClient,
{
    let request = revocation_request(issuer, client, token, token_type_hint, options)?;
    let response = transmit(request, http_client).await?;
    process_revocation_response(&response)
}
