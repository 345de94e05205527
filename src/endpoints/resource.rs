//! Protected resource requests: `Authorization: Bearer` or, with a DPoP
//! key binding, `Authorization: DPoP` plus a proof committing to the
//! access token hash.

use std::collections::HashMap;

use url::Url;

use crate::dpop::{dpop_proof, DPoPOptions};
use crate::http::{transmit, HttpMethod, HttpRequest, HttpResponse, OauthHttpClient};
use crate::types::{OauthClientError, OauthReturnType};

pub(crate) const USER_AGENT: &str = concat!(
    "oauth-rp/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/oauth-rp/oauth-rp)"
);

/// Builds a request to a protected resource. Redirects are not followed;
/// the response, whatever its status, is handed back for the caller to
/// interpret (its `WWW-Authenticate` challenges included).
pub fn protected_resource_request(
    access_token: &str,
    method: HttpMethod,
    url: Url,
    headers: Option<HashMap<String, Vec<String>>>,
    body: Option<String>,
    dpop: Option<&DPoPOptions>,
) -> OauthReturnType<HttpRequest> {
    if access_token.is_empty() {
        return Err(Box::new(OauthClientError::new_type_error(
            "access_token must be a non-empty string",
            None,
        )));
    }

    let mut request = HttpRequest::new(url.clone())
        .method(method.clone())
        .expect_any_status()
        .expect_body(false)
        .expect_json_body(false)
        .expect_bearer(true);

    if let Some(headers) = headers {
        for (name, values) in headers {
            request = request.header_replace(name.to_lowercase(), values);
        }
    }

    request = request.header_replace("user-agent", vec![USER_AGENT.to_string()]);

    match dpop {
        None => {
            request = request.header_replace(
                "authorization",
                vec![format!("Bearer {}", access_token)],
            );
        }
        Some(options) => {
            let proof = dpop_proof(options, None, &method, &url, Some(access_token))?;
            request = request
                .header_replace("authorization", vec![format!("DPoP {}", access_token)])
                .header_replace("dpop", vec![proof]);
        }
    }

    if let Some(body) = body {
        request = request.body(body);
    }

    Ok(request)
}

/// Performs a protected resource request and returns the raw response,
/// after piping it through the DPoP nonce recorder.
pub async fn fetch_protected_resource<T>(
    access_token: &str,
    method: HttpMethod,
    url: Url,
    headers: Option<HashMap<String, Vec<String>>>,
    body: Option<String>,
    dpop: Option<&DPoPOptions>,
    http_client: &T,
) -> OauthReturnType<HttpResponse>
where
    T: OauthHttpClient,
{
    let request = protected_resource_request(access_token, method, url, headers, body, dpop)?;
    transmit(request, http_client).await
}
