//! Request builders and response processors for every authorization
//! server endpoint, plus protected resource requests.
//!
//! Builders return an [`HttpRequest`] with client authentication applied
//! and, when requested, a DPoP proof attached; processors validate the
//! [`crate::http::HttpResponse`] the caller's transport produced. The
//! convenience functions glue both together through
//! [`crate::http::transmit`].

pub(crate) mod authorization;
pub(crate) mod callback;
pub(crate) mod device;
pub(crate) mod discovery;
pub(crate) mod introspection;
pub(crate) mod par;
pub(crate) mod request_object;
pub(crate) mod resource;
pub(crate) mod revocation;
pub(crate) mod token;
pub(crate) mod userinfo;

use josekit::jwk::Jwk;
use url::Url;

use crate::auth::client_authentication;
use crate::dpop::{dpop_proof, DPoPOptions};
use crate::helpers::form_url_encode_pairs;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{AuthorizationServer, ClientMetadata, OauthClientError, OauthReturnType};

/// Per-request options shared by the authenticated endpoint builders.
#[derive(Debug, Default)]
pub struct RequestOptions<'a> {
    /// Private key backing `private_key_jwt` client authentication.
    pub client_private_key: Option<&'a Jwk>,
    /// DPoP key binding; when set, a fresh proof is attached to the
    /// request.
    pub dpop: Option<&'a DPoPOptions>,
}

pub(crate) fn endpoint_url(endpoint: &Option<String>, name: &str) -> OauthReturnType<Url> {
    let value = endpoint.as_ref().ok_or_else(|| {
        Box::new(OauthClientError::new_type_error(
            &format!("{} must be configured on the authorization server", name),
            None,
        ))
    })?;

    Url::parse(value).map_err(|_| {
        Box::new(OauthClientError::new_type_error(
            &format!("{} must be a valid URL", name),
            None,
        ))
    })
}

/// An authenticated POST carrying `form`, the client authentication
/// additions and optionally a DPoP proof.
pub(crate) fn authenticated_post(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    url: Url,
    mut form: Vec<(String, String)>,
    accept: Option<&str>,
    options: &RequestOptions<'_>,
) -> OauthReturnType<HttpRequest> {
    let auth = client_authentication(issuer, client, options.client_private_key)?;
    form.extend(auth.form);

    let mut request = HttpRequest::new(url.clone())
        .method(HttpMethod::POST)
        .form(form_url_encode_pairs(&form));

    if let Some(accept) = accept {
        request = request.header_replace("accept", vec![accept.to_string()]);
    }

    if let Some(authorization) = auth.authorization {
        request = request.header_replace("authorization", vec![authorization]);
    }

    if let Some(dpop) = options.dpop {
        let proof = dpop_proof(dpop, Some(issuer), &HttpMethod::POST, &url, None)?;
        request = request.header_replace("dpop", vec![proof]);
    }

    Ok(request)
}

/// Status precondition shared by all response processors, including the
/// OAuth error body extraction for 4xx responses.
pub(crate) fn expect_status(response: &HttpResponse, expected: u16) -> OauthReturnType<()> {
    if response.status_code == expected {
        return Ok(());
    }

    if (400..500).contains(&response.status_code) {
        if let Some((error, error_description, error_uri)) =
            crate::http::extract_body_error(response)
        {
            return Err(Box::new(OauthClientError::new_op_error(
                error,
                error_description,
                error_uri,
                Some(response.clone()),
            )));
        }
    }

    Err(Box::new(OauthClientError::new_op_error(
        "server_error".to_string(),
        Some(format!(
            "expected {}, got: {}",
            expected, response.status_code
        )),
        None,
        Some(response.clone()),
    )))
}

pub(crate) fn json_object_body(
    response: &HttpResponse,
) -> OauthReturnType<serde_json::Map<String, serde_json::Value>> {
    let body = response.body.as_ref().ok_or_else(|| {
        Box::new(OauthClientError::new_op_error(
            "server_error".to_string(),
            Some("expected a response body".to_string()),
            None,
            Some(response.clone()),
        ))
    })?;

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        _ => Err(Box::new(OauthClientError::new_protocol_error(
            "failed to parse the response body as a JSON object",
            Some(response.clone()),
        ))),
    }
}
