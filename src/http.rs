//! HTTP capability consumed by the crate.
//!
//! The transport itself is not part of this library: callers hand every
//! builder output to an [`OauthHttpClient`] implementation of their choice
//! and feed the resulting [`HttpResponse`] into the matching response
//! processor. [`transmit`] is the thin glue used by the convenience
//! functions; it also pipes every response through the DPoP nonce recorder.

use std::collections::HashMap;
use std::future::Future;

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::dpop::record_dpop_nonce;
use crate::helpers::parse_www_authenticate_challenges;
use crate::types::{OauthClientError, OauthReturnType};

/// The HTTP methods used by the protocol endpoints and by protected
/// resource requests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET
    #[default]
    GET,
    /// POST
    POST,
    /// PUT
    PUT,
    /// PATCH
    PATCH,
    /// DELETE
    DELETE,
    /// HEAD
    HEAD,
    /// OPTIONS
    OPTIONS,
}

impl HttpMethod {
    /// Uppercase method name, as used for the DPoP `htm` claim.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
        }
    }
}

/// What the response to a request must look like before the body is
/// handed to a response processor.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HttpResponseExpectations {
    pub body: bool,
    pub bearer: bool,
    pub json_body: bool,
    /// `None` passes any status through to the caller (protected resource
    /// requests).
    pub status_code: Option<u16>,
}

/// A fully built request to an authorization server endpoint or a
/// protected resource, ready for an [`OauthHttpClient`]. Transports must
/// never follow redirects on these requests.
#[derive(Debug)]
pub struct HttpRequest {
    /// Absolute request URL, query included.
    pub url: Url,
    /// Request method.
    pub method: HttpMethod,
    /// Request headers. Multi-valued headers keep their order.
    pub headers: HashMap<String, Vec<String>>,
    /// Body, already encoded (form or JSON).
    pub body: Option<String>,
    pub(crate) expectations: HttpResponseExpectations,
}

impl HttpRequest {
    pub(crate) fn new(url: Url) -> Self {
        Self {
            url,
            method: HttpMethod::GET,
            headers: HashMap::new(),
            body: None,
            expectations: HttpResponseExpectations {
                body: true,
                bearer: false,
                json_body: true,
                status_code: Some(200),
            },
        }
    }

    pub(crate) fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub(crate) fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        self.headers.entry(name).or_default().push(value);
        self
    }

    pub(crate) fn header_replace(mut self, name: impl Into<String>, value: Vec<String>) -> Self {
        self.headers.insert(name.into(), value);
        self
    }

    pub(crate) fn form(self, form: String) -> Self {
        self.header_replace(
            "content-type",
            vec!["application/x-www-form-urlencoded".to_string()],
        )
        .body(form)
    }

    pub(crate) fn body(mut self, body: String) -> Self {
        self.headers.insert(
            "content-length".to_string(),
            vec![body.len().to_string()],
        );
        self.body = Some(body);
        self
    }

    pub(crate) fn expect_body(mut self, expect: bool) -> Self {
        self.expectations.body = expect;
        self
    }

    pub(crate) fn expect_status_code(mut self, code: u16) -> Self {
        self.expectations.status_code = Some(code);
        self
    }

    pub(crate) fn expect_any_status(mut self) -> Self {
        self.expectations.status_code = None;
        self
    }

    pub(crate) fn expect_json_body(mut self, expect: bool) -> Self {
        self.expectations.json_body = expect;
        self
    }

    pub(crate) fn expect_bearer(mut self, bearer: bool) -> Self {
        self.expectations.bearer = bearer;
        self
    }
}

/// A response received from the transport.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// `content-type` header, if any.
    pub content_type: Option<String>,
    /// `www-authenticate` header, if any.
    pub www_authenticate: Option<String>,
    /// `dpop-nonce` header, if any.
    pub dpop_nonce: Option<String>,
    /// Body, when the response carried one.
    pub body: Option<String>,
}

/// The transport capability. Implement this for whatever HTTP stack the
/// application uses; a `reqwest` backed [`crate::DefaultHttpClient`] ships
/// behind the `reqwest` cargo feature.
pub trait OauthHttpClient {
    /// Performs `req` and resolves with the raw response, or with a
    /// transport level error message.
    fn request(
        &self,
        req: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, String>> + Send;
}

/// Sends `req`, records any `DPoP-Nonce` the server replied with, and
/// enforces the request's response expectations.
///
/// Every convenience function in this crate routes through here, which is
/// what guarantees the DPoP nonce self-correction described in
/// [`crate::dpop`]: callers retry a `use_dpop_nonce` rejection by simply
/// reissuing the request.
pub async fn transmit<T>(req: HttpRequest, http_client: &T) -> OauthReturnType<HttpResponse>
where
    T: OauthHttpClient,
{
    let url = req.url.clone();
    let expectations = req.expectations;

    debug!(url = %url, method = req.method.as_str(), "dispatching request");

    let response = match http_client.request(req).await {
        Ok(res) => res,
        Err(msg) => {
            return Err(Box::new(OauthClientError::new_protocol_error(
                &format!("error while sending the request: {}", msg),
                None,
            )))
        }
    };

    record_dpop_nonce(&url, &response);

    process_response(response, &expectations)
}

fn process_response(
    response: HttpResponse,
    expectations: &HttpResponseExpectations,
) -> OauthReturnType<HttpResponse> {
    let expected_status = match expectations.status_code {
        Some(expected) => expected,
        None => return Ok(response),
    };

    if response.status_code != expected_status {
        if (400..500).contains(&response.status_code) {
            if let Some((error, error_description, error_uri)) = extract_body_error(&response) {
                return Err(Box::new(OauthClientError::new_op_error(
                    error,
                    error_description,
                    error_uri,
                    Some(response),
                )));
            }

            if expectations.bearer {
                if let Some(www) = response.www_authenticate.clone() {
                    return Err(www_authenticate_error(&www, response));
                }
            }
        }

        let message = format!("expected {}, got: {}", expected_status, response.status_code);
        return Err(Box::new(OauthClientError::new_op_error(
            "server_error".to_string(),
            Some(message),
            None,
            Some(response),
        )));
    }

    if expectations.body && response.body.is_none() {
        let message = format!(
            "expected {} with body but no body was returned",
            expected_status
        );
        return Err(Box::new(OauthClientError::new_op_error(
            "server_error".to_string(),
            Some(message),
            None,
            Some(response),
        )));
    }

    if expectations.json_body {
        if let Some(body) = &response.body {
            if serde_json::from_str::<Value>(body).is_err() {
                return Err(Box::new(OauthClientError::new_type_error(
                    "unexpected body type",
                    Some(response),
                )));
            }
        }
    }

    Ok(response)
}

/// Extracts the OAuth error triple from a JSON error body. `error` must be
/// a non-empty string; non-string `error_description`/`error_uri` are
/// dropped rather than failing the extraction.
pub(crate) fn extract_body_error(
    response: &HttpResponse,
) -> Option<(String, Option<String>, Option<String>)> {
    let body = response.body.as_ref()?;
    let json: Value = serde_json::from_str(body).ok()?;
    let object = json.as_object()?;

    let error = match object.get("error") {
        Some(Value::String(e)) if !e.is_empty() => e.clone(),
        _ => return None,
    };

    let error_description = match object.get("error_description") {
        Some(Value::String(d)) => Some(d.clone()),
        _ => None,
    };

    let error_uri = match object.get("error_uri") {
        Some(Value::String(u)) => Some(u.clone()),
        _ => None,
    };

    Some((error, error_description, error_uri))
}

fn www_authenticate_error(header_value: &str, response: HttpResponse) -> Box<OauthClientError> {
    for challenge in parse_www_authenticate_challenges(header_value) {
        if let Some(error) = challenge.parameters.get("error") {
            return Box::new(OauthClientError::new_op_error(
                error.clone(),
                challenge.parameters.get("error_description").cloned(),
                challenge.parameters.get("error_uri").cloned(),
                Some(response),
            ));
        }
    }

    Box::new(OauthClientError::new_protocol_error(
        "www authenticate error",
        Some(response),
    ))
}
