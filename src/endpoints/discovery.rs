//! Authorization server metadata discovery (OIDC Discovery 1.0 and
//! RFC 8414).

use url::Url;

use crate::http::{transmit, HttpMethod, HttpRequest, HttpResponse, OauthHttpClient};
use crate::types::{AuthorizationServer, OauthClientError, OauthReturnType};

use super::expect_status;

/// Which well-known URL derivation to use for discovery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiscoveryAlgorithm {
    /// OIDC Discovery 1.0: `/.well-known/openid-configuration` appended
    /// to the issuer pathname.
    #[default]
    Oidc,
    /// RFC 8414: `/.well-known/oauth-authorization-server` prefixed to
    /// the issuer pathname.
    Oauth2,
}

/// Builds the metadata request for `expected_issuer`.
pub fn discovery_request(
    expected_issuer: &Url,
    algorithm: DiscoveryAlgorithm,
) -> OauthReturnType<HttpRequest> {
    let mut url = expected_issuer.clone();

    match algorithm {
        DiscoveryAlgorithm::Oidc => {
            let path = format!("{}/.well-known/openid-configuration", url.path())
                .replace("//", "/");
            url.set_path(&path);
        }
        DiscoveryAlgorithm::Oauth2 => {
            if url.path() == "/" {
                url.set_path("/.well-known/oauth-authorization-server");
            } else {
                let path = format!("/.well-known/oauth-authorization-server{}", url.path());
                url.set_path(&path);
            }
        }
    }

    Ok(HttpRequest::new(url)
        .method(HttpMethod::GET)
        .header("accept", "application/json")
        .expect_status_code(200))
}

/// Validates a discovery response: 200, a JSON object, and an `issuer`
/// equal to the expected issuer URL (href comparison).
pub fn process_discovery_response(
    expected_issuer: &Url,
    response: &HttpResponse,
) -> OauthReturnType<AuthorizationServer> {
    expect_status(response, 200)?;

    let body = super::json_object_body(response)?;

    let issuer = match body.get("issuer").and_then(serde_json::Value::as_str) {
        Some(issuer) if !issuer.is_empty() => issuer.to_string(),
        _ => {
            return Err(Box::new(OauthClientError::new_protocol_error(
                "authorization server metadata does not contain a valid issuer",
                Some(response.clone()),
            )))
        }
    };

    let discovered = Url::parse(&issuer).map_err(|_| {
        Box::new(OauthClientError::new_protocol_error(
            "authorization server metadata does not contain a valid issuer",
            Some(response.clone()),
        ))
    })?;

    if discovered.as_str() != expected_issuer.as_str() {
        return Err(Box::new(OauthClientError::new_protocol_error(
            &format!(
                "unexpected issuer value, expected {}, got: {}",
                expected_issuer, discovered
            ),
            Some(response.clone()),
        )));
    }

    serde_json::from_value(serde_json::Value::Object(body)).map_err(|_| {
        Box::new(OauthClientError::new_protocol_error(
            "failed to parse the authorization server metadata",
            Some(response.clone()),
        ))
    })
}

/// Discovers the metadata of `expected_issuer`.
pub async fn discover<T>(
    expected_issuer: &Url,
    algorithm: DiscoveryAlgorithm,
    http_client: &T,
) -> OauthReturnType<AuthorizationServer>
where
    T: OauthHttpClient,
{
    let request = discovery_request(expected_issuer, algorithm)?;
    let response = transmit(request, http_client).await?;
    process_discovery_response(expected_issuer, &response)
}
