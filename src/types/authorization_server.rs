use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// Authorization server metadata, as discovered from its well-known
/// endpoint (RFC 8414 / OIDC Discovery 1.0).
///
/// Only `issuer` is required; the presence of an endpoint gates the
/// corresponding operation. Constructed once per server by
/// [`crate::discovery_request`] processing and treated as immutable
/// afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizationServer {
    /// Issuer identifier URL. Matched byte for byte (after URL
    /// normalization) against the issuer the caller expected to discover.
    pub issuer: String,
    /// OAuth 2.0 authorization endpoint.
    pub authorization_endpoint: Option<String>,
    /// OAuth 2.0 token endpoint.
    pub token_endpoint: Option<String>,
    /// JWK Set document URL.
    pub jwks_uri: Option<String>,
    /// OIDC userinfo endpoint.
    pub userinfo_endpoint: Option<String>,
    /// RFC 7009 revocation endpoint.
    pub revocation_endpoint: Option<String>,
    /// RFC 7662 introspection endpoint.
    pub introspection_endpoint: Option<String>,
    /// RFC 8628 device authorization endpoint.
    pub device_authorization_endpoint: Option<String>,
    /// RFC 9126 pushed authorization request endpoint.
    pub pushed_authorization_request_endpoint: Option<String>,
    /// JWS algorithms the server may sign ID Tokens with.
    pub id_token_signing_alg_values_supported: Option<Vec<String>>,
    /// JWS algorithms the server may sign userinfo responses with.
    pub userinfo_signing_alg_values_supported: Option<Vec<String>>,
    /// JWS algorithms the server may sign introspection responses with.
    pub introspection_signing_alg_values_supported: Option<Vec<String>>,
    /// JWS algorithms the server may sign JARM responses with.
    pub authorization_signing_alg_values_supported: Option<Vec<String>>,
    /// JWS algorithms accepted for client assertions at the token
    /// endpoint.
    pub token_endpoint_auth_signing_alg_values_supported: Option<Vec<String>>,
    /// JWS algorithms accepted for DPoP proofs.
    pub dpop_signing_alg_values_supported: Option<Vec<String>>,
    /// JWS algorithms accepted for request objects.
    pub request_object_signing_alg_values_supported: Option<Vec<String>>,
    /// RFC 9207: the server returns `iss` in authorization responses.
    pub authorization_response_iss_parameter_supported: Option<bool>,
    /// Any metadata this crate does not consume directly.
    #[serde(flatten)]
    pub other_fields: HashMap<String, Value>,
}

impl AuthorizationServer {
    /// Minimal metadata for a known issuer, useful when the server does
    /// not publish a discovery document.
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            ..Default::default()
        }
    }
}
