/// The application's registered client identity and its per-response-kind
/// expectations.
///
/// `token_endpoint_auth_method` defaults to `client_secret_basic`. The
/// `client_secret_*` methods require `client_secret`; `private_key_jwt`
/// takes its key per request and, like `none`, must not carry a secret.
#[derive(Debug, Clone, Default)]
pub struct ClientMetadata {
    /// OAuth 2.0 client identifier.
    pub client_id: String,
    /// OAuth 2.0 client secret, when one was issued.
    pub client_secret: Option<String>,
    /// Token endpoint authentication method. One of
    /// `client_secret_basic`, `client_secret_post`, `client_secret_jwt`,
    /// `private_key_jwt`, `none`.
    pub token_endpoint_auth_method: Option<String>,
    /// JWS algorithm for client assertions; resolved from server metadata
    /// when absent.
    pub token_endpoint_auth_signing_alg: Option<String>,
    /// Expected JWS algorithm of ID Tokens issued to this client.
    pub id_token_signed_response_alg: Option<String>,
    /// Expected JWS algorithm of signed userinfo responses. Its presence
    /// also switches the userinfo request to `accept: application/jwt`.
    pub userinfo_signed_response_alg: Option<String>,
    /// Expected JWS algorithm of signed introspection responses. Its
    /// presence switches the introspection request to the signed variant.
    pub introspection_signed_response_alg: Option<String>,
    /// Expected JWS algorithm of JARM authorization responses.
    pub authorization_signed_response_alg: Option<String>,
    /// JWS algorithm used when signing request objects.
    pub request_object_signing_alg: Option<String>,
    /// JWE key management algorithm for encrypted request objects.
    pub request_object_encryption_alg: Option<String>,
    /// JWE content encryption algorithm for encrypted request objects.
    pub request_object_encryption_enc: Option<String>,
    /// Default `max_age` applied to ID Token `auth_time` checks.
    pub default_max_age: Option<u64>,
    /// Whether ID Tokens must carry `auth_time` even without a max age.
    pub require_auth_time: Option<bool>,
}

impl ClientMetadata {
    /// Client metadata with only a `client_id`, everything else default.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    pub(crate) fn auth_method(&self) -> &str {
        self.token_endpoint_auth_method
            .as_deref()
            .unwrap_or("client_secret_basic")
    }
}
