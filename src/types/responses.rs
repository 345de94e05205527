use std::collections::HashMap;

use serde_json::{Map, Value};

/// Normalized token endpoint response. `token_type` is lowercased; when
/// an ID Token was present the validated claims travel with the record
/// and are surfaced through
/// [`crate::get_validated_id_token_claims`].
#[derive(Debug, Clone)]
pub struct TokenEndpointResponse {
    /// The issued access token.
    pub access_token: String,
    /// Lowercased token type, e.g. `bearer` or `dpop`.
    pub token_type: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: Option<u64>,
    /// The issued refresh token, when one was returned.
    pub refresh_token: Option<String>,
    /// Granted scope, when the server echoed or narrowed it.
    pub scope: Option<String>,
    /// The raw ID Token, when one was returned.
    pub id_token: Option<String>,
    /// Response members this crate does not consume directly.
    pub other: HashMap<String, Value>,
    pub(crate) id_token_claims: Option<Map<String, Value>>,
}

/// Validated RFC 9126 pushed authorization request response.
#[derive(Debug, Clone)]
pub struct ParResponse {
    /// The one-time `request_uri` to send the user agent with.
    pub request_uri: String,
    /// Seconds the `request_uri` stays usable.
    pub expires_in: u64,
}

/// Validated RFC 8628 device authorization response.
#[derive(Debug, Clone)]
pub struct DeviceAuthorizationResponse {
    /// Code the client polls the token endpoint with.
    pub device_code: String,
    /// Code the end user enters at the verification URI.
    pub user_code: String,
    /// Where the end user authorizes the device.
    pub verification_uri: String,
    /// `verification_uri` with the user code embedded, when offered.
    pub verification_uri_complete: Option<String>,
    /// Seconds the codes stay usable.
    pub expires_in: u64,
    /// Minimum polling interval in seconds.
    pub interval: Option<u64>,
}

/// Validated RFC 7662 introspection response; either the plain JSON body
/// or the `token_introspection` claims of the signed variant.
#[derive(Debug, Clone)]
pub struct IntrospectionResponse {
    /// Whether the presented token is currently active.
    pub active: bool,
    /// The full introspection claim set, `active` included.
    pub claims: Map<String, Value>,
}

/// Validated userinfo response; either the plain JSON body or the claims
/// of the signed variant.
#[derive(Debug, Clone)]
pub struct UserInfoResponse {
    /// Subject the claims belong to.
    pub sub: String,
    /// The full userinfo claim set, `sub` included.
    pub claims: Map<String, Value>,
}

/// One challenge from a `WWW-Authenticate` response header. Scheme and
/// parameter names are lowercased, quoted values unquoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WwwAuthenticateChallenge {
    /// Authentication scheme, e.g. `bearer` or `dpop`.
    pub scheme: String,
    /// Challenge parameters.
    pub parameters: HashMap<String, String>,
}

/// Validated authorization response parameters, after state/issuer checks
/// and (for JARM) signature validation.
pub type CallbackParameters = HashMap<String, String>;
