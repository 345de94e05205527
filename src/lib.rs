//! A stateless OAuth 2.0 / OpenID Connect 1.0 relying-party client core.
//!
//! The crate exposes pure functions over [`AuthorizationServer`] and
//! [`ClientMetadata`]: request builders produce an [`HttpRequest`] with
//! client authentication and DPoP applied, response processors validate
//! the [`HttpResponse`] your transport produced. The transport itself is
//! a capability — implement [`OauthHttpClient`] for your HTTP stack, or
//! use the `reqwest` backed [`DefaultHttpClient`] shipped behind the
//! `reqwest` cargo feature.
//!
//! OAuth protocol errors the server returns are surfaced as the
//! [`OauthClientError::OpError`] variant and detected with
//! [`OauthClientError::is_oauth2_error`]; everything else the error enum
//! raises is a failure of the request or of response validation.
//!
//! Implicit and hybrid flows, symmetric response signatures and response
//! decryption are deliberately unsupported.

mod auth;
mod dpop;
mod endpoints;
mod helpers;
mod http;
#[cfg(feature = "reqwest")]
mod http_client;
mod jose;
mod jwks;
mod jwt;
#[cfg(test)]
mod tests;
mod types;

pub use josekit::jwk::Jwk;
pub use url::Url;

pub use dpop::{record_dpop_nonce, DPoPOptions};
pub use endpoints::authorization::authorization_request_url;
pub use endpoints::callback::{
    process_jarm_response, validate_auth_response, validate_auth_response_url,
};
pub use endpoints::device::{
    device_authorization, device_authorization_request, process_device_authorization_response,
};
pub use endpoints::discovery::{
    discover, discovery_request, process_discovery_response, DiscoveryAlgorithm,
};
pub use endpoints::introspection::{
    introspect_token, introspection_request, process_introspection_response,
};
pub use endpoints::par::{
    process_pushed_authorization_response, push_authorization_request,
    pushed_authorization_request,
};
pub use endpoints::request_object::{
    issue_request_object, issue_signed_and_encrypted_request_object,
};
pub use endpoints::resource::{fetch_protected_resource, protected_resource_request};
pub use endpoints::revocation::{process_revocation_response, revocation_request, revoke_token};
pub use endpoints::token::{
    authorization_code_grant_request, client_credentials_grant_request,
    device_code_grant_request, get_validated_id_token_claims,
    process_authorization_code_oauth2_response, process_authorization_code_openid_response,
    process_client_credentials_response, process_device_code_response,
    process_refresh_token_response, refresh_token_grant_request,
};
pub use endpoints::userinfo::{fetch_userinfo, process_userinfo_response, userinfo_request};
pub use endpoints::RequestOptions;
pub use helpers::{
    calculate_pkce_code_challenge, generate_random, generate_random_code_verifier,
    generate_random_nonce, generate_random_state, parse_www_authenticate_challenges,
};
pub use http::{transmit, HttpMethod, HttpRequest, HttpResponse, OauthHttpClient};
#[cfg(feature = "reqwest")]
pub use http_client::DefaultHttpClient;
pub use jose::{CustomJwk, SUPPORTED_JWE_ALGS, SUPPORTED_JWE_ENCS, SUPPORTED_JWS_ALGS};
pub use jwks::{jwks_request, process_jwks_response, JsonWebKeySet};
pub use types::{
    AuthorizationParameters, AuthorizationServer, CallbackParameters, ClientMetadata,
    DeviceAuthorizationResponse, IntrospectionResponse, MaxAgeCheck, NonceCheck, OauthBodyError,
    OauthClientError, OauthReturnType, ParResponse, StandardError, StateCheck, SubjectCheck,
    TokenEndpointResponse, UserInfoResponse, WwwAuthenticateChallenge,
};
