//! Public data model: server and client metadata, validation directives,
//! validated response records and the error taxonomy.

mod authorization_parameters;
mod authorization_server;
mod checks;
mod client_metadata;
mod errors;
mod responses;

pub use authorization_parameters::AuthorizationParameters;
pub use authorization_server::AuthorizationServer;
pub use checks::{MaxAgeCheck, NonceCheck, StateCheck, SubjectCheck};
pub use client_metadata::ClientMetadata;
pub use errors::{OauthBodyError, OauthClientError, OauthReturnType, StandardError};
pub use responses::{
    CallbackParameters, DeviceAuthorizationResponse, IntrospectionResponse, ParResponse,
    TokenEndpointResponse, UserInfoResponse, WwwAuthenticateChallenge,
};
