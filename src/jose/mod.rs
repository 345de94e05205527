//! Minimal JOSE engine: compact JWS signing and verification, compact JWE
//! encryption for request objects, and the algorithm / key metadata
//! mapping that backs them.

pub(crate) mod alg;
pub(crate) mod jwe;
pub(crate) mod jwk;
pub(crate) mod jws;

pub use alg::{SUPPORTED_JWE_ALGS, SUPPORTED_JWE_ENCS, SUPPORTED_JWS_ALGS};
pub use jwk::CustomJwk;
