use josekit::{
    jwe::JweEncrypter,
    jwk::Jwk,
    jws::{
        alg::{
            ecdsa::EcdsaJwsAlgorithm, hmac::HmacJwsAlgorithm, rsassa::RsassaJwsAlgorithm,
            rsassa_pss::RsassaPssJwsAlgorithm,
        },
        JwsSigner, JwsVerifier,
    },
};
use serde_json::{json, Value};

use crate::types::{OauthClientError, OauthReturnType};

use super::alg::check_rsa_modulus;

/// Signing, verification and encryption capabilities derived from a JWK's
/// own metadata.
pub trait CustomJwk {
    /// Whether the JWK carries private key material.
    fn is_private_key(&self) -> bool;

    /// A signer for the given JWS algorithm.
    fn to_signer(&self, alg: &str) -> OauthReturnType<Box<dyn JwsSigner>>;

    /// A verifier for the given JWS algorithm.
    fn to_verifier(&self, alg: &str) -> OauthReturnType<Box<dyn JwsVerifier>>;

    /// An encrypter for the given JWE key management algorithm.
    fn to_encrypter(&self, alg: &str) -> OauthReturnType<Box<dyn JweEncrypter>>;

    /// The public projection published in DPoP proof headers: only `kty`,
    /// `crv`, `e`, `n`, `x` and `y` survive.
    fn minimal_public_jwk(&self) -> Value;
}

impl CustomJwk for Jwk {
    fn is_private_key(&self) -> bool {
        self.key_type() == "oct" || self.parameter("d").is_some()
    }

    fn to_signer(&self, alg: &str) -> OauthReturnType<Box<dyn JwsSigner>> {
        check_rsa_modulus(self)?;

        let error =
            |_| OauthClientError::new_protocol_error("error when creating a jws signer", None);

        let signer: Box<dyn JwsSigner> = match alg {
            "HS256" => Box::new(
                HmacJwsAlgorithm::Hs256
                    .signer_from_jwk(self)
                    .map_err(error)?,
            ),
            "HS384" => Box::new(
                HmacJwsAlgorithm::Hs384
                    .signer_from_jwk(self)
                    .map_err(error)?,
            ),
            "HS512" => Box::new(
                HmacJwsAlgorithm::Hs512
                    .signer_from_jwk(self)
                    .map_err(error)?,
            ),
            "RS256" => Box::new(
                RsassaJwsAlgorithm::Rs256
                    .signer_from_jwk(self)
                    .map_err(error)?,
            ),
            "RS384" => Box::new(
                RsassaJwsAlgorithm::Rs384
                    .signer_from_jwk(self)
                    .map_err(error)?,
            ),
            "RS512" => Box::new(
                RsassaJwsAlgorithm::Rs512
                    .signer_from_jwk(self)
                    .map_err(error)?,
            ),
            "PS256" => Box::new(
                RsassaPssJwsAlgorithm::Ps256
                    .signer_from_jwk(self)
                    .map_err(error)?,
            ),
            "PS384" => Box::new(
                RsassaPssJwsAlgorithm::Ps384
                    .signer_from_jwk(self)
                    .map_err(error)?,
            ),
            "PS512" => Box::new(
                RsassaPssJwsAlgorithm::Ps512
                    .signer_from_jwk(self)
                    .map_err(error)?,
            ),
            "ES256" => Box::new(
                EcdsaJwsAlgorithm::Es256
                    .signer_from_jwk(self)
                    .map_err(error)?,
            ),
            "ES384" => Box::new(
                EcdsaJwsAlgorithm::Es384
                    .signer_from_jwk(self)
                    .map_err(error)?,
            ),
            "ES512" => Box::new(
                EcdsaJwsAlgorithm::Es512
                    .signer_from_jwk(self)
                    .map_err(error)?,
            ),
            _ => {
                return Err(Box::new(OauthClientError::new_unsupported_operation(
                    &format!("unsupported JWS algorithm {}", alg),
                    None,
                )))
            }
        };

        Ok(signer)
    }

    fn to_verifier(&self, alg: &str) -> OauthReturnType<Box<dyn JwsVerifier>> {
        check_rsa_modulus(self)?;

        let error =
            |_| OauthClientError::new_protocol_error("error when creating a jws verifier", None);

        let verifier: Box<dyn JwsVerifier> = match alg {
            "RS256" => Box::new(
                RsassaJwsAlgorithm::Rs256
                    .verifier_from_jwk(self)
                    .map_err(error)?,
            ),
            "RS384" => Box::new(
                RsassaJwsAlgorithm::Rs384
                    .verifier_from_jwk(self)
                    .map_err(error)?,
            ),
            "RS512" => Box::new(
                RsassaJwsAlgorithm::Rs512
                    .verifier_from_jwk(self)
                    .map_err(error)?,
            ),
            "PS256" => Box::new(
                RsassaPssJwsAlgorithm::Ps256
                    .verifier_from_jwk(self)
                    .map_err(error)?,
            ),
            "PS384" => Box::new(
                RsassaPssJwsAlgorithm::Ps384
                    .verifier_from_jwk(self)
                    .map_err(error)?,
            ),
            "PS512" => Box::new(
                RsassaPssJwsAlgorithm::Ps512
                    .verifier_from_jwk(self)
                    .map_err(error)?,
            ),
            "ES256" => Box::new(
                EcdsaJwsAlgorithm::Es256
                    .verifier_from_jwk(self)
                    .map_err(error)?,
            ),
            "ES384" => Box::new(
                EcdsaJwsAlgorithm::Es384
                    .verifier_from_jwk(self)
                    .map_err(error)?,
            ),
            "ES512" => Box::new(
                EcdsaJwsAlgorithm::Es512
                    .verifier_from_jwk(self)
                    .map_err(error)?,
            ),
            _ => {
                return Err(Box::new(OauthClientError::new_unsupported_operation(
                    &format!("unsupported JWS verification algorithm {}", alg),
                    None,
                )))
            }
        };

        Ok(verifier)
    }

    fn to_encrypter(&self, alg: &str) -> OauthReturnType<Box<dyn JweEncrypter>> {
        use josekit::jwe::alg::{ecdh_es::EcdhEsJweAlgorithm, rsaes::RsaesJweAlgorithm};

        let error =
            |_| OauthClientError::new_protocol_error("error when creating a jwe encrypter", None);

        let encrypter: Box<dyn JweEncrypter> = match alg {
            "ECDH-ES" => Box::new(
                EcdhEsJweAlgorithm::EcdhEs
                    .encrypter_from_jwk(self)
                    .map_err(error)?,
            ),
            "RSA-OAEP" => Box::new(
                RsaesJweAlgorithm::RsaOaep
                    .encrypter_from_jwk(self)
                    .map_err(error)?,
            ),
            "RSA-OAEP-256" => Box::new(
                RsaesJweAlgorithm::RsaOaep256
                    .encrypter_from_jwk(self)
                    .map_err(error)?,
            ),
            "RSA-OAEP-384" => Box::new(
                RsaesJweAlgorithm::RsaOaep384
                    .encrypter_from_jwk(self)
                    .map_err(error)?,
            ),
            "RSA-OAEP-512" => Box::new(
                RsaesJweAlgorithm::RsaOaep512
                    .encrypter_from_jwk(self)
                    .map_err(error)?,
            ),
            _ => {
                return Err(Box::new(OauthClientError::new_unsupported_operation(
                    &format!("unsupported JWE algorithm {}", alg),
                    None,
                )))
            }
        };

        Ok(encrypter)
    }

    fn minimal_public_jwk(&self) -> Value {
        let mut public = json!({});

        for name in ["kty", "crv", "e", "n", "x", "y"] {
            if let Some(value) = self.parameter(name) {
                public[name] = value.to_owned();
            }
        }

        public
    }
}
