//! Authorization endpoint URL composition.

use url::Url;

use crate::types::{
    AuthorizationParameters, AuthorizationServer, ClientMetadata, OauthReturnType,
};

use super::endpoint_url;

/// Composes the authorization endpoint URL the user agent is sent to.
/// `response_type=code` is supplied when the parameters name none.
pub fn authorization_request_url(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    parameters: &AuthorizationParameters,
) -> OauthReturnType<Url> {
    let mut url = endpoint_url(&issuer.authorization_endpoint, "authorization_endpoint")?;

    let mut parameters = parameters.clone();
    if parameters.response_type.is_none() {
        parameters.response_type = Some("code".to_string());
    }

    {
        let mut query = url.query_pairs_mut();
        for (name, value) in parameters.to_pairs(&client.client_id) {
            query.append_pair(&name, &value);
        }
    }

    Ok(url)
}
