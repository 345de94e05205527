//! Token introspection (RFC 7662), JSON and signed-JWT response variants.

use serde_json::Value;

use crate::http::{transmit, HttpRequest, HttpResponse, OauthHttpClient};
use crate::jwt::{
    accepted_algs, validate_jwt_claims, validate_signed_jwt, AudienceCheck, ClaimChecks,
    IssuerCheck,
};
use crate::types::{
    AuthorizationServer, ClientMetadata, IntrospectionResponse, OauthClientError, OauthReturnType,
};

use super::{authenticated_post, endpoint_url, expect_status, json_object_body, RequestOptions};

const INTROSPECTION_JWT_TYP: &str = "token-introspection+jwt";

/// Builds an introspection request for `token`.
///
/// When the client expects signed responses (or `request_jwt_response` is
/// set) the request negotiates `application/token-introspection+jwt`,
/// plain JSON otherwise.
pub fn introspection_request(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    token: &str,
    token_type_hint: Option<&str>,
    request_jwt_response: Option<bool>,
    options: &RequestOptions<'_>,
) -> OauthReturnType<HttpRequest> {
    if token.is_empty() {
        return Err(Box::new(OauthClientError::new_type_error(
            "token must be a non-empty string",
            None,
        )));
    }

    let url = endpoint_url(&issuer.introspection_endpoint, "introspection_endpoint")?;

    let mut form = vec![("token".to_string(), token.to_string())];
    if let Some(hint) = token_type_hint {
        form.push(("token_type_hint".to_string(), hint.to_string()));
    }

    let signed = request_jwt_response
        .unwrap_or(client.introspection_signed_response_alg.is_some());

    let accept = if signed {
        "application/token-introspection+jwt"
    } else {
        "application/json"
    };

    Ok(
        authenticated_post(issuer, client, url, form, Some(accept), options)?
            .expect_status_code(200),
    )
}

/// Validates an introspection response by its content type: plain JSON,
/// or a signed JWT whose `token_introspection` claim carries the actual
/// body. Either way the final body must contain an `active` boolean.
pub async fn process_introspection_response<T>(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    response: &HttpResponse,
    http_client: &T,
) -> OauthReturnType<IntrospectionResponse>
where
    T: OauthHttpClient,
{
    expect_status(response, 200)?;

    let content_type = response
        .content_type
        .as_deref()
        .unwrap_or("application/json");

    let claims = if content_type.starts_with("application/token-introspection+jwt") {
        let jwt = response.body.as_deref().ok_or_else(|| {
            Box::new(OauthClientError::new_protocol_error(
                "introspection response was empty",
                Some(response.clone()),
            ))
        })?;

        let accepted = accepted_algs(
            client.introspection_signed_response_alg.as_ref(),
            issuer.introspection_signing_alg_values_supported.as_ref(),
        );

        let parsed = validate_signed_jwt(
            jwt,
            &accepted,
            Some(INTROSPECTION_JWT_TYP),
            issuer,
            http_client,
        )
        .await?;

        let mut checks = ClaimChecks::new(
            &["iss", "aud", "iat"],
            AudienceCheck::Required(&client.client_id),
        );
        checks.issuer = IssuerCheck::Required(&issuer.issuer);

        validate_jwt_claims(&parsed, &checks)?;

        match parsed.claims.get("token_introspection") {
            Some(Value::Object(introspection)) => introspection.clone(),
            _ => {
                return Err(Box::new(OauthClientError::new_protocol_error(
                    "JWT token_introspection claim must be a JSON object",
                    Some(response.clone()),
                )))
            }
        }
    } else {
        json_object_body(response)?
    };

    let active = match claims.get("active") {
        Some(Value::Bool(active)) => *active,
        _ => {
            return Err(Box::new(OauthClientError::new_protocol_error(
                "active must be a boolean",
                Some(response.clone()),
            )))
        }
    };

    Ok(IntrospectionResponse { active, claims })
}

/// Introspects `token` and returns the validated claims.
pub async fn introspect_token<T>(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    token: &str,
    token_type_hint: Option<&str>,
    options: &RequestOptions<'_>,
    http_client: &T,
) -> OauthReturnType<IntrospectionResponse>
where
    T: OauthHttpClient,
{
    let request = introspection_request(issuer, client, token, token_type_hint, None, options)?;
    let response = transmit(request, http_client).await?;
    process_introspection_response(issuer, client, &response, http_client).await
}
