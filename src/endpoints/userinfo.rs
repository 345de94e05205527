//! The OIDC userinfo endpoint, JSON and signed-JWT response variants.

use serde_json::Value;

use crate::dpop::{dpop_proof, DPoPOptions};
use crate::http::{transmit, HttpMethod, HttpRequest, HttpResponse, OauthHttpClient};
use crate::jwt::{
    accepted_algs, validate_jwt_claims, validate_signed_jwt, AudienceCheck, ClaimChecks,
    IssuerCheck,
};
use crate::types::{
    AuthorizationServer, ClientMetadata, OauthClientError, OauthReturnType, SubjectCheck,
    UserInfoResponse,
};

use super::{endpoint_url, expect_status, json_object_body, resource::USER_AGENT};

/// Builds a userinfo request authorized by `access_token`. The request
/// negotiates `application/jwt` when the client expects signed responses.
pub fn userinfo_request(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    access_token: &str,
    dpop: Option<&DPoPOptions>,
) -> OauthReturnType<HttpRequest> {
    if access_token.is_empty() {
        return Err(Box::new(OauthClientError::new_type_error(
            "access_token must be a non-empty string",
            None,
        )));
    }

    let url = endpoint_url(&issuer.userinfo_endpoint, "userinfo_endpoint")?;

    let accept = if client.userinfo_signed_response_alg.is_some() {
        "application/jwt"
    } else {
        "application/json"
    };

    let mut request = HttpRequest::new(url.clone())
        .method(HttpMethod::GET)
        .header("accept", accept)
        .header("user-agent", USER_AGENT)
        .expect_status_code(200)
        .expect_json_body(false)
        .expect_bearer(true);

    match dpop {
        None => {
            request = request.header_replace(
                "authorization",
                vec![format!("Bearer {}", access_token)],
            );
        }
        Some(options) => {
            let proof = dpop_proof(
                options,
                Some(issuer),
                &HttpMethod::GET,
                &url,
                Some(access_token),
            )?;
            request = request
                .header_replace("authorization", vec![format!("DPoP {}", access_token)])
                .header_replace("dpop", vec![proof]);
        }
    }

    Ok(request)
}

/// Validates a userinfo response. The final claim set must carry a
/// non-empty `sub`, compared against `expected_subject` unless the caller
/// explicitly skips that check.
pub async fn process_userinfo_response<T>(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    expected_subject: &SubjectCheck,
    response: &HttpResponse,
    http_client: &T,
) -> OauthReturnType<UserInfoResponse>
where
    T: OauthHttpClient,
{
    expect_status(response, 200)?;

    let content_type = response
        .content_type
        .as_deref()
        .unwrap_or("application/json");

    let claims = if content_type.starts_with("application/jwt") {
        let jwt = response.body.as_deref().ok_or_else(|| {
            Box::new(OauthClientError::new_protocol_error(
                "userinfo response was empty",
                Some(response.clone()),
            ))
        })?;

        let accepted = accepted_algs(
            client.userinfo_signed_response_alg.as_ref(),
            issuer.userinfo_signing_alg_values_supported.as_ref(),
        );

        let parsed = validate_signed_jwt(jwt, &accepted, None, issuer, http_client).await?;

        let mut checks = ClaimChecks::new(&[], AudienceCheck::Optional(&client.client_id));
        checks.issuer = IssuerCheck::Optional(&issuer.issuer);

        validate_jwt_claims(&parsed, &checks)?;

        parsed.claims
    } else {
        json_object_body(response)?
    };

    let sub = match claims.get("sub").and_then(Value::as_str) {
        Some(sub) if !sub.is_empty() => sub.to_string(),
        _ => {
            return Err(Box::new(OauthClientError::new_protocol_error(
                "sub must be a non-empty string",
                Some(response.clone()),
            )))
        }
    };

    match expected_subject {
        SubjectCheck::Skip => {}
        SubjectCheck::Value(expected) => {
            if &sub != expected {
                return Err(Box::new(OauthClientError::new_protocol_error(
                    &format!("unexpected sub value, expected {}, got: {}", expected, sub),
                    Some(response.clone()),
                )));
            }
        }
    }

    Ok(UserInfoResponse { sub, claims })
}

/// Fetches and validates the userinfo claims for `access_token`.
pub async fn fetch_userinfo<T>(
    issuer: &AuthorizationServer,
    client: &ClientMetadata,
    access_token: &str,
    expected_subject: &SubjectCheck,
    dpop: Option<&DPoPOptions>,
    http_client: &T,
) -> OauthReturnType<UserInfoResponse>
where
    T: OauthHttpClient,
{
    let request = userinfo_request(issuer, client, access_token, dpop)?;
    let response = transmit(request, http_client).await?;
    process_userinfo_response(issuer, client, expected_subject, &response, http_client).await
}
