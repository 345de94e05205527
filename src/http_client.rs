//! Default `reqwest` backed transport, available behind the `reqwest`
//! cargo feature.

use std::time::Duration;

use reqwest::{
    header::{CONTENT_TYPE, WWW_AUTHENTICATE},
    ClientBuilder, Method, Response,
};

use crate::endpoints::resource::USER_AGENT;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, OauthHttpClient};

/// The default HTTP client. Redirects are never followed and connections
/// time out after ten seconds.
pub struct DefaultHttpClient;

impl DefaultHttpClient {
    async fn to_response(response: Response) -> HttpResponse {
        let status_code = response.status().as_u16();
        let headers = response.headers().clone();

        let header_string = |name| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        let content_type = header_string(CONTENT_TYPE.as_str());
        let www_authenticate = header_string(WWW_AUTHENTICATE.as_str());
        let dpop_nonce = header_string("dpop-nonce");

        let body = match response.text().await {
            Ok(text) if !text.is_empty() => Some(text),
            _ => None,
        };

        HttpResponse {
            status_code,
            content_type,
            www_authenticate,
            dpop_nonce,
            body,
        }
    }
}

impl OauthHttpClient for DefaultHttpClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, String> {
        let client = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| format!("{e}"))?;

        let method = match req.method {
            HttpMethod::GET => Method::GET,
            HttpMethod::POST => Method::POST,
            HttpMethod::PUT => Method::PUT,
            HttpMethod::PATCH => Method::PATCH,
            HttpMethod::DELETE => Method::DELETE,
            HttpMethod::HEAD => Method::HEAD,
            HttpMethod::OPTIONS => Method::OPTIONS,
        };

        let mut builder = client.request(method, req.url);

        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let mut has_user_agent = false;

        for (name, values) in req.headers {
            if name.eq_ignore_ascii_case("user-agent") {
                has_user_agent = true;
            }
            for value in values {
                builder = builder.header(name.clone(), value);
            }
        }

        if !has_user_agent {
            builder = builder.header("user-agent", USER_AGENT);
        }

        match builder.send().await {
            Ok(response) => Ok(Self::to_response(response).await),
            Err(e) => Err(format!("{e}")),
        }
    }
}
