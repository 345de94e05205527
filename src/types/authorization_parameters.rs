use std::collections::HashMap;

/// Parameters of an authorization request, used to compose authorization
/// endpoint URLs, pushed authorization request bodies and request
/// objects.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationParameters {
    /// `redirect_uri`
    pub redirect_uri: Option<String>,
    /// `response_type`; defaults to `code` where one is required.
    pub response_type: Option<String>,
    /// `scope`
    pub scope: Option<String>,
    /// `state`
    pub state: Option<String>,
    /// `nonce`
    pub nonce: Option<String>,
    /// `code_challenge` (PKCE)
    pub code_challenge: Option<String>,
    /// `code_challenge_method`; `S256` is the only method this crate
    /// produces.
    pub code_challenge_method: Option<String>,
    /// `max_age`
    pub max_age: Option<u64>,
    /// `prompt`
    pub prompt: Option<String>,
    /// `login_hint`
    pub login_hint: Option<String>,
    /// `id_token_hint`
    pub id_token_hint: Option<String>,
    /// `acr_values`
    pub acr_values: Option<String>,
    /// `resource` (RFC 8707)
    pub resource: Option<String>,
    /// `response_mode`, e.g. `jwt` for JARM.
    pub response_mode: Option<String>,
    /// A signed (and possibly encrypted) request object.
    pub request: Option<String>,
    /// A `request_uri`, typically from a pushed authorization request.
    pub request_uri: Option<String>,
    /// Anything else to pass through verbatim.
    pub other: HashMap<String, String>,
}

impl AuthorizationParameters {
    /// Flattens into name/value pairs in a deterministic order,
    /// `client_id` first.
    pub(crate) fn to_pairs(&self, client_id: &str) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = vec![("client_id".into(), client_id.into())];

        let mut push = |name: &str, value: &Option<String>| {
            if let Some(v) = value {
                pairs.push((name.to_string(), v.clone()));
            }
        };

        push("redirect_uri", &self.redirect_uri);
        push("response_type", &self.response_type);
        push("scope", &self.scope);
        push("state", &self.state);
        push("nonce", &self.nonce);
        push("code_challenge", &self.code_challenge);
        push("code_challenge_method", &self.code_challenge_method);
        push("prompt", &self.prompt);
        push("login_hint", &self.login_hint);
        push("id_token_hint", &self.id_token_hint);
        push("acr_values", &self.acr_values);
        push("resource", &self.resource);
        push("response_mode", &self.response_mode);
        push("request", &self.request);
        push("request_uri", &self.request_uri);

        if let Some(max_age) = self.max_age {
            pairs.push(("max_age".to_string(), max_age.to_string()));
        }

        let mut other: Vec<(&String, &String)> = self.other.iter().collect();
        other.sort_by(|a, b| a.0.cmp(b.0));
        for (name, value) in other {
            pairs.push((name.clone(), value.clone()));
        }

        pairs
    }
}
