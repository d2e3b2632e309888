//! Caller identity and the admin gate for billing routes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::error::ApiError;

/// The authenticated caller as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: Option<String>,
    pub roles: Vec<String>,
}

impl Principal {
    /// The one place role shapes are interpreted.
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case("admin"))
    }
}

/// `/auth/me` body. Identity has answered both `roles: [..]` and a single
/// `role: ".."`; both are folded into `Principal::roles`.
#[derive(Debug, Deserialize)]
struct MeResponse {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    role: Option<String>,
}

impl From<MeResponse> for Principal {
    fn from(me: MeResponse) -> Self {
        let mut roles = me.roles;
        if let Some(role) = me.role
            && !roles.contains(&role)
        {
            roles.push(role);
        }
        Self {
            username: me.username,
            roles,
        }
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("missing bearer token")]
    MissingCredentials,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("admin role required")]
    Forbidden,

    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

/// Resolves a bearer token into a principal.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn principal(&self, bearer: &str) -> Result<Principal, IdentityError>;
}

/// Identity service client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpIdentityService {
    client: Client,
    base_url: String,
}

impl HttpIdentityService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl IdentityService for HttpIdentityService {
    async fn principal(&self, bearer: &str) -> Result<Principal, IdentityError> {
        let response = self
            .client
            .get(format!("{}/auth/me", self.base_url))
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentityError::InvalidCredentials);
        }

        let me: MeResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("malformed identity response: {e}")))?;
        Ok(me.into())
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    let value = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Middleware: lets the request through only for admin callers.
pub async fn require_admin(
    State(identity): State<Arc<dyn IdentityService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = bearer_token(&request)
        .map(str::to_owned)
        .ok_or(IdentityError::MissingCredentials)?;
    let principal = identity.principal(&bearer).await?;
    if !principal.is_admin() {
        tracing::info!(username = ?principal.username, "non-admin caller rejected");
        return Err(IdentityError::Forbidden.into());
    }

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
