use serde_json::json;
use std::sync::Arc;

use super::{Auth, Backend, keys};
use crate::auth::TokenStore;
use crate::error::FetchError;
use crate::http::ApiRequest;
use crate::models::{AuthResponse, User};
use crate::namespace::Namespace;

/// Sign-in and sign-out.
///
/// A change of identity drops everything cached on behalf of the previous
/// user: the whole admin namespace and the user's own project list.
#[derive(Clone)]
pub struct AuthApi {
    backend: Backend,
    tokens: Arc<TokenStore>,
}

impl AuthApi {
    pub(crate) fn new(backend: Backend, tokens: Arc<TokenStore>) -> Self {
        AuthApi { backend, tokens }
    }

    pub async fn register(
        &self,
        email: &str,
        nickname: &str,
        password: &str,
    ) -> Result<AuthResponse, FetchError> {
        let request = ApiRequest::post("/api/auth/register")
            .json(&json!({ "email": email, "nickname": nickname, "password": password }))?;
        self.sign_in(request).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, FetchError> {
        let request = ApiRequest::post("/api/auth/login")
            .json(&json!({ "email": email, "password": password }))?;
        self.sign_in(request).await
    }

    /// The signed-in user. Not cached.
    pub async fn me(&self) -> Result<User, FetchError> {
        self.backend
            .send(Auth::Required, ApiRequest::get("/api/me"))
            .await
    }

    pub fn logout(&self) {
        self.tokens.clear();
        self.forget_user();
        tracing::debug!("Signed out");
    }

    pub fn is_signed_in(&self) -> bool {
        self.tokens.is_signed_in()
    }

    async fn sign_in(&self, request: ApiRequest) -> Result<AuthResponse, FetchError> {
        let response: AuthResponse = self.backend.send(Auth::Anonymous, request).await?;
        self.forget_user();
        self.tokens.set(response.access_token.clone());
        tracing::debug!("Signed in: user={}", response.user.id);
        Ok(response)
    }

    fn forget_user(&self) {
        self.backend.engine.clear(Namespace::Admin);
        self.backend.invalidate(Namespace::Public, keys::MY_PROJECTS);
    }
}
