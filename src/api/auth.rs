use reqwest::Method;
use tracing::info;

use crate::api::{ApiError, HttpClient, RequestOptions};
use crate::models::{Credentials, LoginResponse, RegisterResponse, Registration};
use crate::session;

/// Login, registration and logout; the only calls made without a token
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: HttpClient,
}

impl AuthClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Create an account and store the returned token
    pub async fn register(&self, registration: &Registration) -> Result<RegisterResponse, ApiError> {
        let options = RequestOptions::json(Method::POST, registration)?.without_auth();
        let response: RegisterResponse = self.http.request_json("/register/", options).await?;

        let mut store = session::lock(self.http.session());
        store.set_token(response.token.clone())?;
        store.set_username(response.user.username.clone())?;
        info!(username = %response.user.username, "registered");

        Ok(response)
    }

    /// Exchange credentials for a token and store it
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let options = RequestOptions::json(Method::POST, credentials)?.without_auth();
        let response: LoginResponse = self.http.request_json("/login/", options).await?;

        let mut store = session::lock(self.http.session());
        store.set_token(response.token.clone())?;
        store.set_username(response.username.clone())?;
        info!(username = %response.username, "logged in");

        Ok(response)
    }

    /// Forget the local session; the server keeps no logout endpoint
    pub fn logout(&self) -> Result<(), ApiError> {
        session::lock(self.http.session()).clear_auth()?;
        info!("logged out");
        Ok(())
    }
}
