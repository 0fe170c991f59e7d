// Credential lifecycle endpoints: the calls that create and destroy the
// session token the rest of the client runs on.
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ClientError;

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub code: String,
}

/// Log in and store the issued credential in the client's token store.
pub async fn login(
    client: &ApiClient,
    username: &str,
    password: &str,
) -> Result<LoginResponse, ClientError> {
    let response: LoginResponse = client
        .post_json("/auth/login", &LoginRequest { username, password })
        .await?;
    client.session().set(response.token.clone());
    tracing::info!(username, "logged in");
    Ok(response)
}

/// Register a new account. The backend responds with a message envelope and
/// no data; success is the 2xx status itself.
pub async fn register(client: &ApiClient, request: &RegisterRequest) -> Result<(), ClientError> {
    let body = serde_json::to_value(request).map_err(ClientError::Encode)?;
    let options = crate::client::CallOptions::json(body);
    client
        .call(reqwest::Method::POST, "/auth/register", options)
        .await?;
    Ok(())
}

/// Log out. The backend keeps no session state, so this only discards the
/// stored credential.
pub fn logout(client: &ApiClient) {
    client.session().clear();
    tracing::info!("logged out");
}
