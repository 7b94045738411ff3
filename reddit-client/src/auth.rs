use crate::api::{AUTHORIZE_URL, TOKEN_URL};
use digest_core::{RedditApiError, RedditCredentials};
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{AuthUrl, ClientId, ClientSecret, TokenResponse, TokenUrl};
use tracing::debug;

/// Exchange script-app credentials for an application-only bearer
/// token. The OAuth protocol itself is the `oauth2` crate's problem;
/// we only hold the resulting token for the run.
pub async fn request_app_token(credentials: &RedditCredentials) -> Result<String, RedditApiError> {
    let auth_url =
        AuthUrl::new(AUTHORIZE_URL.to_string()).map_err(|e| RedditApiError::AuthenticationFailed {
            reason: e.to_string(),
        })?;
    let token_url =
        TokenUrl::new(TOKEN_URL.to_string()).map_err(|e| RedditApiError::AuthenticationFailed {
            reason: e.to_string(),
        })?;

    let client = BasicClient::new(
        ClientId::new(credentials.client_id.trim().to_string()),
        Some(ClientSecret::new(credentials.client_secret.trim().to_string())),
        auth_url,
        Some(token_url),
    );

    let token = client
        .exchange_client_credentials()
        .request_async(async_http_client)
        .await
        .map_err(|e| RedditApiError::AuthenticationFailed {
            reason: e.to_string(),
        })?;

    debug!("obtained application-only Reddit token");
    Ok(token.access_token().secret().clone())
}
