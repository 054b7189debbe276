use std::collections::HashMap;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use rand::Rng;
use sha2::{Digest, Sha256};
use url::Url;

use crate::spotify_rs::types::{OAuthSession, SpotifyAuthResponse, SpotifyTokenResponse};

const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Reading the source playlist and rewriting the private destination playlist.
pub const REQUIRED_SCOPE: &str = "playlist-modify-private playlist-read-private";

/// Generate a cryptographically secure random string for PKCE
fn generate_random_string(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            const CHARSET: &[u8] =
                b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
            CHARSET[rng.random_range(0..CHARSET.len())] as char
        })
        .collect()
}

/// Generate PKCE code verifier (43-128 characters)
fn generate_code_verifier() -> String {
    generate_random_string(128)
}

/// Generate PKCE code challenge from verifier using S256 method
fn generate_code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let hash = hasher.finalize();
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generate a random state parameter for CSRF protection
fn generate_state() -> String {
    generate_random_string(16)
}

fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", client_id, client_secret))
    )
}

/// Initiate Spotify OAuth flow with PKCE
/// Returns the authorization URL and creates an OAuth session
pub fn initiate_oauth(client_id: &str, redirect_uri: &str) -> (SpotifyAuthResponse, OAuthSession) {
    let code_verifier = generate_code_verifier();
    let code_challenge = generate_code_challenge(&code_verifier);
    let state = generate_state();

    let auth_url = format!(
        "{}?client_id={}&response_type=code&redirect_uri={}&state={}&scope={}&code_challenge_method=S256&code_challenge={}",
        SPOTIFY_AUTH_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&state),
        urlencoding::encode(REQUIRED_SCOPE),
        code_challenge
    );

    let session = OAuthSession {
        code_verifier,
        state: state.clone(),
        created_at: chrono::Utc::now().timestamp(),
    };

    let response = SpotifyAuthResponse { auth_url, state };

    (response, session)
}

#[derive(Debug, thiserror::Error)]
pub enum AuthorizationRedirectError {
    #[error("Not a valid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Spotify denied the authorization: {0}")]
    Denied(String),
    #[error("The redirect URL has no `code` parameter")]
    MissingCode,
    #[error("The `state` parameter does not match, the redirect belongs to another login attempt")]
    StateMismatch,
}

/// Extracts the authorization code from the URL Spotify redirected the browser to.
pub fn parse_authorization_redirect(
    redirected_url: &str,
    session: &OAuthSession,
) -> Result<String, AuthorizationRedirectError> {
    let url = Url::parse(redirected_url.trim())?;
    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

    if let Some(error) = params.get("error") {
        return Err(AuthorizationRedirectError::Denied(error.clone()));
    }
    if params.get("state") != Some(&session.state) {
        return Err(AuthorizationRedirectError::StateMismatch);
    }
    params
        .get("code")
        .cloned()
        .ok_or(AuthorizationRedirectError::MissingCode)
}

#[derive(Debug, thiserror::Error)]
pub enum ExchangeCodeForTokenError {
    #[error("Invalid code: {reason}")]
    InvalidCode { reason: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response")]
    FailedToParseResponse(reqwest::Error),
}

/// Exchange authorization code for access token
/// https://developer.spotify.com/documentation/web-api/tutorials/code-pkce-flow
pub async fn exchange_code_for_token(
    client_id: &str,
    client_secret: &str,
    code: &str,
    // Must be identical to the one used to build the authorization URL
    redirect_uri: &str,
    code_verifier: &str,
) -> Result<SpotifyTokenResponse, ExchangeCodeForTokenError> {
    let client = reqwest::Client::new();

    let mut params = HashMap::new();
    params.insert("grant_type", "authorization_code");
    params.insert("code", code);
    params.insert("redirect_uri", redirect_uri);
    params.insert("code_verifier", code_verifier);

    let response = client
        .post(SPOTIFY_TOKEN_URL)
        // This automatically serializes to x-www-form-urlencoded and sets the header (as required by spotify)
        .form(&params)
        .header("Authorization", basic_auth_header(client_id, client_secret))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(ExchangeCodeForTokenError::FailedToSendRequest)?;

    if !response.status().is_success() {
        return Err(ExchangeCodeForTokenError::InvalidCode {
            reason: response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string()),
        });
    }

    let token_response: SpotifyTokenResponse = response
        .json()
        .await
        .map_err(ExchangeCodeForTokenError::FailedToParseResponse)?;

    Ok(token_response)
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenError {
    #[error("Invalid refresh token: {reason}")]
    InvalidRefreshToken { reason: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
}

/// Refresh an access token using a refresh token
pub async fn refresh_access_token(
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<SpotifyTokenResponse, RefreshTokenError> {
    let client = reqwest::Client::new();

    let mut params = HashMap::new();
    params.insert("grant_type", "refresh_token");
    params.insert("refresh_token", refresh_token);
    params.insert("client_id", client_id);

    let response = client
        .post(SPOTIFY_TOKEN_URL)
        .form(&params)
        .header("Authorization", basic_auth_header(client_id, client_secret))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(RefreshTokenError::FailedToSendRequest)?;

    if !response.status().is_success() {
        return Err(RefreshTokenError::InvalidRefreshToken {
            reason: response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string()),
        });
    }

    let token_response: SpotifyTokenResponse = response
        .json()
        .await
        .map_err(RefreshTokenError::FailedToParseResponse)?;

    Ok(token_response)
}
