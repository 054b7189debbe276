use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr, bail};

use crate::config::SpotifyConfig;
use crate::spotify_rs::auth::{
    exchange_code_for_token, initiate_oauth, parse_authorization_redirect, refresh_access_token,
};
use crate::spotify_rs::client::SpotifyClient;
use crate::spotify_rs::token_cache::CachedToken;

/// Owns the Spotify credentials and the on-disk token cache.
pub struct SpotifyAccountService {
    credentials: SpotifyConfig,
    token_cache: PathBuf,
}

impl SpotifyAccountService {
    pub fn new(credentials: SpotifyConfig, token_cache: PathBuf) -> Self {
        Self {
            credentials,
            token_cache,
        }
    }

    pub fn token_cache_path(&self) -> &Path {
        &self.token_cache
    }

    /// Run the authorization code flow: print the login URL, read back the URL the
    /// browser was redirected to, exchange the code and cache the token.
    pub async fn authorize<R: BufRead, W: Write>(&self, input: R, mut output: W) -> Result<()> {
        let redirect_uri = self.credentials.redirect_uri.as_str();
        let (auth, session) = initiate_oauth(&self.credentials.client_id, redirect_uri);

        writeln!(output, "Open this URL in your browser and log in to Spotify:\n")?;
        writeln!(output, "{}\n", auth.auth_url)?;
        writeln!(output, "Then paste the URL you were redirected to:")?;
        output.flush()?;

        let redirected_url = match input.lines().next() {
            Some(line) => line.wrap_err("Failed to read the redirect URL")?,
            None => bail!("No redirect URL was entered"),
        };

        let code = parse_authorization_redirect(&redirected_url, &session)
            .wrap_err("Failed to read the authorization code")?;

        let response = exchange_code_for_token(
            &self.credentials.client_id,
            &self.credentials.client_secret,
            &code,
            redirect_uri,
            &session.code_verifier,
        )
        .await
        .wrap_err("Failed to exchange the authorization code for a token")?;

        let token = CachedToken::from_response(response, None, chrono::Utc::now().timestamp())?;
        token.save(&self.token_cache)?;

        let user = SpotifyClient::new(token.access_token)
            .get_current_user()
            .await
            .wrap_err("Failed to get user info")?;
        log::info!(
            "Authorized as {} ({})",
            user.display_name.as_deref().unwrap_or("unknown"),
            user.id
        );

        Ok(())
    }

    /// Returns a valid access token, refreshing and re-caching it when it is about to expire.
    pub async fn access_token(&self) -> Result<String> {
        let Some(token) = CachedToken::load(&self.token_cache)? else {
            bail!(
                "No Spotify token found at {}. Run `remix-remover auth` first",
                self.token_cache.display()
            );
        };

        let now = chrono::Utc::now().timestamp();
        if !token.is_expired(now) {
            return Ok(token.access_token);
        }

        log::debug!("Cached Spotify token expired, refreshing");
        let response = refresh_access_token(
            &self.credentials.client_id,
            &self.credentials.client_secret,
            &token.refresh_token,
        )
        .await
        .wrap_err("Failed to refresh the Spotify token, run `remix-remover auth` again")?;

        let refreshed =
            CachedToken::from_response(response, Some(token.refresh_token.as_str()), now)?;
        refreshed.save(&self.token_cache)?;

        Ok(refreshed.access_token)
    }
}
