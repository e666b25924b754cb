// Credential provider: client-credentials token acquisition against the
// Microsoft identity platform, scoped to the Purview data plane.

use crate::config::Settings;
use crate::error::AuthError;
use chrono::{DateTime, Utc};
use oauth2::basic::BasicClient;
use oauth2::reqwest::http_client;
use oauth2::{AuthType, AuthUrl, ClientId, ClientSecret, Scope, TokenResponse, TokenUrl};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::fmt;
use std::time::Duration;

pub const PURVIEW_SCOPE: &str = "https://purview.azure.net/.default";

/// An issued bearer token and the instant it stops being valid.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The live credential together with the headers every raw REST call sends.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub credential: Credential,
    pub headers: HeaderMap,
}

impl Session {
    pub fn new(credential: Credential) -> Result<Self, AuthError> {
        let mut headers = HeaderMap::new();
        let mut value = HeaderValue::from_str(&format!("Bearer {}", credential.token()))
            .map_err(|_| AuthError::InvalidToken)?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
        Ok(Self {
            credential,
            headers,
        })
    }

    pub fn token(&self) -> &str {
        self.credential.token()
    }
}

/// Acquires sessions for one app registration. Calling `acquire` again is
/// the refresh operation: it always returns a brand-new session.
pub struct CredentialProvider {
    client: BasicClient,
}

impl CredentialProvider {
    pub fn new(settings: &Settings) -> Result<Self, AuthError> {
        let base = format!("{}/{}/oauth2/v2.0", settings.authority_host, settings.tenant_id);

        let auth_url = AuthUrl::new(format!("{}/authorize", base))
            .map_err(|e| AuthError::InvalidEndpoint(format!("Invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(format!("{}/token", base))
            .map_err(|e| AuthError::InvalidEndpoint(format!("Invalid token URL: {}", e)))?;

        let client = BasicClient::new(
            ClientId::new(settings.client_id.clone()),
            Some(ClientSecret::new(settings.client_secret.clone())),
            auth_url,
            Some(token_url),
        )
        .set_auth_type(AuthType::RequestBody);

        Ok(Self { client })
    }

    /// Perform the token round trip and derive the request headers.
    pub fn acquire(&self) -> Result<Session, AuthError> {
        tracing::debug!(scope = PURVIEW_SCOPE, "requesting access token");

        let token = self
            .client
            .exchange_client_credentials()
            .add_scope(Scope::new(PURVIEW_SCOPE.to_string()))
            .request(http_client)
            .map_err(|e| {
                tracing::warn!(error = %e, "token request failed");
                AuthError::TokenRequest(e.to_string())
            })?;

        let lifetime = token.expires_in().unwrap_or(Duration::from_secs(3600));
        let expires_at = Utc::now()
            + chrono::Duration::from_std(lifetime).unwrap_or_else(|_| chrono::Duration::hours(1));

        Session::new(Credential::new(token.access_token().secret().clone(), expires_at))
    }
}
