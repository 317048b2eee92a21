//! Identity provider client.
//!
//! Looks up user records by id and reads the role claim from their public metadata.

use std::time::Duration;

use serde::Deserialize;

use crate::errors::AppError;

/// Role claim that opens the admin area.
pub const ADMIN_ROLE: &str = "admin";

/// Metadata visible to the application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PublicMetadata {
    #[serde(default)]
    pub role: Option<String>,
}

/// A user record as returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    #[serde(default)]
    pub public_metadata: PublicMetadata,
}

impl IdentityUser {
    pub fn role(&self) -> Option<&str> {
        self.public_metadata.role.as_deref()
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(ADMIN_ROLE)
    }
}

/// HTTP client for the identity provider's user API.
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: Option<String>,
    secret_key: Option<String>,
}

impl IdentityClient {
    pub fn new(base_url: Option<String>, secret_key: Option<String>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            secret_key,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Fetch the user record for `user_id`.
    pub async fn fetch_user(&self, user_id: &str) -> Result<IdentityUser, AppError> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| AppError::Auth("Identity service is not configured".to_string()))?;

        if user_id.is_empty()
            || !user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(AppError::Auth(format!("Malformed user id '{}'", user_id)));
        }

        let mut request = self.http.get(format!("{}/users/{}", base_url, user_id));
        if let Some(key) = &self.secret_key {
            request = request.bearer_auth(key);
        }

        let user = request
            .send()
            .await?
            .error_for_status()?
            .json::<IdentityUser>()
            .await?;

        tracing::debug!("Fetched identity {} with role {:?}", user.id, user.role());
        Ok(user)
    }
}
