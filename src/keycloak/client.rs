//! Keycloak Admin REST API client.
//!
//! Authenticates with the client-credentials grant of a confidential client
//! whose service account holds the `realm-management` roles, and reuses the
//! admin token until shortly before it expires.

use std::time::{Duration, Instant};

use axum::async_trait;
use reqwest::{header::LOCATION, Client, Response, StatusCode};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use url::Url;

use crate::config::KeycloakConfig;
use crate::keycloak::model::{
    CreatedResponse, CredentialRepresentation, RoleRepresentation, TokenResponse,
    UserRepresentation,
};
use crate::users::model::UserDto;

const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum KeycloakError {
    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("identity provider responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("identity provider response carries no created user id")]
    MissingCreatedId,

    #[error("user id is required")]
    MissingUserId,

    #[error("invalid user id: {0}")]
    InvalidUserId(String),

    #[error("identity provider url cannot carry a path: {0}")]
    InvalidBaseUrl(Url),
}

/// User administration operations of the identity provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeycloakAdmin: Send + Sync {
    /// Create an enabled user with a permanent password. A conflict is
    /// reported through the returned status, not as an error.
    async fn create_user(&self, user: &UserDto) -> Result<CreatedResponse, KeycloakError>;

    /// Map realm roles, looked up by name, onto a user
    async fn add_roles(&self, user_id: &str, roles: &[String]) -> Result<(), KeycloakError>;

    async fn update_user(&self, user: &UserDto) -> Result<(), KeycloakError>;

    async fn delete_user(&self, user_id: &str) -> Result<(), KeycloakError>;

    async fn find_user_by_id(&self, user_id: &str) -> Result<UserRepresentation, KeycloakError>;

    /// Attribute search, e.g. `email:alice@example.com`
    async fn search_users(&self, query: &str) -> Result<Vec<UserRepresentation>, KeycloakError>;
}

/// Extract the new user's id from a `201 Created` response
pub fn created_id(response: &CreatedResponse) -> Result<String, KeycloakError> {
    if response.status != StatusCode::CREATED.as_u16() {
        return Err(KeycloakError::Status {
            status: response.status,
            body: format!("Create method returned status {}", response.status),
        });
    }

    response
        .location
        .as_deref()
        .and_then(|location| location.trim_end_matches('/').rsplit('/').next())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or(KeycloakError::MissingCreatedId)
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct KeycloakClient {
    client: Client,
    server_url: Url,
    realm: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl KeycloakClient {
    pub fn new(config: &KeycloakConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            server_url: config.server_url.clone(),
            realm: config.realm.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token: Mutex::new(None),
        })
    }

    /// Appends each segment percent-encoded, so a `/` inside one never
    /// changes the resource addressed
    fn url(&self, segments: &[&str]) -> Result<Url, KeycloakError> {
        let mut url = self.server_url.clone();
        url.path_segments_mut()
            .map_err(|_| KeycloakError::InvalidBaseUrl(self.server_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn token_url(&self) -> Result<Url, KeycloakError> {
        self.url(&["realms", self.realm.as_str(), "protocol", "openid-connect", "token"])
    }

    fn admin_url(&self, path: &[&str]) -> Result<Url, KeycloakError> {
        let mut segments = vec!["admin", "realms", self.realm.as_str()];
        segments.extend_from_slice(path);
        self.url(&segments)
    }

    fn user_url(&self, user_id: &str, rest: &[&str]) -> Result<Url, KeycloakError> {
        if matches!(user_id.trim(), "" | "." | "..") {
            return Err(KeycloakError::InvalidUserId(user_id.to_string()));
        }

        let mut path = vec!["users", user_id];
        path.extend_from_slice(rest);
        self.admin_url(&path)
    }

    /// A rejected admin token is dropped so the next call fetches a fresh one
    async fn check_admin_status(&self, response: Response) -> Result<Response, KeycloakError> {
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Admin token rejected, discarding cached token");
            *self.token.lock().await = None;
        }

        check_status(response).await
    }

    async fn access_token(&self) -> Result<String, KeycloakError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        let response = self
            .client
            .post(self.token_url()?)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;
        let token: TokenResponse = check_status(response).await?.json().await?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }

    async fn find_role(&self, token: &str, name: &str) -> Result<RoleRepresentation, KeycloakError> {
        let response = self
            .client
            .get(self.admin_url(&["roles", name])?)
            .bearer_auth(token)
            .send()
            .await?;

        Ok(self.check_admin_status(response).await?.json().await?)
    }
}

async fn check_status(response: Response) -> Result<Response, KeycloakError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!("Identity provider responded with {}: {}", status, body);
    Err(KeycloakError::Status {
        status: status.as_u16(),
        body,
    })
}

fn password_credentials(user: &UserDto) -> Option<Vec<CredentialRepresentation>> {
    user.password
        .as_deref()
        .map(|password| vec![CredentialRepresentation::password(password)])
}

fn required_id(user: &UserDto) -> Result<&str, KeycloakError> {
    user.id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or(KeycloakError::MissingUserId)
}

#[async_trait]
impl KeycloakAdmin for KeycloakClient {
    async fn create_user(&self, user: &UserDto) -> Result<CreatedResponse, KeycloakError> {
        let token = self.access_token().await?;
        let representation = UserRepresentation {
            username: user.username.clone(),
            email: user.email.clone(),
            enabled: Some(true),
            email_verified: Some(false),
            credentials: password_credentials(user),
            ..Default::default()
        };

        let response = self
            .client
            .post(self.admin_url(&["users"])?)
            .bearer_auth(&token)
            .json(&representation)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::CREATED && status != StatusCode::CONFLICT {
            self.check_admin_status(response).await?;
            return Err(KeycloakError::Status {
                status: status.as_u16(),
                body: format!("Create method returned status {}", status.as_u16()),
            });
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Ok(CreatedResponse {
            status: status.as_u16(),
            location,
        })
    }

    async fn add_roles(&self, user_id: &str, roles: &[String]) -> Result<(), KeycloakError> {
        let url = self.user_url(user_id, &["role-mappings", "realm"])?;
        let token = self.access_token().await?;

        let mut representations = Vec::with_capacity(roles.len());
        for name in roles {
            representations.push(self.find_role(&token, name).await?);
        }

        let response = self
            .client
            .post(url)
            .bearer_auth(&token)
            .json(&representations)
            .send()
            .await?;
        self.check_admin_status(response).await?;

        info!("Assigned roles {:?} to user {}", roles, user_id);
        Ok(())
    }

    async fn update_user(&self, user: &UserDto) -> Result<(), KeycloakError> {
        let url = self.user_url(required_id(user)?, &[])?;
        let token = self.access_token().await?;
        let representation = UserRepresentation {
            username: user.username.clone(),
            email: user.email.clone(),
            credentials: password_credentials(user),
            ..Default::default()
        };

        let response = self
            .client
            .put(url)
            .bearer_auth(&token)
            .json(&representation)
            .send()
            .await?;
        self.check_admin_status(response).await?;

        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), KeycloakError> {
        let url = self.user_url(user_id, &[])?;
        let token = self.access_token().await?;
        let response = self
            .client
            .delete(url)
            .bearer_auth(&token)
            .send()
            .await?;
        self.check_admin_status(response).await?;

        Ok(())
    }

    async fn find_user_by_id(&self, user_id: &str) -> Result<UserRepresentation, KeycloakError> {
        let url = self.user_url(user_id, &[])?;
        let token = self.access_token().await?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&token)
            .send()
            .await?;

        Ok(self.check_admin_status(response).await?.json().await?)
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserRepresentation>, KeycloakError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(self.admin_url(&["users"])?)
            .query(&[("q", query)])
            .bearer_auth(&token)
            .send()
            .await?;

        Ok(self.check_admin_status(response).await?.json().await?)
    }
}
