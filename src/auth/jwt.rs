use axum::http::StatusCode;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;

/// Realm roles the services act on
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn from_str(role: &str) -> Result<Self, String> {
        match role.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", role)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealmAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Access token claims, Keycloak layout
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user UUID in the realm)
    pub exp: usize,
    pub iat: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_access: Option<RealmAccess>,
}

impl Claims {
    /// Realm roles this service knows about; unknown Keycloak roles are skipped
    pub fn roles(&self) -> Vec<Role> {
        self.realm_access
            .as_ref()
            .map(|access| {
                access
                    .roles
                    .iter()
                    .filter_map(|r| Role::from_str(r).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT key is missing or not set")]
    MissingSecret,

    #[error("JWT public key is not a valid RSA key")]
    InvalidKey,

    #[error("Failed to create JWT token")]
    TokenCreation,

    #[error("Invalid or expired JWT token")]
    InvalidToken,
}

impl From<JwtError> for StatusCode {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::MissingSecret => StatusCode::INTERNAL_SERVER_ERROR,
            JwtError::InvalidKey => StatusCode::INTERNAL_SERVER_ERROR,
            JwtError::TokenCreation => StatusCode::INTERNAL_SERVER_ERROR,
            JwtError::InvalidToken => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Verifies bearer tokens issued by the realm
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn from_config(config: &JwtConfig) -> Result<Self, JwtError> {
        let mut verifier = if let Some(public_key) = &config.public_key {
            let pem = to_pem(public_key);
            let key = DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|_| JwtError::InvalidKey)?;
            Self::new(key, Algorithm::RS256)
        } else if let Some(secret) = &config.secret {
            Self::hs256(secret.as_bytes())
        } else {
            return Err(JwtError::MissingSecret);
        };

        if let Some(issuer) = &config.issuer {
            verifier.validation.set_issuer(&[issuer]);
            verifier.validation.set_required_spec_claims(&["exp", "iss"]);
        }
        verifier.validation.leeway = config.leeway_seconds;

        Ok(verifier)
    }

    /// Shared-secret verifier, used for local development and tests
    pub fn hs256(secret: &[u8]) -> Self {
        Self::new(DecodingKey::from_secret(secret), Algorithm::HS256)
    }

    fn new(decoding_key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            decoding_key,
            validation,
        }
    }

    /// Validate a JWT token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_e| JwtError::InvalidToken)?;

        Ok(token_data.claims)
    }
}

/// Keycloak publishes the realm key as bare base64 DER
fn to_pem(key: &str) -> String {
    let key = key.trim();
    if key.starts_with("-----BEGIN") {
        return key.to_string();
    }

    let body = key
        .as_bytes()
        .chunks(64)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\n");

    format!("-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----", body)
}

/// Generate an HS256 token for a subject with the given realm roles
#[cfg(test)]
pub(crate) fn generate_token(secret: &[u8], subject: &str, roles: &[Role]) -> Result<String, JwtError> {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    if secret.is_empty() {
        return Err(JwtError::MissingSecret);
    }

    let now = Utc::now();
    let expiry = now + Duration::hours(24);

    let claims = Claims {
        sub: subject.to_string(),
        exp: expiry.timestamp() as usize,
        iat: now.timestamp() as usize,
        iss: None,
        preferred_username: None,
        email: None,
        realm_access: Some(RealmAccess {
            roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
        }),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|_| JwtError::TokenCreation)
}
