//! API token issuance and verification.
//!
//! Tokens are JWTs signed with EdDSA (Ed25519 PEM keys) or HS256 (shared
//! secret). A token's audience is the caller's platform and its subject the
//! caller's source id; both must be on the configured allow-lists.

use std::fs;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{AuthConfig, TokenAlgorithm};
use crate::error::AppError;
use crate::types::TokenRequest;

const LEEWAY_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    MissingCredentials,
    #[error("Invalid authentication scheme")]
    InvalidScheme,
    #[error("Invalid or expired JWT token")]
    InvalidToken,
    #[error("Forbidden platform and/or source ID")]
    ForbiddenSource,
    #[error("Token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials | AuthError::InvalidScheme | AuthError::ForbiddenSource => {
                AppError::Forbidden(err.to_string())
            }
            AuthError::InvalidToken => AppError::Unauthorized(err.to_string()),
            AuthError::Signing(_) => AppError::Internal(anyhow::Error::new(err)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies API tokens. Built once at startup from `[auth]`.
#[derive(Clone)]
pub struct TokenAuthority {
    issuer: String,
    audiences: Vec<String>,
    subjects: Vec<String>,
    ttl_secs: i64,
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenAuthority {
    pub fn from_config(cfg: &AuthConfig) -> anyhow::Result<Self> {
        let (algorithm, encoding, decoding) = match cfg.algorithm {
            TokenAlgorithm::Hs256 => {
                let secret = cfg
                    .secret
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| anyhow::anyhow!("auth.secret is required for HS256"))?;
                (
                    Algorithm::HS256,
                    EncodingKey::from_secret(secret.as_bytes()),
                    DecodingKey::from_secret(secret.as_bytes()),
                )
            }
            TokenAlgorithm::EdDsa => {
                let (Some(private_path), Some(public_path)) = (&cfg.private_key_path, &cfg.public_key_path)
                else {
                    anyhow::bail!("auth.private_key_path and auth.public_key_path are required for EdDSA");
                };
                let private_pem = fs::read(private_path).map_err(|e| {
                    anyhow::anyhow!("cannot read private key {}: {}", private_path.display(), e)
                })?;
                let public_pem = fs::read(public_path).map_err(|e| {
                    anyhow::anyhow!("cannot read public key {}: {}", public_path.display(), e)
                })?;
                let encoding = EncodingKey::from_ed_pem(&private_pem)
                    .map_err(|e| anyhow::anyhow!("invalid private key {}: {}", private_path.display(), e))?;
                let decoding = DecodingKey::from_ed_pem(&public_pem)
                    .map_err(|e| anyhow::anyhow!("invalid public key {}: {}", public_path.display(), e))?;
                (Algorithm::EdDSA, encoding, decoding)
            }
        };

        if cfg.allowed_audiences.is_empty() || cfg.allowed_subjects.is_empty() {
            tracing::warn!("auth allow-lists are empty; no token can be issued");
        }

        let mut validation = Validation::new(algorithm);
        validation.leeway = LEEWAY_SECS;
        validation.set_issuer(&[&cfg.issuer]);
        validation.set_audience(cfg.allowed_audiences.as_slice());
        validation.set_required_spec_claims(&["iss", "sub", "aud", "iat", "exp"]);

        Ok(Self {
            issuer: cfg.issuer.clone(),
            audiences: cfg.allowed_audiences.clone(),
            subjects: cfg.allowed_subjects.clone(),
            ttl_secs: i64::try_from(cfg.token_ttl_secs).unwrap_or(i64::MAX),
            algorithm,
            encoding,
            decoding,
            validation,
        })
    }

    /// Issues a token for an allow-listed platform/source pair.
    pub fn issue(&self, req: &TokenRequest) -> Result<String, AuthError> {
        if !self.audiences.contains(&req.source_platform) || !self.subjects.contains(&req.source_id) {
            return Err(AuthError::ForbiddenSource);
        }
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: self.issuer.clone(),
            sub: req.source_id.clone(),
            aud: req.source_platform.clone(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };
        encode(&Header::new(self.algorithm), &claims, &self.encoding).map_err(AuthError::Signing)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                AuthError::InvalidToken
            })
    }

    /// Verifies an `Authorization` header value of the form `Bearer <token>`.
    pub fn authorize_header(&self, header: Option<&str>) -> Result<Claims, AuthError> {
        let value = header.map(str::trim).filter(|v| !v.is_empty()).ok_or(AuthError::MissingCredentials)?;
        let (scheme, token) = value.split_once(' ').ok_or(AuthError::InvalidScheme)?;
        let token = token.trim();
        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return Err(AuthError::InvalidScheme);
        }
        self.verify(token)
    }
}
