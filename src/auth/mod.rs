//! Magic-key token service.
//!
//! A fixed allow-list of UUIDs ("magic keys") is loaded once at startup. Presenting
//! one of them to the login endpoint mints an HS256 JWT. The signing secret is
//! derived from the configured base secret and every entry of the allow-list, so
//! editing the list rotates the secret and invalidates all earlier tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{AppConfig, ConfigError};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("JWT generation error: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Token expiry is out of range")]
    ExpiryOutOfRange,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Magic key the token was issued for
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    /// Key version of the secret that signed the token
    pub kv: String,
}

/// Allow-list of magic keys as read from disk.
#[derive(Debug, Clone, Default)]
pub struct MagicKeys {
    raw: Vec<String>,
    valid: HashSet<Uuid>,
}

impl MagicKeys {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::KeysUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: Vec<String> =
            serde_json::from_str(&data).map_err(|source| ConfigError::KeysMalformed {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_entries(raw))
    }

    /// Entries that are not UUIDs are kept for secret derivation but can never log in.
    pub fn from_entries(raw: Vec<String>) -> Self {
        let mut valid = HashSet::new();
        for entry in &raw {
            match Uuid::parse_str(entry) {
                Ok(id) => {
                    valid.insert(id);
                }
                Err(_) => tracing::warn!("Skipping magic key that is not a UUID: {:?}", entry),
            }
        }
        Self { raw, valid }
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.valid.contains(id)
    }

    pub fn len(&self) -> usize {
        self.valid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }
}

/// Issues and validates bearer tokens. Immutable after construction.
pub struct TokenService {
    keys: MagicKeys,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    key_version: String,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("keys", &self.keys.len())
            .field("key_version", &self.key_version)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenService {
    /// Loads the magic keys named by the config and derives the signing secret.
    pub fn initialize(config: &AppConfig) -> Result<Self, ConfigError> {
        let keys = MagicKeys::load(&config.security.magic_keys_path)?;
        if keys.is_empty() {
            tracing::warn!(
                "No usable magic keys in {}; logins will always fail",
                config.security.magic_keys_path.display()
            );
        }
        let ttl = Duration::try_days(config.security.token_ttl_days).ok_or_else(|| {
            ConfigError::InvalidValue {
                key: "BOOKS_TOKEN_TTL_DAYS",
                value: config.security.token_ttl_days.to_string(),
            }
        })?;
        Ok(Self::new(keys, &config.security.jwt_secret, ttl))
    }

    pub fn new(keys: MagicKeys, base_secret: &str, ttl: Duration) -> Self {
        let secret = derive_secret(base_secret, &keys.raw);
        let key_version = hex::encode(&Sha256::digest(secret)[..8]);
        tracing::info!(
            "Token service ready: {} magic keys, key version {}",
            keys.len(),
            key_version
        );

        Self {
            encoding_key: EncodingKey::from_secret(&secret),
            decoding_key: DecodingKey::from_secret(&secret),
            keys,
            key_version,
            ttl,
        }
    }

    pub fn key_version(&self) -> &str {
        &self.key_version
    }

    pub fn keys(&self) -> &MagicKeys {
        &self.keys
    }

    pub fn issue_token(&self, candidate: &str) -> Result<String, TokenError> {
        self.issue_token_at(candidate, Utc::now())
    }

    fn issue_token_at(&self, candidate: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let id = Uuid::parse_str(candidate)
            .map_err(|_| TokenError::Unauthorized("Invalid or unauthorized UUID".to_string()))?;
        if !self.keys.contains(&id) {
            return Err(TokenError::Unauthorized(
                "Invalid or unauthorized UUID".to_string(),
            ));
        }

        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::ExpiryOutOfRange)?;

        let claims = Claims {
            sub: id.hyphenated().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            kv: self.key_version.clone(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(self.key_version.clone());

        Ok(encode(&header, &claims, &self.encoding_key)?)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| TokenError::Unauthorized(format!("Invalid or expired token: {}", e)))?;

        // Signature already ties the token to this secret; the version check keeps
        // rotation explicit.
        if data.claims.kv != self.key_version {
            return Err(TokenError::Unauthorized(
                "Token was issued for a previous key version".to_string(),
            ));
        }
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Unauthorized("Token has expired".to_string()));
        }

        Ok(data.claims)
    }
}

/// SHA-256 over the base secret followed by every raw allow-list entry, in file order.
fn derive_secret(base_secret: &str, entries: &[String]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(base_secret.as_bytes());
    for entry in entries {
        hasher.update(entry.as_bytes());
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_A: &str = "11111111-1111-1111-1111-111111111111";
    const KEY_B: &str = "22222222-2222-2222-2222-222222222222";

    fn service(entries: &[&str]) -> TokenService {
        let keys = MagicKeys::from_entries(entries.iter().map(|s| s.to_string()).collect());
        TokenService::new(keys, "test-secret", Duration::days(14))
    }

    #[test]
    fn issued_token_round_trips_to_subject() {
        let svc = service(&[KEY_A, KEY_B]);
        for key in [KEY_A, KEY_B] {
            let token = svc.issue_token(key).unwrap();
            let claims = svc.validate_token(&token).unwrap();
            assert_eq!(claims.sub, key);
            assert_eq!(claims.kv, svc.key_version());
            assert_eq!(claims.exp - claims.iat, 14 * 24 * 60 * 60);
        }
    }

    #[test]
    fn subject_is_canonical_uuid() {
        let svc = service(&[KEY_A]);
        let upper = KEY_A.to_uppercase();
        let token = svc.issue_token(&upper).unwrap();
        assert_eq!(svc.validate_token(&token).unwrap().sub, KEY_A);
    }

    #[test]
    fn oversized_ttl_fails_instead_of_panicking() {
        let keys = MagicKeys::from_entries(vec![KEY_A.to_string()]);
        let svc = TokenService::new(keys, "test-secret", Duration::days(100_000_000));
        assert!(matches!(svc.issue_token(KEY_A), Err(TokenError::ExpiryOutOfRange)));
    }

    #[test]
    fn unknown_or_malformed_candidates_are_unauthorized() {
        let svc = service(&[KEY_A]);
        assert!(matches!(svc.issue_token(KEY_B), Err(TokenError::Unauthorized(_))));
        assert!(matches!(svc.issue_token("not-a-uuid"), Err(TokenError::Unauthorized(_))));
        assert!(matches!(svc.issue_token(""), Err(TokenError::Unauthorized(_))));
    }

    #[test]
    fn non_uuid_entries_cannot_log_in_but_change_the_secret() {
        let with_junk = service(&[KEY_A, "junk"]);
        let without = service(&[KEY_A]);
        assert_eq!(with_junk.keys().len(), 1);
        assert!(matches!(with_junk.issue_token("junk"), Err(TokenError::Unauthorized(_))));
        assert_ne!(with_junk.key_version(), without.key_version());
    }

    #[test]
    fn changing_the_allow_list_revokes_old_tokens() {
        let before = service(&[KEY_A]);
        let token = before.issue_token(KEY_A).unwrap();

        let after = service(&[KEY_A, KEY_B]);
        assert_ne!(before.key_version(), after.key_version());
        assert!(matches!(after.validate_token(&token), Err(TokenError::Unauthorized(_))));

        // Same list, same secret: still valid
        let same = service(&[KEY_A]);
        assert!(same.validate_token(&token).is_ok());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let svc = service(&[KEY_A]);
        let issued = Utc::now() - Duration::days(15);
        let token = svc.issue_token_at(KEY_A, issued).unwrap();
        assert!(matches!(svc.validate_token(&token), Err(TokenError::Unauthorized(_))));
    }

    #[test]
    fn tampered_and_garbage_tokens_are_rejected() {
        let svc = service(&[KEY_A]);
        let token = svc.issue_token(KEY_A).unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(svc.validate_token(&tampered).is_err());
        assert!(svc.validate_token("garbage").is_err());
        assert!(svc.validate_token("").is_err());

        let other_secret = TokenService::new(
            MagicKeys::from_entries(vec![KEY_A.to_string()]),
            "another-secret",
            Duration::days(14),
        );
        assert!(other_secret.validate_token(&token).is_err());
    }

    #[test]
    fn load_reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("absent.json");
        assert!(matches!(
            MagicKeys::load(&missing),
            Err(ConfigError::KeysUnreadable { .. })
        ));

        let malformed = dir.path().join("bad.json");
        std::fs::write(&malformed, r#"{"keys": 1}"#).unwrap();
        assert!(matches!(
            MagicKeys::load(&malformed),
            Err(ConfigError::KeysMalformed { .. })
        ));

        let good = dir.path().join("good.json");
        std::fs::write(&good, format!(r#"["{}", "{}"]"#, KEY_A, KEY_B)).unwrap();
        let keys = MagicKeys::load(&good).unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&Uuid::parse_str(KEY_B).unwrap()));
    }
}
