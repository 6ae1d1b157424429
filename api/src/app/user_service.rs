//! User service
//!
//! Handles wallet registration, API key rotation, and profile edits.

use std::sync::Arc;

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::domain::entities::{NewUser, ProfileUpdate, User, UserId};
use crate::domain::ledger::require_account_address;
use crate::domain::ports::UserRepository;
use crate::error::{AppError, DomainError};

const MAX_DISPLAY_NAME_LEN: usize = 64;
const MAX_ABOUT_LEN: usize = 1000;

/// Service for managing users
pub struct UserService<UR>
where
    UR: UserRepository,
{
    users: Arc<UR>,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    pub fn new(users: Arc<UR>) -> Self {
        Self { users }
    }

    /// Store a wallet, creating the user on first sight.
    ///
    /// Every call rotates the API key. Returns (user, api_key); the key is
    /// only shown once.
    pub async fn store(
        &self,
        wallet_address: &str,
        display_name: Option<&str>,
    ) -> Result<(User, String), AppError> {
        let wallet_address = require_account_address(wallet_address)?;
        let display_name = clean_text(display_name, MAX_DISPLAY_NAME_LEN, "Display name")?;

        let api_key = generate_api_key();
        let api_key_hash = hash_api_key(&api_key);

        let user = match self.users.find_by_wallet(&wallet_address).await? {
            Some(existing) => {
                self.users
                    .update_api_key_hash(&existing.id, &api_key_hash)
                    .await?;
                let user = match display_name {
                    Some(name) if existing.display_name.as_deref() != Some(name.as_str()) => {
                        let update = ProfileUpdate {
                            display_name: Some(Some(name)),
                            ..Default::default()
                        };
                        self.users.update_profile(&existing.id, &update).await?
                    }
                    _ => existing,
                };
                tracing::info!(user_id = %user.id, "Rotated API key");
                user
            }
            None => {
                let user = self
                    .users
                    .create(&NewUser {
                        wallet_address,
                        display_name,
                        api_key_hash: api_key_hash.clone(),
                    })
                    .await?;
                tracing::info!(user_id = %user.id, "Registered wallet");
                user
            }
        };

        Ok((
            User {
                api_key_hash,
                ..user
            },
            api_key,
        ))
    }

    /// Find a user by their API key hash
    pub async fn find_by_api_key(&self, api_key_hash: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.find_by_api_key_hash(api_key_hash).await?)
    }

    pub async fn get_by_id(&self, id: &UserId) -> Result<User, AppError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", id)))
    }

    /// Apply profile edits; blank values clear the field
    pub async fn update_profile(
        &self,
        id: &UserId,
        update: ProfileUpdate,
    ) -> Result<User, AppError> {
        let update = ProfileUpdate {
            display_name: clean_patch(update.display_name, MAX_DISPLAY_NAME_LEN, "Display name")?,
            avatar_url: clean_patch(update.avatar_url, 2048, "Avatar URL")?,
            about: clean_patch(update.about, MAX_ABOUT_LEN, "About")?,
        };
        Ok(self.users.update_profile(id, &update).await?)
    }
}

/// Trim optional text; blank becomes `None`
fn clean_text(
    value: Option<&str>,
    max_len: usize,
    field: &str,
) -> Result<Option<String>, DomainError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) if v.chars().count() > max_len => Err(DomainError::Validation(format!(
            "{} must be at most {} characters",
            field, max_len
        ))),
        Some(v) => Ok(Some(v.to_string())),
        None => Ok(None),
    }
}

fn clean_patch(
    value: Option<Option<String>>,
    max_len: usize,
    field: &str,
) -> Result<Option<Option<String>>, DomainError> {
    match value {
        Some(inner) => Ok(Some(clean_text(inner.as_deref(), max_len, field)?)),
        None => Ok(None),
    }
}

/// Generate a random API key
fn generate_api_key() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    format!("lp-{}", hex::encode(bytes))
}

/// Hash an API key for storage
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}
