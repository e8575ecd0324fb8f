//! In-memory user store
//!
//! Records are created once and never updated or deleted. Email is the key.

use std::collections::HashMap;

use bcrypt::{hash, verify, DEFAULT_COST};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::groups::{GroupAllocator, GroupLoad};
use crate::config::RegistrationConfig;

/// Registration form submission
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Stored user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub group_id: String,
    /// RFC 3339 creation time
    pub created_at: String,
}

/// Registration and login errors
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Please fill in all fields")]
    MissingFields,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Registration closed. All groups are full.")]
    RegistrationClosed,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, UserRecord>,
    group_counts: HashMap<String, usize>,
}

/// Thread-safe user store with group assignment
pub struct RegistrationStore {
    allocator: GroupAllocator,
    hash_cost: u32,
    inner: RwLock<Inner>,
}

impl RegistrationStore {
    pub fn new(allocator: GroupAllocator) -> Self {
        let mut inner = Inner::default();
        allocator.reconcile(&mut inner.group_counts);
        Self {
            allocator,
            hash_cost: DEFAULT_COST,
            inner: RwLock::new(inner),
        }
    }

    pub fn from_config(config: &RegistrationConfig) -> Self {
        Self::new(GroupAllocator::new(
            config.group_ids.clone(),
            config.users_per_group,
        ))
    }

    /// Override the bcrypt cost factor
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    pub fn allocator(&self) -> &GroupAllocator {
        &self.allocator
    }

    /// Validate, assign a group and store a new user
    pub fn register(&self, request: RegistrationRequest) -> Result<UserRecord, RegistrationError> {
        let name = request.name.trim().to_string();
        let email = request.email.trim().to_string();
        let phone = request.phone.trim().to_string();

        if name.is_empty()
            || email.is_empty()
            || phone.is_empty()
            || request.password.is_empty()
            || request.confirm_password.is_empty()
        {
            return Err(RegistrationError::MissingFields);
        }
        if request.password != request.confirm_password {
            return Err(RegistrationError::PasswordMismatch);
        }

        // Fail fast before paying for the hash
        {
            let inner = self.inner.read();
            if inner.users.contains_key(&email) {
                return Err(RegistrationError::EmailTaken);
            }
            if inner.users.len() >= self.allocator.total_capacity() {
                return Err(RegistrationError::RegistrationClosed);
            }
        }

        let password_hash = hash(&request.password, self.hash_cost)?;

        let mut inner = self.inner.write();
        if inner.users.contains_key(&email) {
            return Err(RegistrationError::EmailTaken);
        }
        let group_id = self
            .allocator
            .assign(&inner.group_counts)
            .ok_or(RegistrationError::RegistrationClosed)?
            .to_string();

        let record = UserRecord {
            name,
            email: email.clone(),
            phone,
            password_hash,
            group_id: group_id.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        *inner.group_counts.entry(group_id.clone()).or_insert(0) += 1;
        inner.users.insert(email.clone(), record.clone());

        info!(
            email = %email,
            group_id = %group_id,
            group_count = inner.group_counts[&group_id],
            total = inner.users.len(),
            capacity = self.allocator.total_capacity(),
            "new account created"
        );

        Ok(record)
    }

    /// Check credentials. Unknown email and wrong password look the same.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<UserRecord, RegistrationError> {
        let user = self
            .inner
            .read()
            .users
            .get(email.trim())
            .cloned()
            .ok_or(RegistrationError::InvalidCredentials)?;

        if verify(password, &user.password_hash).unwrap_or(false) {
            Ok(user)
        } else {
            Err(RegistrationError::InvalidCredentials)
        }
    }

    pub fn get(&self, email: &str) -> Option<UserRecord> {
        self.inner.read().users.get(email).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.inner.read().users.len()
    }

    /// Current per-group load
    pub fn distribution(&self) -> Vec<GroupLoad> {
        self.allocator.distribution(&self.inner.read().group_counts)
    }
}
