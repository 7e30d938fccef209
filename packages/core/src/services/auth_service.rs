//! Authentication & Authorization Service
//!
//! Account lifecycle (register → verify → log in), Argon2id password
//! handling, group resolution for permission checks, and the admin
//! bootstrap that guarantees at least one administrator account exists.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::{debug, info};

use crate::db::DocumentStore;
use crate::models::{can_all, can_any, permissions, Group, User};
use crate::services::ServiceError;

/// Email address of the bootstrapped administrator account.
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Name of the bootstrapped administrator group.
pub const ADMIN_GROUP: &str = "admin";

/// A user together with their resolved groups, ready for permission checks.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: User,
    pub groups: Vec<Group>,
}

impl Authenticated {
    /// True when any required permission is granted.
    pub fn can_any(&self, required: &[&str]) -> bool {
        can_any(&self.groups, required)
    }

    /// True when every required permission is granted.
    pub fn can_all(&self, required: &[&str]) -> bool {
        can_all(&self.groups, required)
    }
}

/// Hash a password using Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ServiceError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC-format hash string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ServiceError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| ServiceError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Account and permission operations.
pub struct AuthService {
    store: Arc<DocumentStore>,
}

impl AuthService {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// Register a new account.
    ///
    /// The account starts inactive with a fresh verification token; the
    /// caller is responsible for surfacing the verification URL.
    ///
    /// # Errors
    ///
    /// - `DuplicateEmail` (E-204) when the address is taken
    /// - `MissingField` (E-103) when email or password is blank
    pub async fn register(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        if self.store.user_by_email(email).await?.is_some() {
            return Err(ServiceError::DuplicateEmail {
                email: email.to_string(),
            });
        }
        if password.is_empty() {
            return Err(crate::models::ValidationError::MissingField("password".to_string()).into());
        }

        let user = User::new(email.to_string(), hash_password(password)?);
        user.validate()?;
        let user = self.store.create_user(user).await?;
        debug!(user = %user.id, "registered new account");
        Ok(user)
    }

    /// Activate the account matching a verification token.
    ///
    /// # Errors
    ///
    /// Returns `VerificationInvalid` (E-205) when no account carries the token.
    pub async fn verify(&self, token: &str) -> Result<User, ServiceError> {
        let mut user = self
            .store
            .user_by_verification(token)
            .await?
            .ok_or(ServiceError::VerificationInvalid)?;
        user.activate();
        self.store.update_user(&user).await?;
        info!(user = %user.id, "account verified");
        Ok(user)
    }

    /// Check credentials and return the account.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` (E-202) on unknown email or wrong password
    /// - `AccountInactive` (E-203) when the account is not yet verified
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let user = self
            .store
            .user_by_email(email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;
        if !verify_password(password, &user.password_hash)? {
            return Err(ServiceError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(ServiceError::AccountInactive {
                email: user.email.clone(),
            });
        }
        debug!(user = %user.id, "authenticated");
        Ok(user)
    }

    /// Load a user and their groups by id. `None` when the id is stale.
    pub async fn load(&self, user_id: &str) -> Result<Option<Authenticated>, ServiceError> {
        let Some(user) = self.store.user_by_id(user_id).await? else {
            return Ok(None);
        };
        let groups = self.store.groups_by_ids(&user.groups).await?;
        Ok(Some(Authenticated { user, groups }))
    }

    /// Load a user and their groups by email. `None` when unknown.
    pub async fn load_by_email(&self, email: &str) -> Result<Option<Authenticated>, ServiceError> {
        let Some(user) = self.store.user_by_email(email).await? else {
            return Ok(None);
        };
        let groups = self.store.groups_by_ids(&user.groups).await?;
        Ok(Some(Authenticated { user, groups }))
    }

    /// Ensure the admin group and at least one administrator account exist.
    ///
    /// Idempotent: the group is created once with the full permission set,
    /// and the account only when no user belongs to the group yet. The
    /// bootstrapped account is created active (it has no one to verify it).
    pub async fn ensure_admin(&self, admin_password: &str) -> Result<(), ServiceError> {
        debug!("checking that the administrator exists");
        let admin_group = match self.store.group_by_name(ADMIN_GROUP).await? {
            Some(group) => group,
            None => {
                debug!("creating admin group");
                let permissions = permissions::ALL.iter().map(|p| p.to_string()).collect();
                self.store
                    .create_group(Group::new(ADMIN_GROUP.to_string(), permissions))
                    .await?
            }
        };

        if let Some(mut existing) = self.store.user_by_email(ADMIN_EMAIL).await? {
            if !existing.groups.contains(&admin_group.id) {
                existing.groups.push(admin_group.id);
                existing.modified_at = chrono::Utc::now();
                self.store.update_user(&existing).await?;
                info!("administrator group restored on {}", ADMIN_EMAIL);
            }
            return Ok(());
        }

        info!("creating administrator account {}", ADMIN_EMAIL);
        let mut admin = User::new(ADMIN_EMAIL.to_string(), hash_password(admin_password)?);
        admin.is_active = true;
        admin.groups = vec![admin_group.id];
        self.store.create_user(admin).await?;
        info!("administrator created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(verify_password("pw", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_authenticated_permission_checks() {
        let user = User::new("a@example.com".to_string(), "hash".to_string());
        let groups = vec![Group::new(
            "editors".to_string(),
            vec![permissions::NODE_MODIFY.to_string()],
        )];
        let auth = Authenticated { user, groups };
        assert!(auth.can_all(&[permissions::NODE_MODIFY]));
        assert!(auth.can_any(&[permissions::NODE_MODIFY, permissions::SLOT_DROP]));
        assert!(!auth.can_all(&[permissions::NODE_MODIFY, permissions::SLOT_DROP]));
    }
}
