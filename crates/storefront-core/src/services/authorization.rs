//! Role checks against live user records, plus the cache-aside user read path.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{Role, User};
use crate::error::{DomainError, DomainResult};
use crate::ports::{Cache, CacheError, UserRepository, get_json, set_json};
use crate::services::mask_email;

/// Cache key under which a user record is stored.
pub fn user_cache_key(email: &str) -> String {
    format!("user:{}", email)
}

/// Gates actions by role membership.
///
/// Role checks always read the store, never the token or the cache, so a
/// role change applies to the very next request.
pub struct Authorizer {
    users: Arc<dyn UserRepository>,
    cache: Arc<dyn Cache>,
    cache_ttl: Option<Duration>,
}

impl Authorizer {
    pub fn new(
        users: Arc<dyn UserRepository>,
        cache: Arc<dyn Cache>,
        cache_ttl: Option<Duration>,
    ) -> Self {
        Self {
            users,
            cache,
            cache_ttl,
        }
    }

    pub async fn require_role(&self, role: Role, email: &str) -> DomainResult<()> {
        let user = self.load(email).await?;
        if !user.has_role(role) {
            tracing::info!(user = %mask_email(email), required = %role, "Role check failed");
            return Err(DomainError::Forbidden(format!("{} role required", role)));
        }
        Ok(())
    }

    pub async fn require_one_of(&self, roles: &[Role], email: &str) -> DomainResult<()> {
        let user = self.load(email).await?;
        if !user.has_any_role(roles) {
            tracing::info!(user = %mask_email(email), required = ?roles, "Role check failed");
            return Err(DomainError::Forbidden(
                "User does not have permission".to_string(),
            ));
        }
        Ok(())
    }

    /// Add `role` if missing and persist the whole set (last writer wins).
    pub async fn add_role(&self, email: &str, role: Role) -> DomainResult<User> {
        let mut user = self.load(email).await?;
        if user.add_role(role) {
            self.users.update_roles(email, &user.roles).await?;
            tracing::info!(user = %mask_email(email), role = %role, "Role added");
        }
        self.invalidate(email).await;
        Ok(user)
    }

    /// Replace the role set. Duplicates are dropped, order is kept.
    pub async fn set_roles(&self, email: &str, roles: Vec<Role>) -> DomainResult<User> {
        let mut deduped: Vec<Role> = Vec::with_capacity(roles.len());
        for role in roles {
            if !deduped.contains(&role) {
                deduped.push(role);
            }
        }
        if deduped.is_empty() {
            return Err(DomainError::Validation(
                "A user must keep at least one role".to_string(),
            ));
        }

        let mut user = self.load(email).await?;
        self.users.update_roles(email, &deduped).await?;
        user.roles = deduped;
        self.invalidate(email).await;

        tracing::info!(user = %mask_email(email), roles = ?user.roles, "Roles replaced");
        Ok(user)
    }

    /// Cache-aside read: cache first, store on miss, then populate the cache.
    pub async fn get_user_cached(&self, email: &str) -> DomainResult<Option<User>> {
        let key = user_cache_key(email);

        match get_json::<User>(self.cache.as_ref(), &key).await {
            Ok(Some(user)) => {
                tracing::debug!(user = %mask_email(email), "User cache hit");
                return Ok(Some(user));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Evicting undecodable cache entry");
                self.invalidate(email).await;
            }
        }

        tracing::debug!(user = %mask_email(email), "User cache miss");
        let Some(user) = self.users.find_by_email(email).await? else {
            return Ok(None);
        };

        if let Err(e) = set_json(self.cache.as_ref(), &key, &user, self.cache_ttl).await {
            tracing::warn!(key = %key, error = %e, "Failed to populate user cache");
        }
        Ok(Some(user))
    }

    /// Drop the cached copy of a user. Failures are logged, not returned.
    pub async fn invalidate(&self, email: &str) {
        let key = user_cache_key(email);
        if let Err(e) = self.cache.delete(&key).await {
            log_cache_error(&key, &e);
        }
    }

    async fn load(&self, email: &str) -> DomainResult<User> {
        self.users
            .find_by_email(email)
            .await?
            .ok_or_else(|| DomainError::not_found("User", email))
    }
}

fn log_cache_error(key: &str, error: &CacheError) {
    tracing::warn!(key = %key, error = %error, "Cache invalidation failed; entry stays until TTL");
}
