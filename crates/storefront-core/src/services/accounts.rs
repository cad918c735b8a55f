//! Account flows: registration, login/logout, refresh and user administration.

use std::sync::Arc;

use serde_json::json;

use crate::domain::{AuditLog, Role, User};
use crate::error::{DomainError, DomainResult};
use crate::ports::{AuditLogRepository, PasswordService, Producer, UserRepository, topics};
use crate::services::{Authorizer, TokenManager, TokenPair, mask_email};

const MIN_PASSWORD_LEN: usize = 6;

/// Roles allowed to create and delete accounts.
pub const ACCOUNT_ADMINS: [Role; 2] = [Role::Admin, Role::Moderator];

/// Registration input.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub roles: Vec<Role>,
}

impl NewAccount {
    pub fn validate(&self) -> DomainResult<()> {
        let email = self.email.trim();
        let valid_email = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !email.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if !valid_email {
            return Err(DomainError::Validation("Invalid email address".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::Validation(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LEN
            )));
        }
        if self.full_name == self.password {
            return Err(DomainError::Validation(
                "Full name and password must not match".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    audit: Arc<dyn AuditLogRepository>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<TokenManager>,
    authorizer: Arc<Authorizer>,
    producer: Producer,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        audit: Arc<dyn AuditLogRepository>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<TokenManager>,
        authorizer: Arc<Authorizer>,
        producer: Producer,
    ) -> Self {
        Self {
            users,
            audit,
            passwords,
            tokens,
            authorizer,
            producer,
        }
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn authorizer(&self) -> &Authorizer {
        &self.authorizer
    }

    pub async fn register(&self, account: NewAccount) -> DomainResult<User> {
        self.create(account, "register", "User registered successfully")
            .await
    }

    /// Create an account on someone else's behalf. Admins and moderators only.
    pub async fn create_user(&self, actor: &str, account: NewAccount) -> DomainResult<User> {
        self.authorizer.require_one_of(&ACCOUNT_ADMINS, actor).await?;
        self.create(account, "create_user", "User created successfully")
            .await
    }

    async fn create(
        &self,
        account: NewAccount,
        action: &str,
        detail: &str,
    ) -> DomainResult<User> {
        account.validate()?;
        let email = account.email.trim().to_string();

        if self.users.find_by_email(&email).await?.is_some() {
            self.record_failure(AuditLog::failed(&email, action, "Email already exists"))
                .await;
            return Err(DomainError::Conflict("Email already exists".to_string()));
        }

        let password_hash = self.passwords.hash(&account.password)?;
        let user = User::new(email, account.full_name, password_hash, account.roles);
        let user = self.users.insert(user).await?;

        self.audit
            .append(AuditLog::success(&user.email, action, detail))
            .await?;
        tracing::info!(user = %mask_email(&user.email), action, "Account created");
        self.announce(&user.email, action).await;
        Ok(user)
    }

    /// Check credentials, issue tokens, mark the user active and announce the login.
    pub async fn login(&self, email: &str, password: &str) -> DomainResult<TokenPair> {
        let found = self.users.find_by_email(email).await?;
        let verified = match &found {
            Some(user) => self.passwords.verify(password, &user.password_hash)?,
            None => false,
        };

        let user = match found {
            Some(user) if verified => user,
            _ => {
                self.record_failure(AuditLog::failed(
                    email,
                    "login",
                    "Incorrect username or password",
                ))
                .await;
                tracing::info!(user = %mask_email(email), "Login rejected");
                return Err(DomainError::InvalidCredential);
            }
        };

        if user.is_disabled {
            self.record_failure(AuditLog::failed(email, "login", "User is disabled"))
                .await;
            return Err(DomainError::Forbidden("User is disabled".to_string()));
        }

        let tokens = self.tokens.issue_pair(&user.email).await?;
        self.users.set_active(&user.email, true).await?;
        self.authorizer.invalidate(&user.email).await;
        self.audit
            .append(AuditLog::success(
                &user.email,
                "login",
                "User logged in successfully",
            ))
            .await?;

        self.producer
            .publish(
                topics::USER_LOGIN,
                json!({
                    "email": user.email,
                    "message": "User logged in successfully",
                    "status": "success",
                }),
            )
            .await;

        tracing::info!(user = %mask_email(&user.email), "User logged in");
        Ok(tokens)
    }

    /// Resolve the user behind an access token. Inactive users are refused.
    pub async fn authenticate(&self, access_token: &str) -> DomainResult<User> {
        let email = self.tokens.verify_access_token(access_token)?;
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(DomainError::InvalidCredential)?;

        if !user.is_active {
            return Err(DomainError::Forbidden("Inactive user".to_string()));
        }
        Ok(user)
    }

    pub async fn logout(&self, email: &str) -> DomainResult<()> {
        self.users.set_active(email, false).await?;
        self.tokens.revoke_refresh_token(email).await?;
        self.authorizer.invalidate(email).await;
        self.audit
            .append(AuditLog::success(
                email,
                "logout",
                "User logged out successfully",
            ))
            .await?;

        tracing::info!(user = %mask_email(email), "User logged out");
        self.announce(email, "logout").await;
        Ok(())
    }

    pub async fn refresh(&self, email: &str) -> DomainResult<TokenPair> {
        self.tokens.refresh(email).await
    }

    pub async fn delete_user(&self, actor: &str, email: &str) -> DomainResult<()> {
        self.authorizer.require_one_of(&ACCOUNT_ADMINS, actor).await?;

        if !self.users.delete(email).await? {
            return Err(DomainError::not_found("User", email));
        }
        self.authorizer.invalidate(email).await;
        self.audit
            .append(AuditLog::success(
                email,
                "delete_user",
                "User deleted successfully",
            ))
            .await?;
        self.announce(email, "delete_user").await;
        Ok(())
    }

    /// Replace a user's roles. Moderators only.
    pub async fn update_user_roles(
        &self,
        actor: &str,
        email: &str,
        roles: Vec<Role>,
    ) -> DomainResult<User> {
        self.authorizer.require_role(Role::Moderator, actor).await?;
        let user = self.authorizer.set_roles(email, roles).await?;
        self.audit
            .append(AuditLog::success(
                email,
                "update_user_roles",
                "User roles updated successfully",
            ))
            .await?;
        self.announce(email, "update_user_roles").await;
        Ok(user)
    }

    /// Grant one more role. Moderators only.
    pub async fn add_user_role(&self, actor: &str, email: &str, role: Role) -> DomainResult<User> {
        self.authorizer.require_role(Role::Moderator, actor).await?;
        let user = self.authorizer.add_role(email, role).await?;
        self.audit
            .append(AuditLog::success(
                email,
                "add_user_role",
                "User role added successfully",
            ))
            .await?;
        self.announce(email, "add_user_role").await;
        Ok(user)
    }

    pub async fn audit_trail(&self, email: &str) -> DomainResult<Vec<AuditLog>> {
        Ok(self.audit.find_by_email(email).await?)
    }

    async fn announce(&self, email: &str, action: &str) {
        self.producer
            .publish(
                topics::USER_ACTIVITY,
                json!({ "email": email, "action": action, "status": "success" }),
            )
            .await;
    }

    // The caller is already failing; keep its error rather than the audit one.
    async fn record_failure(&self, log: AuditLog) {
        if let Err(e) = self.audit.append(log).await {
            tracing::error!(error = %e, "Failed to write audit log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(email: &str, password: &str, full_name: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
            roles: vec![],
        }
    }

    #[test]
    fn test_validate_accepts_reasonable_input() {
        assert!(account("a@x.com", "secret1", "Alice").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_password() {
        let err = account("a@x.com", "abc", "Alice").validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_validate_rejects_name_equal_to_password() {
        let err = account("a@x.com", "secret1", "secret1")
            .validate()
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_validate_rejects_bad_email() {
        for email in ["", "no-at-sign", "@x.com", "a@localhost", "a b@x.com"] {
            assert!(account(email, "secret1", "Alice").validate().is_err(), "{email}");
        }
    }
}
