//! User account service: sign-up, login, profiles and bios.

use chrono::Utc;
use connectvit_types::error::{RepositoryError, UserError};
use connectvit_types::user::{NewUser, SignupRequest, User, UserProfile};
use tracing::info;

use crate::realtime::addressing::validate_identity;
use crate::repository::UserRepository;
use crate::service::password::PasswordHasher;

/// Only student addresses may register.
pub const STUDENT_EMAIL_DOMAIN: &str = "@vitstudent.ac.in";

/// Joining dates are stored as `dd-mm-YYYY`.
const JOIN_DATE_FORMAT: &str = "%d-%m-%Y";

/// Service for user accounts.
pub struct UserService<U: UserRepository, H: PasswordHasher> {
    repo: U,
    hasher: H,
}

impl<U: UserRepository, H: PasswordHasher> UserService<U, H> {
    pub fn new(repo: U, hasher: H) -> Self {
        Self { repo, hasher }
    }

    /// Register a new account.
    pub async fn signup(&self, request: SignupRequest) -> Result<User, UserError> {
        let full_name = request.full_name.trim();
        let username = request.username.trim();
        let email = request.email.trim();
        if full_name.is_empty() || username.is_empty() || email.is_empty() || request.password.is_empty() {
            return Err(UserError::Validation("all fields are required".to_string()));
        }
        if !email.ends_with(STUDENT_EMAIL_DOMAIN) || email.len() == STUDENT_EMAIL_DOMAIN.len() {
            return Err(UserError::Validation(format!(
                "invalid email format, use example{STUDENT_EMAIL_DOMAIN}"
            )));
        }
        validate_identity(username).map_err(|e| UserError::Validation(e.to_string()))?;

        let password_hash = self.hasher.hash_password(&request.password)?;
        let new_user = NewUser {
            full_name: full_name.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            date_of_joining: Utc::now().format(JOIN_DATE_FORMAT).to_string(),
        };

        let user = self.repo.create_user(&new_user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => UserError::AlreadyExists,
            other => UserError::StorageError(other.to_string()),
        })?;
        info!(username = %user.username, "user signed up");
        Ok(user)
    }

    /// Verify credentials and return the account.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, UserError> {
        let user = self
            .repo
            .get_user_by_username(username)
            .await
            .map_err(storage)?
            .ok_or(UserError::InvalidCredentials)?;
        if !self.hasher.verify_password(password, &user.password_hash) {
            return Err(UserError::InvalidCredentials);
        }
        info!(%username, "user logged in");
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, UserError> {
        self.repo.list_users().await.map_err(storage)
    }

    /// Public profile; a user without a bio gets an empty one.
    pub async fn profile(&self, username: &str) -> Result<UserProfile, UserError> {
        let user = self
            .repo
            .get_user_by_username(username)
            .await
            .map_err(storage)?
            .ok_or(UserError::NotFound)?;
        let bio = self.repo.get_bio(username).await.map_err(storage)?;
        Ok(UserProfile {
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            date_of_joining: user.date_of_joining,
            bio: bio.unwrap_or_default(),
        })
    }

    pub async fn update_bio(&self, username: &str, bio: &str) -> Result<(), UserError> {
        if username.trim().is_empty() {
            return Err(UserError::Validation("username is required".to_string()));
        }
        self.repo
            .get_user_by_username(username)
            .await
            .map_err(storage)?
            .ok_or(UserError::NotFound)?;
        self.repo
            .upsert_bio(username, bio, Utc::now())
            .await
            .map_err(storage)
    }
}

fn storage(e: RepositoryError) -> UserError {
    UserError::StorageError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::MemoryStore;

    /// Reversible stand-in for a real hash.
    struct PlainHasher;

    impl PasswordHasher for PlainHasher {
        fn hash_password(&self, password: &str) -> Result<String, UserError> {
            Ok(format!("plain${password}"))
        }

        fn verify_password(&self, password: &str, hash: &str) -> bool {
            hash == format!("plain${password}")
        }
    }

    fn request(username: &str, email: &str) -> SignupRequest {
        SignupRequest {
            full_name: "Alice Anand".to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: "hunter2".to_string(),
        }
    }

    fn service() -> UserService<MemoryStore, PlainHasher> {
        UserService::new(MemoryStore::default(), PlainHasher)
    }

    #[tokio::test]
    async fn signup_then_login() {
        let service = service();
        let user = service
            .signup(request("alice", "alice@vitstudent.ac.in"))
            .await
            .unwrap();
        assert_eq!(user.password_hash, "plain$hunter2");
        assert_eq!(user.date_of_joining.len(), 10);

        let logged_in = service.login("alice", "hunter2").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert!(matches!(
            service.login("alice", "wrong").await,
            Err(UserError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("nobody", "hunter2").await,
            Err(UserError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn signup_requires_student_email() {
        let service = service();
        for email in ["alice@gmail.com", "@vitstudent.ac.in", "alice@vitstudent.ac.in.evil"] {
            assert!(matches!(
                service.signup(request("alice", email)).await,
                Err(UserError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn signup_rejects_unaddressable_username() {
        let service = service();
        assert!(matches!(
            service.signup(request("al:ice", "alice@vitstudent.ac.in")).await,
            Err(UserError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_signup_conflicts() {
        let service = service();
        service
            .signup(request("alice", "alice@vitstudent.ac.in"))
            .await
            .unwrap();
        assert!(matches!(
            service.signup(request("alice", "other@vitstudent.ac.in")).await,
            Err(UserError::AlreadyExists)
        ));
    }

    #[tokio::test]
    async fn profile_and_bio() {
        let service = service();
        service
            .signup(request("alice", "alice@vitstudent.ac.in"))
            .await
            .unwrap();
        assert_eq!(service.profile("alice").await.unwrap().bio, "");

        service.update_bio("alice", "third year, CSE").await.unwrap();
        service.update_bio("alice", "final year, CSE").await.unwrap();
        assert_eq!(service.profile("alice").await.unwrap().bio, "final year, CSE");

        assert!(matches!(service.profile("bob").await, Err(UserError::NotFound)));
        assert!(matches!(
            service.update_bio("bob", "hi").await,
            Err(UserError::NotFound)
        ));
    }
}
