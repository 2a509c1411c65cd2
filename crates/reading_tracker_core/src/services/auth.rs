//! crates/reading_tracker_core/src/services/auth.rs
//!
//! Account creation, login and bearer-token sessions.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{AuthToken, Signup, User, UserCredentials};
use crate::ports::{CredentialHasher, PortError, PortResult, UserRepository};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn CredentialHasher>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            users,
            hasher,
            session_ttl,
        }
    }

    /// Registers a new account and logs it in.
    pub async fn signup(&self, signup: Signup) -> PortResult<(User, AuthToken)> {
        if exists(self.users.find_credentials_by_email(&signup.email).await)? {
            return Err(PortError::Duplicate("email is already in use".to_string()));
        }
        if exists(self.users.find_credentials_by_username(&signup.username).await)? {
            return Err(PortError::Duplicate("username is already in use".to_string()));
        }

        let password_hash = self.hasher.hash(&signup.password)?;
        let user = User {
            id: Uuid::new_v4(),
            username: signup.username,
            email: signup.email,
            last_login: None,
            created_at: Utc::now(),
        };
        self.users.insert_user(user.clone(), &password_hash).await?;
        info!(user_id = %user.id, "user signed up");

        let token = self.issue_token(user.id, Utc::now()).await?;
        Ok((user, token))
    }

    /// Logs in by email or username.
    ///
    /// Recording the login time and issuing the token run concurrently; the call
    /// fails with the first error either of them reports.
    pub async fn login(&self, identifier: &str, password: &str) -> PortResult<(User, AuthToken)> {
        let credentials = self.find_credentials(identifier).await?;
        if !self.hasher.verify(password, &credentials.password_hash)? {
            return Err(PortError::Unauthorized);
        }

        let user_id = credentials.user.id;
        let now = Utc::now();
        let ((), token) = futures::try_join!(
            self.users.update_last_login(user_id, now),
            self.issue_token(user_id, now),
        )?;
        info!(%user_id, "user logged in");

        let mut user = credentials.user;
        user.last_login = Some(now);
        Ok((user, token))
    }

    pub async fn logout(&self, token: &str) -> PortResult<()> {
        self.users.delete_auth_session(token).await
    }

    /// Resolves a bearer token to its user id.
    pub async fn authenticate(&self, token: &str) -> PortResult<Uuid> {
        self.users.validate_auth_session(token).await
    }

    pub async fn current_user(&self, user_id: Uuid) -> PortResult<User> {
        self.users.get_user(user_id).await
    }

    async fn find_credentials(&self, identifier: &str) -> PortResult<UserCredentials> {
        let found = match self.users.find_credentials_by_email(identifier).await {
            Err(PortError::NotFound(_)) => self.users.find_credentials_by_username(identifier).await,
            other => other,
        };
        found.map_err(|e| match e {
            PortError::NotFound(_) => PortError::Unauthorized,
            other => other,
        })
    }

    async fn issue_token(&self, user_id: Uuid, now: DateTime<Utc>) -> PortResult<AuthToken> {
        let token = AuthToken {
            token: Uuid::new_v4().simple().to_string(),
            user_id,
            expires_at: now + self.session_ttl,
        };
        self.users
            .create_auth_session(&token.token, user_id, token.expires_at)
            .await?;
        Ok(token)
    }
}

fn exists<T>(lookup: PortResult<T>) -> PortResult<bool> {
    match lookup {
        Ok(_) => Ok(true),
        Err(PortError::NotFound(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::test_support::PlainHasher;
    use async_trait::async_trait;

    fn auth(users: Arc<dyn UserRepository>) -> AuthService {
        AuthService::new(users, Arc::new(PlainHasher), Duration::hours(72))
    }

    fn ana() -> Signup {
        Signup {
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            password: "correct horse".to_string(),
        }
    }

    #[tokio::test]
    async fn signup_then_login_by_username_or_email() {
        let store = Arc::new(InMemoryStore::new());
        let auth = auth(store.clone());

        let (user, token) = auth.signup(ana()).await.unwrap();
        assert_eq!(auth.authenticate(&token.token).await.unwrap(), user.id);

        let (by_name, _) = auth.login("ana", "correct horse").await.unwrap();
        let (by_email, token) = auth.login("ana@example.com", "correct horse").await.unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(by_email.id, user.id);
        assert!(auth.current_user(user.id).await.unwrap().last_login.is_some());

        auth.logout(&token.token).await.unwrap();
        let err = auth.authenticate(&token.token).await.unwrap_err();
        assert!(matches!(err, PortError::Unauthorized));
    }

    #[tokio::test]
    async fn duplicate_accounts_and_bad_passwords_are_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let auth = auth(store.clone());
        auth.signup(ana()).await.unwrap();

        let err = auth.signup(ana()).await.unwrap_err();
        assert!(matches!(err, PortError::Duplicate(_)));

        let err = auth.login("ana", "wrong").await.unwrap_err();
        assert!(matches!(err, PortError::Unauthorized));
        let err = auth.login("nobody", "whatever").await.unwrap_err();
        assert!(matches!(err, PortError::Unauthorized));
    }

    /// Delegates to the in-memory store but cannot record logins.
    struct BrokenLastLogin(InMemoryStore);

    #[async_trait]
    impl UserRepository for BrokenLastLogin {
        async fn insert_user(&self, user: User, password_hash: &str) -> PortResult<()> {
            self.0.insert_user(user, password_hash).await
        }
        async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
            self.0.get_user(user_id).await
        }
        async fn find_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
            self.0.find_credentials_by_email(email).await
        }
        async fn find_credentials_by_username(&self, username: &str) -> PortResult<UserCredentials> {
            self.0.find_credentials_by_username(username).await
        }
        async fn update_last_login(&self, _user_id: Uuid, _at: DateTime<Utc>) -> PortResult<()> {
            Err(PortError::Storage("connection reset".to_string()))
        }
        async fn create_auth_session(
            &self,
            token: &str,
            user_id: Uuid,
            expires_at: DateTime<Utc>,
        ) -> PortResult<()> {
            self.0.create_auth_session(token, user_id, expires_at).await
        }
        async fn validate_auth_session(&self, token: &str) -> PortResult<Uuid> {
            self.0.validate_auth_session(token).await
        }
        async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
            self.0.delete_auth_session(token).await
        }
    }

    #[tokio::test]
    async fn login_fails_when_either_concurrent_step_fails() {
        let auth = auth(Arc::new(BrokenLastLogin(InMemoryStore::new())));
        auth.signup(ana()).await.unwrap();

        let err = auth.login("ana", "correct horse").await.unwrap_err();
        assert!(matches!(err, PortError::Storage(_)));
    }
}
