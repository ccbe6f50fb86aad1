use std::fmt;

use chrono::{Local, NaiveDate};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::api::{AuthApi, AuthResponse, SignupRequest};
use crate::error::ApiError;
use crate::record::UserId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Student,
    Faculty,
    Staff,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Student => "Student",
            Role::Faculty => "Faculty",
            Role::Staff => "Staff",
        })
    }
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub join_date: NaiveDate,
    pub avatar_url: Option<String>,
}

/// Profile edit. `avatar_url: Some(None)` removes the avatar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub avatar_url: Option<Option<String>>,
}

impl User {
    fn from_auth(response: &AuthResponse) -> Self {
        Self {
            id: response.user.id.clone(),
            username: response.user.username.clone(),
            email: response.user.email.clone(),
            role: Role::default(),
            join_date: Local::now().date_naive(),
            avatar_url: None,
        }
    }

    pub fn apply(&mut self, patch: &UserPatch) {
        if let Some(username) = &patch.username {
            self.username = username.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(avatar_url) = &patch.avatar_url {
            self.avatar_url = avatar_url.clone();
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct Session {
    pub user: User,
    pub token: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Holds the current identity and session token.
///
/// `None` in the channel means logged out; front ends watch for that to route back to
/// the login screen.
pub struct SessionStore<A> {
    auth: A,
    session: watch::Sender<Option<Session>>,
}

impl<A: AuthApi> SessionStore<A> {
    pub fn new(auth: A) -> Self {
        let (session, _) = watch::channel(None);
        Self { auth, session }
    }

    /// Authenticate. Backend rejections come back with their message untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let response = self.auth.login(email.trim(), password).await.map_err(|e| {
            warn!("Login failed for {}: {}", email, e);
            e
        })?;
        Ok(self.start(&response))
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<User, ApiError> {
        if request.username.trim().is_empty()
            || request.email.trim().is_empty()
            || request.password.is_empty()
        {
            return Err(ApiError::Validation(
                "Username, email, and password are required".to_string(),
            ));
        }
        if request.password != request.confirm_password {
            return Err(ApiError::Validation("Passwords do not match".to_string()));
        }

        let response = self.auth.signup(request).await.map_err(|e| {
            warn!("Signup failed for {}: {}", request.email, e);
            e
        })?;
        Ok(self.start(&response))
    }

    fn start(&self, response: &AuthResponse) -> User {
        let user = User::from_auth(response);
        info!("Signed in as {} ({})", user.username, user.id);
        self.session.send_replace(Some(Session {
            user: user.clone(),
            token: response.token.clone(),
        }));
        user
    }

    /// Merge a profile edit into the current user. Local only; `None` when logged out.
    pub fn update_profile(&self, patch: &UserPatch) -> Option<User> {
        let mut updated = None;
        self.session.send_if_modified(|session| match session {
            Some(session) => {
                session.user.apply(patch);
                updated = Some(session.user.clone());
                true
            }
            None => false,
        });
        updated
    }

    pub fn logout(&self) {
        if let Some(previous) = self.session.send_replace(None) {
            info!("Signed out {}", previous.user.username);
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.borrow().as_ref().map(|s| s.user.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.session.borrow().as_ref().map(|s| s.token.clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeBackend;

    fn store() -> SessionStore<FakeBackend> {
        let backend = FakeBackend::new();
        backend.register("7", "sam", "sam@ufl.edu", "gator");
        SessionStore::new(backend)
    }

    #[tokio::test]
    async fn test_login_stores_identity_and_token() {
        let sessions = store();
        let user = sessions.login("sam@ufl.edu", "gator").await.unwrap();

        assert_eq!(user.id, UserId::new("7"));
        assert_eq!(user.username, "sam");
        assert_eq!(user.role, Role::Student);
        assert_eq!(user.avatar_url, None);
        assert!(sessions.is_logged_in());
        assert_eq!(sessions.token().as_deref(), Some("token-7"));
    }

    #[tokio::test]
    async fn test_login_failure_surfaces_backend_message() {
        let sessions = store();
        let err = sessions.login("sam@ufl.edu", "wrong").await.unwrap_err();

        assert!(err.is_rejection());
        assert_eq!(err.to_string(), "Invalid email or password");
        assert!(!sessions.is_logged_in());
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let sessions = store();
        let err = sessions.login("", "gator").await.unwrap_err();
        assert_eq!(err.to_string(), "Email and password are required");
    }

    #[tokio::test]
    async fn test_signup_then_duplicate() {
        let sessions = store();
        let request = SignupRequest {
            username: "alex".to_string(),
            email: "alex@ufl.edu".to_string(),
            password: "pw".to_string(),
            confirm_password: "pw".to_string(),
        };

        let user = sessions.signup(&request).await.unwrap();
        assert_eq!(user.username, "alex");

        let err = sessions.signup(&request).await.unwrap_err();
        assert_eq!(err.to_string(), "Username or email already exists");
    }

    #[tokio::test]
    async fn test_signup_password_mismatch() {
        let sessions = store();
        let request = SignupRequest {
            username: "alex".to_string(),
            email: "alex@ufl.edu".to_string(),
            password: "pw".to_string(),
            confirm_password: "other".to_string(),
        };
        let err = sessions.signup(&request).await.unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match");
    }

    #[tokio::test]
    async fn test_update_profile_merges_locally() {
        let sessions = store();
        sessions.login("sam@ufl.edu", "gator").await.unwrap();

        let updated = sessions
            .update_profile(&UserPatch {
                role: Some(Role::Faculty),
                avatar_url: Some(Some("https://img/sam.png".to_string())),
                ..UserPatch::default()
            })
            .unwrap();

        assert_eq!(updated.role, Role::Faculty);
        assert_eq!(updated.username, "sam");
        assert_eq!(sessions.current_user(), Some(updated));
    }

    #[test]
    fn test_update_profile_logged_out_is_noop() {
        let sessions = store();
        assert!(sessions.update_profile(&UserPatch::default()).is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_and_notifies() {
        let sessions = store();
        sessions.login("sam@ufl.edu", "gator").await.unwrap();
        let mut rx = sessions.subscribe();

        sessions.logout();

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());
        assert!(sessions.token().is_none());
        assert!(sessions.current_user().is_none());
    }

    #[test]
    fn test_session_debug_hides_token() {
        let session = Session {
            user: User {
                id: UserId::new("1"),
                username: "sam".to_string(),
                email: "sam@ufl.edu".to_string(),
                role: Role::Staff,
                join_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
                avatar_url: None,
            },
            token: "secret".to_string(),
        };
        assert!(!format!("{session:?}").contains("secret"));
    }
}
