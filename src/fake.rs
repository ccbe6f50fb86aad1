//! In-memory backend used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::api::{AuthApi, AuthResponse, AuthUser, SignupRequest, SightingApi};
use crate::error::ApiError;
use crate::record::{Sighting, SightingId, UserId};

#[derive(Default)]
struct Inner {
    remote: Mutex<Vec<Sighting>>,
    accounts: Mutex<HashMap<String, (String, AuthUser)>>,
    failing: AtomicBool,
    next_id: AtomicU64,
    calls: AtomicUsize,
}

#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    inner: Arc<Inner>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, sightings: Vec<Sighting>) {
        let mut remote = self.inner.remote.lock().unwrap();
        for mut sighting in sightings {
            sighting.id = self.next_id();
            remote.push(sighting);
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    pub fn remote_len(&self) -> usize {
        self.inner.remote.lock().unwrap().len()
    }

    pub fn remote(&self, id: &SightingId) -> Option<Sighting> {
        self.inner
            .remote
            .lock()
            .unwrap()
            .iter()
            .find(|s| &s.id == id)
            .cloned()
    }

    /// Restart id assignment so the next create reuses an id already handed out.
    pub fn rewind_ids(&self) {
        self.inner.next_id.store(0, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    pub fn register(&self, id: &str, username: &str, email: &str, password: &str) {
        let user = AuthUser {
            id: UserId::new(id),
            username: username.to_string(),
            email: email.to_string(),
        };
        self.inner
            .accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), user));
    }

    fn next_id(&self) -> SightingId {
        SightingId::new((self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string())
    }

    fn begin(&self) -> Result<(), ApiError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.failing.load(Ordering::SeqCst) {
            return Err(ApiError::Rejected {
                status: 500,
                message: "backend unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn not_found() -> ApiError {
        ApiError::Rejected {
            status: 404,
            message: "Sighting not found".to_string(),
        }
    }
}

impl SightingApi for FakeBackend {
    async fn fetch_all(&self) -> Result<Vec<Sighting>, ApiError> {
        self.begin()?;
        Ok(self.inner.remote.lock().unwrap().clone())
    }

    async fn create(&self, sighting: &Sighting) -> Result<SightingId, ApiError> {
        self.begin()?;
        let id = self.next_id();
        self.inner.remote.lock().unwrap().push(Sighting {
            id: id.clone(),
            ..sighting.clone()
        });
        Ok(id)
    }

    async fn replace(&self, sighting: &Sighting) -> Result<(), ApiError> {
        self.begin()?;
        let mut remote = self.inner.remote.lock().unwrap();
        let slot = remote
            .iter_mut()
            .find(|s| s.id == sighting.id)
            .ok_or_else(Self::not_found)?;
        *slot = sighting.clone();
        Ok(())
    }

    async fn delete(&self, id: &SightingId) -> Result<(), ApiError> {
        self.begin()?;
        let mut remote = self.inner.remote.lock().unwrap();
        let index = remote
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(Self::not_found)?;
        remote.remove(index);
        Ok(())
    }
}

impl AuthApi for FakeBackend {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        self.begin()?;
        let accounts = self.inner.accounts.lock().unwrap();
        match accounts.get(email) {
            Some((stored, user)) if stored == password => Ok(AuthResponse {
                token: format!("token-{}", user.id),
                user: user.clone(),
            }),
            _ => Err(ApiError::Rejected {
                status: 401,
                message: "Invalid email or password".to_string(),
            }),
        }
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, ApiError> {
        self.begin()?;
        let taken = self
            .inner
            .accounts
            .lock()
            .unwrap()
            .values()
            .any(|(_, u)| u.email == request.email || u.username == request.username);
        if taken {
            return Err(ApiError::Rejected {
                status: 409,
                message: "Username or email already exists".to_string(),
            });
        }

        let id = self.next_id().to_string();
        self.register(&id, &request.username, &request.email, &request.password);
        self.login(&request.email, &request.password).await
    }
}
