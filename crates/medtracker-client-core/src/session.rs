use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::error::PortalError;
use crate::identity::{Identity, Profile, ProfileUpdate, Role, normalize_email, normalize_name};
use crate::latency::SimulatedLatency;
use crate::storage::KeyValueStorage;

pub const SESSION_STORAGE_KEY: &str = "medtracker_user";
pub const USER_REGISTRY_KEY: &str = "medtracker_users";

/// Backing user registry. A real deployment swaps this for an HTTP client.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Looks a user up by email. The password is accepted but not verified.
    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, PortalError>;

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, PortalError>;

    async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<Identity, PortalError>;

    async fn sign_out(&self, identity: &Identity) -> Result<(), PortalError>;

    async fn user_count(&self) -> usize;
}

/// In-process user registry. With a registry store attached, registrations
/// and profile edits are written through under [`USER_REGISTRY_KEY`] and
/// survive a restart.
pub struct MemoryIdentityProvider {
    users: Mutex<Vec<Identity>>,
    registry: Option<Arc<dyn KeyValueStorage>>,
    clock: Arc<dyn Clock>,
    latency: SimulatedLatency,
}

impl MemoryIdentityProvider {
    pub fn new(users: Vec<Identity>, clock: Arc<dyn Clock>, latency: SimulatedLatency) -> Self {
        Self {
            users: Mutex::new(users),
            registry: None,
            clock,
            latency,
        }
    }

    /// Starts from `seed` and overlays whatever `registry` already holds.
    pub fn with_registry(
        seed: Vec<Identity>,
        registry: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
        latency: SimulatedLatency,
    ) -> Self {
        let users = overlay_persisted_users(seed, registry.as_ref());
        Self {
            users: Mutex::new(users),
            registry: Some(registry),
            clock,
            latency,
        }
    }

    fn write_through(&self, users: &[Identity]) -> Result<(), PortalError> {
        let Some(registry) = &self.registry else {
            return Ok(());
        };
        let payload = serde_json::to_string(users).map_err(|error| {
            PortalError::Storage(format!("failed to encode user registry: {error}"))
        })?;
        registry.set_item(USER_REGISTRY_KEY, &payload)?;
        Ok(())
    }
}

fn overlay_persisted_users(mut users: Vec<Identity>, registry: &dyn KeyValueStorage) -> Vec<Identity> {
    let raw = match registry.get_item(USER_REGISTRY_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return users,
        Err(error) => {
            tracing::warn!(
                target: "medtracker.session",
                error = %error,
                "failed to read user registry; using seeded users only",
            );
            return users;
        }
    };
    let stored = match serde_json::from_str::<Vec<Identity>>(&raw) {
        Ok(stored) => stored,
        Err(error) => {
            tracing::warn!(
                target: "medtracker.session",
                error = %error,
                "failed to parse user registry; using seeded users only",
            );
            return users;
        }
    };

    for user in stored.into_iter().filter(Identity::is_well_formed) {
        if let Some(existing) = users.iter_mut().find(|known| known.id == user.id) {
            *existing = user;
        } else if !users
            .iter()
            .any(|known| known.email.eq_ignore_ascii_case(&user.email))
        {
            users.push(user);
        }
    }
    users
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn authenticate(&self, email: &str, _password: &str) -> Result<Identity, PortalError> {
        self.latency.pause().await;
        let email = normalize_email(email)?;
        let users = self.users.lock().await;
        users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(&email))
            .cloned()
            .ok_or_else(|| PortalError::NotFound(format!("no user registered for {email}")))
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        _password: &str,
    ) -> Result<Identity, PortalError> {
        self.latency.pause().await;
        let name = normalize_name(name)?;
        let email = normalize_email(email)?;

        let mut users = self.users.lock().await;
        if users
            .iter()
            .any(|user| user.email.eq_ignore_ascii_case(&email))
        {
            return Err(PortalError::Conflict(format!("{email} is already registered")));
        }

        let identity = Identity {
            id: format!("user-{}", uuid::Uuid::now_v7().simple()),
            name,
            email,
            role: Role::Employee,
            profile: Profile::default(),
            created_at: self.clock.now(),
        };
        let mut next = users.to_vec();
        next.push(identity.clone());
        self.write_through(&next)?;
        *users = next;
        Ok(identity)
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<Identity, PortalError> {
        self.latency.pause().await;
        let mut users = self.users.lock().await;
        let mut next = users.to_vec();
        let Some(user) = next.iter_mut().find(|user| user.id == user_id) else {
            return Err(PortalError::NotFound(format!("user {user_id}")));
        };
        update.apply_to(user);
        let updated = user.clone();
        self.write_through(&next)?;
        *users = next;
        Ok(updated)
    }

    async fn sign_out(&self, _identity: &Identity) -> Result<(), PortalError> {
        self.latency.pause().await;
        Ok(())
    }

    async fn user_count(&self) -> usize {
        self.users.lock().await.len()
    }
}

/// Holds the one current identity and mirrors it into durable storage.
pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    storage: Arc<dyn KeyValueStorage>,
    current: Option<Identity>,
}

impl SessionStore {
    pub fn new(provider: Arc<dyn IdentityProvider>, storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            provider,
            storage,
            current: None,
        }
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    pub fn current(&self) -> Option<&Identity> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Reloads the persisted identity. Anything unreadable counts as logged out.
    pub fn restore(&mut self) -> Option<&Identity> {
        self.current = self.load_persisted();
        if let Some(identity) = self.current.as_ref() {
            tracing::info!(
                target: "medtracker.session",
                user_id = %identity.id,
                role = identity.role.as_str(),
                "restored persisted session",
            );
        }
        self.current.as_ref()
    }

    fn load_persisted(&self) -> Option<Identity> {
        let raw = match self.storage.get_item(SESSION_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(error) => {
                tracing::warn!(
                    target: "medtracker.session",
                    error = %error,
                    "failed to read persisted session; starting logged out",
                );
                return None;
            }
        };

        match serde_json::from_str::<Identity>(&raw) {
            Ok(identity) if identity.is_well_formed() => Some(identity),
            Ok(_) => {
                tracing::warn!(
                    target: "medtracker.session",
                    "persisted session has no id or email; starting logged out",
                );
                None
            }
            Err(error) => {
                tracing::warn!(
                    target: "medtracker.session",
                    error = %error,
                    "failed to parse persisted session; starting logged out",
                );
                None
            }
        }
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<Identity, PortalError> {
        let identity = self.provider.authenticate(email, password).await?;
        self.establish(identity)
    }

    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, PortalError> {
        let identity = self.provider.register(name, email, password).await?;
        tracing::info!(
            target: "medtracker.session",
            user_id = %identity.id,
            "registered new identity",
        );
        self.establish(identity)
    }

    pub async fn update_profile(&mut self, update: ProfileUpdate) -> Result<Identity, PortalError> {
        let Some(user_id) = self.current.as_ref().map(|identity| identity.id.clone()) else {
            return Err(PortalError::NotFound("no current session".to_string()));
        };
        let identity = self.provider.update_profile(&user_id, update).await?;
        self.establish(identity).inspect_err(|error| {
            tracing::warn!(
                target: "medtracker.session",
                user_id = %user_id,
                error = %error,
                "profile saved by the provider but the session blob was not updated",
            );
        })
    }

    /// Always ends logged out. Provider and storage failures are logged only.
    pub async fn logout(&mut self) {
        if let Some(identity) = self.current.as_ref() {
            if let Err(error) = self.provider.sign_out(identity).await {
                tracing::warn!(
                    target: "medtracker.session",
                    user_id = %identity.id,
                    error = %error,
                    "sign-out call failed; clearing local session anyway",
                );
            }
        }

        if let Err(error) = self.storage.remove_item(SESSION_STORAGE_KEY) {
            tracing::warn!(
                target: "medtracker.session",
                error = %error,
                "failed to clear persisted session",
            );
        }
        self.current = None;
        tracing::info!(target: "medtracker.session", "session cleared");
    }

    // Storage is written before the in-memory swap so readers never see a
    // session that was not persisted.
    fn establish(&mut self, identity: Identity) -> Result<Identity, PortalError> {
        let payload = serde_json::to_string(&identity).map_err(|error| {
            PortalError::Storage(format!("failed to encode session: {error}"))
        })?;
        self.storage.set_item(SESSION_STORAGE_KEY, &payload)?;
        tracing::info!(
            target: "medtracker.session",
            user_id = %identity.id,
            role = identity.role.as_str(),
            "session established",
        );
        self.current = Some(identity.clone());
        Ok(identity)
    }
}
