use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::clock::Clock;
use crate::entity::EntityKind;
use crate::error::PortalError;
use crate::identity::Identity;
use crate::routing::{AppRoute, RedirectState};
use crate::storage::KeyValueStorage;

pub const PENDING_ACTION_STORAGE_KEY: &str = "medtracker_pending_action";

/// Unsaved form input parked across a redirect-to-login round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAction {
    pub action: EntityKind,
    pub from: String,
    pub payload: Map<String, Value>,
    pub saved_at: DateTime<Utc>,
}

/// Read-once slot over tab-scoped storage.
#[derive(Clone)]
pub struct PendingActionSlot {
    storage: Arc<dyn KeyValueStorage>,
}

impl PendingActionSlot {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    pub fn save(&self, action: &PendingAction) -> Result<(), PortalError> {
        let payload = serde_json::to_string(action).map_err(|error| {
            PortalError::Storage(format!("failed to encode pending action: {error}"))
        })?;
        self.storage
            .set_item(PENDING_ACTION_STORAGE_KEY, &payload)
            .map_err(PortalError::from)
    }

    /// Which action is waiting, without consuming it.
    pub fn pending_kind(&self) -> Option<EntityKind> {
        self.read().map(|action| action.action)
    }

    /// Consumes the slot. A malformed slot is cleared and reported as empty.
    pub fn take(&self) -> Option<PendingAction> {
        let action = self.read();
        self.discard();
        action
    }

    pub fn discard(&self) {
        if let Err(error) = self.storage.remove_item(PENDING_ACTION_STORAGE_KEY) {
            tracing::warn!(
                target: "medtracker.guard",
                error = %error,
                "failed to clear pending action slot",
            );
        }
    }

    fn read(&self) -> Option<PendingAction> {
        let raw = match self.storage.get_item(PENDING_ACTION_STORAGE_KEY) {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!(
                    target: "medtracker.guard",
                    error = %error,
                    "failed to read pending action slot",
                );
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(action) => Some(action),
            Err(error) => {
                tracing::warn!(
                    target: "medtracker.guard",
                    error = %error,
                    "ignoring malformed pending action slot",
                );
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render(AppRoute),
    Redirect { to: AppRoute, state: RedirectState },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionGate {
    Proceed,
    Redirect { to: AppRoute, state: RedirectState },
}

pub struct RouteGuard {
    slot: PendingActionSlot,
    clock: Arc<dyn Clock>,
}

impl RouteGuard {
    pub fn new(slot: PendingActionSlot, clock: Arc<dyn Clock>) -> Self {
        Self { slot, clock }
    }

    pub fn slot(&self) -> &PendingActionSlot {
        &self.slot
    }

    pub fn check(&self, route: &AppRoute, identity: Option<&Identity>) -> GuardDecision {
        if route.is_public() || identity.is_some() {
            return GuardDecision::Render(route.clone());
        }
        tracing::debug!(
            target: "medtracker.guard",
            from = %route.to_path(),
            "redirecting unauthenticated navigation to login",
        );
        GuardDecision::Redirect {
            to: AppRoute::Login,
            state: RedirectState::from_route(route),
        }
    }

    /// Lets a write through when signed in; otherwise parks the payload and
    /// redirects with `pendingAction` set.
    pub fn gate_action(
        &self,
        identity: Option<&Identity>,
        from: &AppRoute,
        action: EntityKind,
        payload: &Map<String, Value>,
    ) -> Result<ActionGate, PortalError> {
        if identity.is_some() {
            return Ok(ActionGate::Proceed);
        }

        let pending = PendingAction {
            action,
            from: from.to_path(),
            payload: payload.clone(),
            saved_at: self.clock.now(),
        };
        self.slot.save(&pending)?;
        tracing::info!(
            target: "medtracker.guard",
            from = %pending.from,
            action = action.as_str(),
            "parked pending action until login",
        );

        Ok(ActionGate::Redirect {
            to: AppRoute::Login,
            state: RedirectState {
                from: pending.from,
                pending_action: Some(action),
            },
        })
    }

    /// Where to go after a successful login.
    pub fn resume_destination(state: Option<&RedirectState>) -> AppRoute {
        state
            .map(|state| AppRoute::from_path(&state.from))
            .filter(|route| !route.is_public())
            .unwrap_or(AppRoute::Dashboard)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::clock::FixedClock;
    use crate::identity::{Profile, Role};
    use crate::storage::MemoryStorage;

    fn guard() -> (RouteGuard, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 4, 6, 9, 45, 0).unwrap(),
        ));
        (
            RouteGuard::new(PendingActionSlot::new(storage.clone()), clock),
            storage,
        )
    }

    fn identity() -> Identity {
        Identity {
            id: "user-1".to_string(),
            name: "Marie".to_string(),
            email: "marie@example.com".to_string(),
            role: Role::Employee,
            profile: Profile::default(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn protected_route_without_identity_redirects_with_from() {
        let (guard, _) = guard();
        let decision = guard.check(&AppRoute::Contrats, None);
        assert_eq!(
            decision,
            GuardDecision::Redirect {
                to: AppRoute::Login,
                state: RedirectState {
                    from: "/contrats".to_string(),
                    pending_action: None,
                },
            }
        );
    }

    #[test]
    fn public_and_authenticated_routes_render() {
        let (guard, _) = guard();
        assert_eq!(
            guard.check(&AppRoute::Login, None),
            GuardDecision::Render(AppRoute::Login)
        );
        assert_eq!(
            guard.check(&AppRoute::Records, Some(&identity())),
            GuardDecision::Render(AppRoute::Records)
        );
    }

    #[test]
    fn gated_action_parks_payload_once() {
        let (guard, _) = guard();
        let payload = json!({ "nomMaladie": "Grippe" })
            .as_object()
            .cloned()
            .unwrap();

        let gate = guard
            .gate_action(
                None,
                &AppRoute::Declarations,
                EntityKind::Declaration,
                &payload,
            )
            .expect("gate");
        assert_eq!(
            gate,
            ActionGate::Redirect {
                to: AppRoute::Login,
                state: RedirectState {
                    from: "/declarations".to_string(),
                    pending_action: Some(EntityKind::Declaration),
                },
            }
        );

        assert_eq!(guard.slot().pending_kind(), Some(EntityKind::Declaration));
        let pending = guard.slot().take().expect("pending action");
        assert_eq!(pending.payload, payload);
        assert_eq!(pending.from, "/declarations");
        assert!(guard.slot().take().is_none());
    }

    #[test]
    fn gated_action_proceeds_when_signed_in() {
        let (guard, storage) = guard();
        let gate = guard
            .gate_action(
                Some(&identity()),
                &AppRoute::Declarations,
                EntityKind::Declaration,
                &Map::new(),
            )
            .expect("gate");
        assert_eq!(gate, ActionGate::Proceed);
        assert_eq!(
            storage.get_item(PENDING_ACTION_STORAGE_KEY).expect("read"),
            None
        );
    }

    #[test]
    fn malformed_slot_is_cleared() {
        let (guard, storage) = guard();
        storage
            .set_item(PENDING_ACTION_STORAGE_KEY, "[]")
            .expect("seed");
        assert!(guard.slot().take().is_none());
        assert_eq!(
            storage.get_item(PENDING_ACTION_STORAGE_KEY).expect("read"),
            None
        );
    }

    #[test]
    fn resume_destination_falls_back_to_dashboard() {
        assert_eq!(RouteGuard::resume_destination(None), AppRoute::Dashboard);
        let to_login = RedirectState {
            from: "/login".to_string(),
            pending_action: None,
        };
        assert_eq!(
            RouteGuard::resume_destination(Some(&to_login)),
            AppRoute::Dashboard
        );
        let to_records = RedirectState {
            from: "/records".to_string(),
            pending_action: None,
        };
        assert_eq!(
            RouteGuard::resume_destination(Some(&to_records)),
            AppRoute::Records
        );
    }
}
