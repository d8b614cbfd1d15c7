//! Client core for the MedTracker insurance portal: session persistence,
//! protected-route gating, and the generic list/form machinery shared by
//! every managed entity page.
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod app;
pub mod clock;
pub mod config;
pub mod controller;
pub mod entity;
pub mod error;
pub mod filter;
pub mod form;
pub mod guard;
pub mod identity;
pub mod latency;
pub mod routing;
pub mod seed;
pub mod service;
pub mod session;
pub mod storage;

pub use app::{EntityServices, ManagedEntity, PortalApp};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, PortalConfig};
pub use controller::{CollectionController, DeleteResult, LoadScope, LoadState};
pub use entity::{EntityKind, EntityRecord, EntitySchema, EntityStatus};
pub use error::PortalError;
pub use filter::{FilterState, StatusFilter, filter_records};
pub use form::{FormPhase, ModalForm, SubmitOutcome, SubmitStep};
pub use guard::{ActionGate, GuardDecision, PendingAction, PendingActionSlot, RouteGuard};
pub use identity::{Identity, Profile, ProfileUpdate, Role};
pub use latency::SimulatedLatency;
pub use routing::{AppRoute, RedirectState};
pub use service::{EntityService, EntityStore};
pub use session::{IdentityProvider, MemoryIdentityProvider, SessionStore};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
