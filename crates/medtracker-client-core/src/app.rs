use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::PortalConfig;
use crate::controller::CollectionController;
use crate::entity::{Adherent, Appointment, Contrat, Declaration, EntityRecord, MedicalRecord};
use crate::error::PortalError;
use crate::form::ModalForm;
use crate::guard::{GuardDecision, PendingActionSlot, RouteGuard};
use crate::identity::Identity;
use crate::latency::SimulatedLatency;
use crate::routing::{AppRoute, RedirectState};
use crate::seed::DemoDataset;
use crate::service::{self, EntityService};
use crate::session::{MemoryIdentityProvider, SessionStore};
use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage};

/// One service per managed entity type, sharing a clock and latency.
#[derive(Clone)]
pub struct EntityServices {
    pub medical_records: EntityService<MedicalRecord>,
    pub appointments: EntityService<Appointment>,
    pub adherents: EntityService<Adherent>,
    pub contrats: EntityService<Contrat>,
    pub declarations: EntityService<Declaration>,
}

impl EntityServices {
    pub fn in_memory(dataset: &DemoDataset, clock: Arc<dyn Clock>, latency: SimulatedLatency) -> Self {
        Self {
            medical_records: EntityService::new(
                service::memory(dataset.medical_records.clone()),
                clock.clone(),
                latency,
            ),
            appointments: EntityService::new(
                service::memory(dataset.appointments.clone()),
                clock.clone(),
                latency,
            ),
            adherents: EntityService::new(
                service::memory(dataset.adherents.clone()),
                clock.clone(),
                latency,
            ),
            contrats: EntityService::new(
                service::memory(dataset.contrats.clone()),
                clock.clone(),
                latency,
            ),
            declarations: EntityService::new(
                service::memory(dataset.declarations.clone()),
                clock,
                latency,
            ),
        }
    }

    pub fn get<T: ManagedEntity>(&self) -> &EntityService<T> {
        T::service(self)
    }
}

/// Entity types the application root knows how to serve.
pub trait ManagedEntity: EntityRecord {
    fn service(services: &EntityServices) -> &EntityService<Self>;
}

macro_rules! managed_entity {
    ($($record:ty => $field:ident),+ $(,)?) => {
        $(
            impl ManagedEntity for $record {
                fn service(services: &EntityServices) -> &EntityService<Self> {
                    &services.$field
                }
            }
        )+
    };
}

managed_entity! {
    MedicalRecord => medical_records,
    Appointment => appointments,
    Adherent => adherents,
    Contrat => contrats,
    Declaration => declarations,
}

/// Application root. Owns every store; nothing is ambient.
pub struct PortalApp {
    clock: Arc<dyn Clock>,
    session: SessionStore,
    guard: RouteGuard,
    services: EntityServices,
    route: AppRoute,
    redirect: Option<RedirectState>,
}

impl PortalApp {
    /// Wires the application from configuration and restores any persisted
    /// session.
    pub fn bootstrap(config: &PortalConfig) -> Self {
        Self::bootstrap_with_clock(config, Arc::new(SystemClock))
    }

    pub fn bootstrap_with_clock(config: &PortalConfig, clock: Arc<dyn Clock>) -> Self {
        let durable: Arc<dyn KeyValueStorage> = match &config.state_dir {
            Some(dir) => Arc::new(FileStorage::new(dir)),
            None => Arc::new(MemoryStorage::new()),
        };
        let dataset = if config.seed_demo_data {
            DemoDataset::build(clock.now())
        } else {
            DemoDataset::default()
        };
        tracing::info!(
            target: "medtracker.app",
            state_dir = ?config.state_dir,
            latency_ms = config.latency.delay().as_millis() as u64,
            seeded = config.seed_demo_data,
            "bootstrapping portal",
        );
        Self::from_parts(
            durable,
            Arc::new(MemoryStorage::new()),
            clock,
            config.latency,
            dataset,
        )
    }

    /// `durable` holds the session blob and registered users; `tab` holds
    /// the resumable slot.
    pub fn from_parts(
        durable: Arc<dyn KeyValueStorage>,
        tab: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
        latency: SimulatedLatency,
        dataset: DemoDataset,
    ) -> Self {
        let provider = Arc::new(MemoryIdentityProvider::with_registry(
            dataset.users.clone(),
            durable.clone(),
            clock.clone(),
            latency,
        ));
        let mut session = SessionStore::new(provider, durable);
        session.restore();

        Self {
            guard: RouteGuard::new(PendingActionSlot::new(tab), clock.clone()),
            services: EntityServices::in_memory(&dataset, clock.clone(), latency),
            clock,
            session,
            route: AppRoute::Dashboard,
            redirect: None,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionStore {
        &mut self.session
    }

    pub fn current_identity(&self) -> Option<&Identity> {
        self.session.current()
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn services(&self) -> &EntityServices {
        &self.services
    }

    pub fn route(&self) -> &AppRoute {
        &self.route
    }

    /// Route state left by the last redirect to login.
    pub fn redirect_state(&self) -> Option<&RedirectState> {
        self.redirect.as_ref()
    }

    pub fn navigate(&mut self, path: &str) -> GuardDecision {
        let requested = AppRoute::from_path(path);
        let decision = self.guard.check(&requested, self.session.current());
        match &decision {
            GuardDecision::Render(route) => self.route = route.clone(),
            GuardDecision::Redirect { to, state } => {
                self.route = to.clone();
                self.redirect = Some(state.clone());
            }
        }
        decision
    }

    /// Records a redirect produced outside navigation, e.g. a gated form submit.
    pub fn follow_redirect(&mut self, to: AppRoute, state: RedirectState) {
        self.route = to;
        self.redirect = Some(state);
    }

    /// Signs in and returns where the user lands: the remembered destination,
    /// or the dashboard.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<AppRoute, PortalError> {
        self.session.login(email, password).await?;
        Ok(self.land_after_auth())
    }

    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AppRoute, PortalError> {
        self.session.register(name, email, password).await?;
        Ok(self.land_after_auth())
    }

    fn land_after_auth(&mut self) -> AppRoute {
        let destination = RouteGuard::resume_destination(self.redirect.take().as_ref());
        tracing::debug!(
            target: "medtracker.app",
            to = %destination.to_path(),
            "returning to requested page",
        );
        self.route = destination.clone();
        destination
    }

    pub async fn logout(&mut self) {
        self.session.logout().await;
        self.guard.slot().discard();
        self.redirect = None;
        self.route = AppRoute::Login;
    }

    pub fn controller<T: ManagedEntity>(&self) -> CollectionController<T> {
        CollectionController::new(self.services.get::<T>().clone())
    }

    pub fn open_form<T: ManagedEntity>(&self) -> ModalForm<T> {
        ModalForm::open(self.clock.as_ref())
    }

    /// Reopens a form parked before login, consuming the slot. Leaves the
    /// slot alone when it belongs to another entity type.
    pub fn resume_pending_form<T: ManagedEntity>(&self) -> Option<ModalForm<T>> {
        if self.guard.slot().pending_kind() != Some(T::SCHEMA.kind) {
            return None;
        }
        let pending = self.guard.slot().take()?;
        ModalForm::resume(self.clock.as_ref(), pending)
    }

    /// Explicit teardown: clears the tab-scoped slot and drops every store.
    pub fn shutdown(self) {
        self.guard.slot().discard();
        tracing::info!(
            target: "medtracker.app",
            authenticated = self.session.is_authenticated(),
            "portal shut down",
        );
    }
}
