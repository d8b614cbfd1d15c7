use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::clock::Clock;
use crate::entity::EntityRecord;
use crate::error::PortalError;
use crate::guard::{ActionGate, PendingAction, RouteGuard};
use crate::identity::Identity;
use crate::routing::{AppRoute, RedirectState};
use crate::service::EntityService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Editing,
    Submitting,
    Closed,
}

/// What the first half of a submit decided.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitStep {
    /// Validated and now `Submitting`; hand the payload to the create call.
    Ready(Map<String, Value>),
    /// Required fields left blank. No call was made.
    Invalid(Vec<String>),
    /// Not signed in. The payload is parked and the form is closed.
    Redirect { to: AppRoute, state: RedirectState },
    /// A submit is already in flight.
    Busy,
    /// The form is closed.
    Inactive,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<T> {
    Created(T),
    Invalid(Vec<String>),
    Redirect { to: AppRoute, state: RedirectState },
    Failed(String),
    Busy,
    Inactive,
}

/// Creation form for one entity type.
///
/// Defaults, including the "now" derived ones, are captured once when the
/// form opens.
#[derive(Debug, Clone)]
pub struct ModalForm<T> {
    fields: Map<String, Value>,
    opened_at: DateTime<Utc>,
    phase: FormPhase,
    error: Option<String>,
    _record: PhantomData<fn() -> T>,
}

impl<T: EntityRecord> ModalForm<T> {
    pub fn open(clock: &dyn Clock) -> Self {
        let opened_at = clock.now();
        Self {
            fields: T::form_defaults(opened_at),
            opened_at,
            phase: FormPhase::Editing,
            error: None,
            _record: PhantomData,
        }
    }

    /// Reopens with input parked before a login redirect. `None` when the
    /// parked action belongs to another entity type.
    pub fn resume(clock: &dyn Clock, pending: PendingAction) -> Option<Self> {
        if pending.action != T::SCHEMA.kind {
            return None;
        }
        let mut form = Self::open(clock);
        for (name, value) in pending.payload {
            form.fields.insert(name, value);
        }
        tracing::debug!(
            target: "medtracker.form",
            kind = T::SCHEMA.kind.as_str(),
            from = %pending.from,
            "resumed pending form input",
        );
        Some(form)
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Ignored unless the form is editing.
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) {
        if self.phase != FormPhase::Editing {
            return;
        }
        self.fields.insert(name.to_string(), value.into());
        self.error = None;
    }

    /// Required fields that are absent, null or blank, in schema order.
    pub fn validate(&self) -> Vec<String> {
        T::SCHEMA
            .required_fields
            .iter()
            .filter(|name| is_blank(self.fields.get(**name)))
            .map(|name| (*name).to_string())
            .collect()
    }

    pub fn cancel(&mut self) {
        self.phase = FormPhase::Closed;
        self.fields.clear();
        self.error = None;
    }

    /// First half of a submit. A gated submit parks the input against the
    /// entity's list page.
    pub fn begin_submit(&mut self, guard: &RouteGuard, identity: Option<&Identity>) -> SubmitStep {
        match self.phase {
            FormPhase::Submitting => return SubmitStep::Busy,
            FormPhase::Closed => return SubmitStep::Inactive,
            FormPhase::Editing => {}
        }

        let missing = self.validate();
        if !missing.is_empty() {
            self.error = Some(PortalError::missing_fields(missing.clone()).user_message());
            return SubmitStep::Invalid(missing);
        }

        let from = AppRoute::for_entity(T::SCHEMA.kind);
        match guard.gate_action(identity, &from, T::SCHEMA.kind, &self.fields) {
            Ok(ActionGate::Proceed) => {}
            Ok(ActionGate::Redirect { to, state }) => {
                self.phase = FormPhase::Closed;
                self.error = Some(T::SCHEMA.login_required_message.to_string());
                return SubmitStep::Redirect { to, state };
            }
            Err(error) => {
                tracing::warn!(
                    target: "medtracker.form",
                    kind = T::SCHEMA.kind.as_str(),
                    error = %error,
                    "could not park form input before login redirect",
                );
                self.error = Some(error.user_message());
                return SubmitStep::Invalid(Vec::new());
            }
        }

        self.phase = FormPhase::Submitting;
        self.error = None;
        SubmitStep::Ready(self.fields.clone())
    }

    /// Second half of a submit. Success closes and clears the form; failure
    /// returns to editing with the entity's static error message.
    pub fn finish_submit(&mut self, result: Result<T, PortalError>) -> SubmitOutcome<T> {
        if self.phase != FormPhase::Submitting {
            return SubmitOutcome::Inactive;
        }
        match result {
            Ok(record) => {
                tracing::info!(
                    target: "medtracker.form",
                    kind = T::SCHEMA.kind.as_str(),
                    id = record.id(),
                    "form submitted",
                );
                self.phase = FormPhase::Closed;
                self.fields.clear();
                self.error = None;
                SubmitOutcome::Created(record)
            }
            Err(error) => {
                tracing::warn!(
                    target: "medtracker.form",
                    kind = T::SCHEMA.kind.as_str(),
                    error = %error,
                    "form submit failed",
                );
                let message = T::SCHEMA.create_failed_message.to_string();
                self.phase = FormPhase::Editing;
                self.error = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Full submit through the entity service, owned by the signed-in user.
    pub async fn submit(
        &mut self,
        guard: &RouteGuard,
        identity: Option<&Identity>,
        service: &EntityService<T>,
    ) -> SubmitOutcome<T> {
        let payload = match self.begin_submit(guard, identity) {
            SubmitStep::Ready(payload) => payload,
            SubmitStep::Invalid(missing) => return SubmitOutcome::Invalid(missing),
            SubmitStep::Redirect { to, state } => return SubmitOutcome::Redirect { to, state },
            SubmitStep::Busy => return SubmitOutcome::Busy,
            SubmitStep::Inactive => return SubmitOutcome::Inactive,
        };
        let result = match identity {
            Some(owner) => service.create(&owner.id, payload).await,
            None => Err(PortalError::NotFound("no current session".to_string())),
        };
        self.finish_submit(result)
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}
