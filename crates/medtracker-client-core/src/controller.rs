use serde_json::{Map, Value};

use crate::entity::{EntityRecord, EntityStatus};
use crate::error::PortalError;
use crate::filter::{FilterState, StatusFilter, filter_records, status_summary};
use crate::identity::Identity;
use crate::service::EntityService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    /// Recorded, never retried automatically.
    Error(PortalError),
}

/// Which service read a load maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadScope {
    All,
    Owner(String),
}

impl LoadScope {
    /// Employees always see their own records. Privileged roles see everything
    /// unless they narrow to one owner.
    pub fn for_identity(identity: &Identity, target_owner: Option<&str>) -> Self {
        if !identity.role.is_privileged() {
            return Self::Owner(identity.id.clone());
        }
        match target_owner.map(str::trim).filter(|owner| !owner.is_empty()) {
            Some(owner) => Self::Owner(owner.to_string()),
            None => Self::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// A load that has been started but whose fetch has not run yet.
pub struct LoadRequest<T: EntityRecord> {
    ticket: LoadTicket,
    scope: LoadScope,
    service: EntityService<T>,
}

impl<T: EntityRecord> LoadRequest<T> {
    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }

    pub fn scope(&self) -> &LoadScope {
        &self.scope
    }

    pub async fn execute(self) -> LoadOutcome<T> {
        let result = match &self.scope {
            LoadScope::All => self.service.list_all().await,
            LoadScope::Owner(owner_id) => self.service.list_by_owner(owner_id).await,
        };
        LoadOutcome {
            ticket: self.ticket,
            result,
        }
    }
}

pub struct LoadOutcome<T> {
    ticket: LoadTicket,
    result: Result<Vec<T>, PortalError>,
}

impl<T> LoadOutcome<T> {
    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }
}

/// An optimistic removal waiting for the service call.
pub struct DeleteRequest<T: EntityRecord> {
    id: String,
    service: EntityService<T>,
}

impl<T: EntityRecord> DeleteRequest<T> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn execute(self) -> DeleteOutcome {
        let result = self.service.delete(&self.id).await;
        DeleteOutcome {
            id: self.id,
            result,
        }
    }
}

pub struct DeleteOutcome {
    id: String,
    result: Result<(), PortalError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteResult {
    /// The confirmation step declined.
    Cancelled,
    /// Nothing with that id is displayed.
    Unknown,
    Deleted,
    /// The service call failed and the record is back in its original slot.
    RolledBack(PortalError),
}


/// State behind one list page: the fetched collection, the live filters, and
/// optimistic add/delete against the entity service.
pub struct CollectionController<T: EntityRecord> {
    service: EntityService<T>,
    state: LoadState,
    records: Vec<T>,
    filter: FilterState<T::Status>,
    issued: u64,
    /// Ids in the order they were fetched or added, including rows hidden by
    /// an in-flight delete. Rollbacks restore against this.
    layout: Vec<String>,
    in_flight_deletes: Vec<T>,
    inline_error: Option<String>,
}

impl<T: EntityRecord> CollectionController<T> {
    pub fn new(service: EntityService<T>) -> Self {
        Self {
            service,
            state: LoadState::Idle,
            records: Vec::new(),
            filter: FilterState::default(),
            issued: 0,
            layout: Vec::new(),
            in_flight_deletes: Vec::new(),
            inline_error: None,
        }
    }

    pub fn service(&self) -> &EntityService<T> {
        &self.service
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn filter(&self) -> &FilterState<T::Status> {
        &self.filter
    }

    /// Localized message for the last failed mutation, shown next to the list.
    pub fn inline_error(&self) -> Option<&str> {
        self.inline_error.as_deref()
    }

    pub fn clear_inline_error(&mut self) {
        self.inline_error = None;
    }

    /// Localized message when the last load failed.
    pub fn load_error_message(&self) -> Option<&'static str> {
        match self.state {
            LoadState::Error(_) => Some(T::SCHEMA.load_failed_message),
            _ => None,
        }
    }

    /// Starts a load for `identity`. Any earlier in-flight load becomes stale.
    pub fn begin_load(&mut self, identity: &Identity, target_owner: Option<&str>) -> LoadRequest<T> {
        self.issued += 1;
        let scope = LoadScope::for_identity(identity, target_owner);
        self.state = LoadState::Loading;
        tracing::debug!(
            target: "medtracker.controller",
            kind = T::SCHEMA.kind.as_str(),
            ticket = self.issued,
            user_id = %identity.id,
            scope = ?scope,
            "load started",
        );
        LoadRequest {
            ticket: LoadTicket(self.issued),
            scope,
            service: self.service.clone(),
        }
    }

    /// Applies a finished load. Returns `false` when the outcome was stale
    /// and discarded.
    pub fn complete_load(&mut self, outcome: LoadOutcome<T>) -> bool {
        if outcome.ticket != LoadTicket(self.issued) {
            tracing::warn!(
                target: "medtracker.controller",
                kind = T::SCHEMA.kind.as_str(),
                ticket = outcome.ticket.0,
                latest = self.issued,
                "discarding stale load result",
            );
            return false;
        }

        match outcome.result {
            Ok(records) => {
                tracing::debug!(
                    target: "medtracker.controller",
                    kind = T::SCHEMA.kind.as_str(),
                    count = records.len(),
                    "load ready",
                );
                self.apply_fetched(records);
                self.state = LoadState::Ready;
            }
            Err(error) => {
                tracing::warn!(
                    target: "medtracker.controller",
                    kind = T::SCHEMA.kind.as_str(),
                    error = %error,
                    "load failed",
                );
                self.state = LoadState::Error(error);
            }
        }
        true
    }

    pub async fn load(&mut self, identity: &Identity, target_owner: Option<&str>) -> &LoadState {
        let request = self.begin_load(identity, target_owner);
        let outcome = request.execute().await;
        self.complete_load(outcome);
        &self.state
    }

    /// Back to `Idle` with nothing displayed, e.g. after logout. In-flight
    /// loads are invalidated.
    pub fn reset(&mut self) {
        self.issued += 1;
        self.state = LoadState::Idle;
        self.records.clear();
        self.layout.clear();
        self.in_flight_deletes.clear();
        self.inline_error = None;
    }

    // Rows whose delete is still in flight stay hidden. A pending delete whose
    // row is gone from the fresh list has nothing left to restore.
    fn apply_fetched(&mut self, records: Vec<T>) {
        self.layout = records.iter().map(|record| record.id().to_string()).collect();
        self.in_flight_deletes
            .retain(|pending| records.iter().any(|record| record.id() == pending.id()));
        let hidden = &self.in_flight_deletes;
        self.records = records
            .into_iter()
            .filter(|record| hidden.iter().all(|pending| pending.id() != record.id()))
            .collect();
    }

    fn layout_rank(&self, id: &str) -> usize {
        self.layout
            .iter()
            .position(|candidate| candidate == id)
            .unwrap_or(self.layout.len())
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.filter.search_term = term.into();
    }

    pub fn set_status_filter(&mut self, raw: &str) {
        self.filter.status = StatusFilter::parse(raw);
    }

    pub fn set_filter(&mut self, filter: FilterState<T::Status>) {
        self.filter = filter;
    }

    /// Displayed rows. Recomputed on every call, never refetched.
    pub fn visible(&self) -> Vec<&T> {
        filter_records(&self.records, &self.filter)
    }

    pub fn status_summary(&self) -> Vec<(T::Status, usize)> {
        status_summary(&self.records)
    }

    /// Status labels offered by the filter dropdown, `all` first.
    pub fn status_options() -> Vec<&'static str> {
        std::iter::once(crate::filter::ALL_STATUSES)
            .chain(
                <T::Status as EntityStatus>::ALL
                    .iter()
                    .map(|status| status.as_str()),
            )
            .collect()
    }

    /// Appends a record produced elsewhere (a modal form's successful submit).
    pub fn add_local(&mut self, record: T) {
        if let Some(existing) = self.records.iter_mut().find(|row| row.id() == record.id()) {
            *existing = record;
        } else {
            if !self.layout.iter().any(|id| id == record.id()) {
                self.layout.push(record.id().to_string());
            }
            self.records.push(record);
        }
    }

    /// Creates through the service on behalf of `owner` and shows the result.
    pub async fn create(
        &mut self,
        owner: &Identity,
        draft: Map<String, Value>,
    ) -> Result<T, PortalError> {
        match self.service.create(&owner.id, draft).await {
            Ok(record) => {
                self.inline_error = None;
                self.add_local(record.clone());
                Ok(record)
            }
            Err(error) => {
                tracing::warn!(
                    target: "medtracker.controller",
                    kind = T::SCHEMA.kind.as_str(),
                    error = %error,
                    "create failed",
                );
                self.inline_error = Some(T::SCHEMA.create_failed_message.to_string());
                Err(error)
            }
        }
    }

    /// Removes `id` from the displayed list right away. `None` when it is
    /// not displayed.
    pub fn begin_delete(&mut self, id: &str) -> Option<DeleteRequest<T>> {
        let position = self.records.iter().position(|record| record.id() == id)?;
        let record = self.records.remove(position);
        self.in_flight_deletes.push(record);
        self.inline_error = None;
        Some(DeleteRequest {
            id: id.to_string(),
            service: self.service.clone(),
        })
    }

    pub fn finish_delete(&mut self, outcome: DeleteOutcome) -> DeleteResult {
        let Some(slot) = self
            .in_flight_deletes
            .iter()
            .position(|pending| pending.id() == outcome.id)
        else {
            // Reset or reloaded away while the call was in flight.
            return match outcome.result {
                Ok(()) => DeleteResult::Deleted,
                Err(error) => DeleteResult::RolledBack(error),
            };
        };
        let pending = self.in_flight_deletes.remove(slot);

        match outcome.result {
            Ok(()) => {
                tracing::debug!(
                    target: "medtracker.controller",
                    kind = T::SCHEMA.kind.as_str(),
                    id = %outcome.id,
                    "delete confirmed",
                );
                self.layout.retain(|id| *id != outcome.id);
                DeleteResult::Deleted
            }
            Err(error) => {
                tracing::warn!(
                    target: "medtracker.controller",
                    kind = T::SCHEMA.kind.as_str(),
                    id = %outcome.id,
                    error = %error,
                    "delete failed; restoring record",
                );
                if !self.records.iter().any(|record| record.id() == outcome.id) {
                    let rank = self.layout_rank(&outcome.id);
                    let position = self
                        .records
                        .iter()
                        .position(|record| self.layout_rank(record.id()) > rank)
                        .unwrap_or(self.records.len());
                    self.records.insert(position, pending);
                }
                self.inline_error = Some(T::SCHEMA.delete_failed_message.to_string());
                DeleteResult::RolledBack(error)
            }
        }
    }

    /// Confirm, remove optimistically, call the service, roll back on failure.
    pub async fn delete(&mut self, id: &str, confirm: impl FnOnce(&T) -> bool) -> DeleteResult {
        let Some(record) = self.records.iter().find(|record| record.id() == id) else {
            return DeleteResult::Unknown;
        };
        if !confirm(record) {
            return DeleteResult::Cancelled;
        }
        let Some(request) = self.begin_delete(id) else {
            return DeleteResult::Unknown;
        };
        let outcome = request.execute().await;
        self.finish_delete(outcome)
    }
}
