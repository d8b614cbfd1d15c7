//! Managed entity records and the declarative schema each one carries.
//!
//! Every record type is the same shape to the service and controllers: an
//! id, an owner back-reference, a status from a closed set, audit timestamps
//! and opaque data-entry fields. The per-type differences (id prefix,
//! required fields, searchable fields, defaults, localized failure messages)
//! live in an [`EntitySchema`] and a handful of trait methods.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    MedicalRecord,
    Appointment,
    Adherent,
    Contrat,
    Declaration,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MedicalRecord => "medical_record",
            Self::Appointment => "appointment",
            Self::Adherent => "adherent",
            Self::Contrat => "contrat",
            Self::Declaration => "declaration",
        }
    }
}

#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,
    pub id_prefix: &'static str,
    /// Serialized name of the status field (`status` or `statut`).
    pub status_field: &'static str,
    /// Form fields that must be non-blank before a create call is made.
    pub required_fields: &'static [&'static str],
    pub create_failed_message: &'static str,
    pub delete_failed_message: &'static str,
    pub load_failed_message: &'static str,
    pub login_required_message: &'static str,
}

/// A closed value set serialized by its display label.
pub trait EntityStatus: Copy + Eq + Debug + Send + Sync + 'static {
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;

    /// Case-insensitive match against the closed set.
    fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str().to_lowercase() == needle)
    }
}

macro_rules! closed_set {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $crate::entity::EntityStatus for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::entity::EntityStatus::as_str(*self))
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str($crate::entity::EntityStatus::as_str(*self))
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                <Self as $crate::entity::EntityStatus>::parse(&raw).ok_or_else(|| {
                    <D::Error as ::serde::de::Error>::custom(format!(
                        "unknown {} `{raw}`",
                        stringify!($name)
                    ))
                })
            }
        }
    };
}

mod adherent;
mod appointment;
mod contrat;
mod declaration;
mod medical_record;

pub use adherent::{Adherent, AdherentStatus};
pub use appointment::{Appointment, AppointmentStatus};
pub use contrat::{Contrat, ContratStatus, ContratType};
pub use declaration::{Declaration, DeclarationStatus};
pub use medical_record::{MedicalRecord, MedicalRecordStatus};

pub trait EntityRecord:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Status: EntityStatus;

    const SCHEMA: &'static EntitySchema;

    fn id(&self) -> &str;
    fn owner_id(&self) -> &str;
    fn status(&self) -> Self::Status;

    /// Values matched by the list page's free-text search.
    fn searchable(&self) -> Vec<&str>;

    /// Values the service fills in when a create payload leaves them out.
    fn service_defaults(now: DateTime<Utc>) -> Map<String, Value>;

    /// Initial state of a freshly opened creation form.
    fn form_defaults(now: DateTime<Utc>) -> Map<String, Value>;
}

pub(crate) fn iso_date(now: DateTime<Utc>) -> Value {
    Value::String(now.format("%Y-%m-%d").to_string())
}

pub(crate) fn random_reference(prefix: &str, digits: u32) -> Value {
    let low = 10_u32.pow(digits - 1);
    let number = rand::rng().random_range(low..low * 10);
    Value::String(format!("{prefix}-{number}"))
}

pub(crate) fn defaults<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
