use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EntityKind, EntityRecord, EntitySchema, defaults, iso_date};

closed_set! {
    AppointmentStatus {
        Confirmed => "confirmed",
        Scheduled => "scheduled",
        Pending => "pending",
        Canceled => "canceled",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub owner_id: String,
    #[serde(rename = "type")]
    pub appointment_type: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub doctor_name: String,
    #[serde(default)]
    pub location: String,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const APPOINTMENT_SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Appointment,
    id_prefix: "apt",
    status_field: "status",
    required_fields: &["type", "date", "time"],
    create_failed_message: "Échec de la création du rendez-vous. Veuillez réessayer.",
    delete_failed_message: "Échec de la suppression du rendez-vous. Veuillez réessayer.",
    load_failed_message: "Impossible de charger les rendez-vous.",
    login_required_message: "Vous devez être connecté pour prendre un rendez-vous",
};

impl EntityRecord for Appointment {
    type Status = AppointmentStatus;

    const SCHEMA: &'static EntitySchema = &APPOINTMENT_SCHEMA;

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.owner_id
    }

    fn status(&self) -> Self::Status {
        self.status
    }

    fn searchable(&self) -> Vec<&str> {
        vec![
            self.appointment_type.as_str(),
            self.doctor_name.as_str(),
            self.location.as_str(),
        ]
    }

    fn service_defaults(now: DateTime<Utc>) -> Map<String, Value> {
        defaults([
            ("type", Value::String(String::new())),
            ("date", iso_date(now)),
            ("time", Value::from("09:00")),
            ("doctorName", Value::String(String::new())),
            ("location", Value::String(String::new())),
            ("status", Value::from("scheduled")),
            ("notes", Value::String(String::new())),
        ])
    }

    fn form_defaults(_now: DateTime<Utc>) -> Map<String, Value> {
        defaults([
            ("type", Value::String(String::new())),
            ("date", Value::String(String::new())),
            ("time", Value::String(String::new())),
            ("doctorName", Value::String(String::new())),
            ("location", Value::String(String::new())),
            ("notes", Value::String(String::new())),
            ("status", Value::from("scheduled")),
        ])
    }
}
