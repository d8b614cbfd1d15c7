use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EntityKind, EntityRecord, EntitySchema, defaults, iso_date, random_reference};

closed_set! {
    MedicalRecordStatus {
        Completed => "completed",
        Scheduled => "scheduled",
        Pending => "pending",
        Canceled => "canceled",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    pub id: String,
    pub owner_id: String,
    pub record_id: String,
    pub title: String,
    pub date: String,
    pub doctor: String,
    pub status: MedicalRecordStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub document_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const MEDICAL_RECORD_SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::MedicalRecord,
    id_prefix: "rec",
    status_field: "status",
    required_fields: &["title", "date", "doctor"],
    create_failed_message: "Échec de création du dossier. Veuillez réessayer.",
    delete_failed_message: "Échec de la suppression du dossier. Veuillez réessayer.",
    load_failed_message: "Impossible de charger les dossiers médicaux.",
    login_required_message: "Vous devez être connecté pour ajouter un dossier médical",
};

impl EntityRecord for MedicalRecord {
    type Status = MedicalRecordStatus;

    const SCHEMA: &'static EntitySchema = &MEDICAL_RECORD_SCHEMA;

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
            self.title.as_str(),
            self.doctor.as_str(),
            self.description.as_str(),
        ]
    }

    fn service_defaults(now: DateTime<Utc>) -> Map<String, Value> {
        defaults([
            ("title", Value::String(String::new())),
            ("doctor", Value::String(String::new())),
            ("date", iso_date(now)),
            ("status", Value::from("pending")),
            ("recordId", random_reference("REC", 6)),
            ("description", Value::String(String::new())),
        ])
    }

    fn form_defaults(_now: DateTime<Utc>) -> Map<String, Value> {
        defaults([
            ("title", Value::String(String::new())),
            ("date", Value::String(String::new())),
            ("doctor", Value::String(String::new())),
            ("description", Value::String(String::new())),
            ("status", Value::from("completed")),
        ])
    }
}
