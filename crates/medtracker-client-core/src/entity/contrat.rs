use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EntityKind, EntityRecord, EntitySchema, EntityStatus, defaults};

closed_set! {
    ContratStatus {
        Actif => "Actif",
        ARenouveler => "À renouveler",
        Expire => "Expiré",
    }
}

closed_set! {
    ContratType {
        Individuel => "Individuel",
        Groupe => "Groupe",
    }
}

/// Insurance contract. `id_adherent` is an unvalidated member number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contrat {
    pub id: String,
    pub owner_id: String,
    pub numero: String,
    pub numero_police: String,
    #[serde(rename = "type")]
    pub contrat_type: ContratType,
    pub date_debut: String,
    pub date_fin: String,
    pub statut: ContratStatus,
    #[serde(default)]
    pub montant: f64,
    pub id_adherent: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const CONTRAT_SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Contrat,
    id_prefix: "cnt",
    status_field: "statut",
    required_fields: &[
        "numero",
        "numeroPolice",
        "dateDebut",
        "dateFin",
        "type",
        "idAdherent",
    ],
    create_failed_message: "Échec de la création du contrat. Veuillez réessayer.",
    delete_failed_message: "Échec de la suppression du contrat. Veuillez réessayer.",
    load_failed_message: "Impossible de charger les contrats.",
    login_required_message: "Vous devez être connecté pour ajouter un contrat",
};

impl EntityRecord for Contrat {
    type Status = ContratStatus;

    const SCHEMA: &'static EntitySchema = &CONTRAT_SCHEMA;

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.owner_id
    }

    fn status(&self) -> Self::Status {
        self.statut
    }

    fn searchable(&self) -> Vec<&str> {
        vec![
            self.numero.as_str(),
            self.contrat_type.as_str(),
            self.numero_police.as_str(),
        ]
    }

    fn service_defaults(_now: DateTime<Utc>) -> Map<String, Value> {
        defaults([
            ("numero", Value::String(String::new())),
            ("numeroPolice", Value::String(String::new())),
            ("type", Value::from("Individuel")),
            ("dateDebut", Value::String(String::new())),
            ("dateFin", Value::String(String::new())),
            ("statut", Value::from("Actif")),
            ("montant", Value::from(0.0)),
            ("idAdherent", Value::String(String::new())),
        ])
    }

    fn form_defaults(_now: DateTime<Utc>) -> Map<String, Value> {
        defaults([
            ("numero", Value::String(String::new())),
            ("numeroPolice", Value::String(String::new())),
            ("dateDebut", Value::String(String::new())),
            ("dateFin", Value::String(String::new())),
            ("type", Value::from("Individuel")),
            ("idAdherent", Value::String(String::new())),
        ])
    }
}
