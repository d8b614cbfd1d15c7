use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EntityKind, EntityRecord, EntitySchema, defaults, iso_date, random_reference};

closed_set! {
    AdherentStatus {
        Actif => "Actif",
        Inactif => "Inactif",
        EnAttente => "En attente",
    }
}

/// Insurance plan member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adherent {
    pub id: String,
    pub owner_id: String,
    pub numero_adherent: String,
    pub nom: String,
    pub prenom: String,
    pub email: String,
    #[serde(default)]
    pub telephone: String,
    pub date_naissance: String,
    pub date_adhesion: String,
    pub adresse: String,
    pub rib: String,
    pub statut: AdherentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const ADHERENT_SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Adherent,
    id_prefix: "adh",
    status_field: "statut",
    required_fields: &["nom", "prenom", "dateNaissance", "adresse", "email", "rib"],
    create_failed_message: "Échec de la création de l'adhérent. Veuillez réessayer.",
    delete_failed_message: "Échec de la suppression de l'adhérent. Veuillez réessayer.",
    load_failed_message: "Impossible de charger la liste des adhérents.",
    login_required_message: "Vous devez être connecté pour ajouter un adhérent",
};

impl EntityRecord for Adherent {
    type Status = AdherentStatus;

    const SCHEMA: &'static EntitySchema = &ADHERENT_SCHEMA;

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
            self.nom.as_str(),
            self.prenom.as_str(),
            self.email.as_str(),
            self.numero_adherent.as_str(),
        ]
    }

    fn service_defaults(now: DateTime<Utc>) -> Map<String, Value> {
        defaults([
            ("numeroAdherent", random_reference("ADH", 5)),
            ("nom", Value::String(String::new())),
            ("prenom", Value::String(String::new())),
            ("email", Value::String(String::new())),
            ("telephone", Value::String(String::new())),
            ("dateNaissance", Value::String(String::new())),
            ("dateAdhesion", iso_date(now)),
            ("adresse", Value::String(String::new())),
            ("rib", Value::String(String::new())),
            ("statut", Value::from("En attente")),
        ])
    }

    fn form_defaults(now: DateTime<Utc>) -> Map<String, Value> {
        defaults([
            ("nom", Value::String(String::new())),
            ("prenom", Value::String(String::new())),
            ("dateNaissance", Value::String(String::new())),
            ("dateAdhesion", iso_date(now)),
            ("adresse", Value::String(String::new())),
            ("email", Value::String(String::new())),
            ("telephone", Value::String(String::new())),
            ("rib", Value::String(String::new())),
            ("statut", Value::from("Actif")),
        ])
    }
}
