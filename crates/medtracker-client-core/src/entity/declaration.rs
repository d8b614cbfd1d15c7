use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EntityKind, EntityRecord, EntitySchema, defaults, iso_date};

closed_set! {
    DeclarationStatus {
        EnCours => "En cours",
        EnAttente => "En attente",
        Rembourse => "Remboursé",
        Rejete => "Rejeté",
    }
}

/// Illness declaration filed against a policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    pub id: String,
    pub owner_id: String,
    pub numero_reference: String,
    pub numero_police: String,
    pub code_adherent: String,
    pub date_maladie: String,
    pub date_dossier: String,
    #[serde(default)]
    pub date_etat: String,
    pub date_saisie: String,
    pub heure_saisie: String,
    pub nom_maladie: String,
    #[serde(default)]
    pub num_sinistre: String,
    pub num_adherent: String,
    pub statut: DeclarationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const DECLARATION_SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Declaration,
    id_prefix: "dec",
    status_field: "statut",
    required_fields: &[
        "numeroReference",
        "numeroPolice",
        "numAdherent",
        "codeAdherent",
        "nomMaladie",
        "statut",
        "dateMaladie",
        "dateDossier",
    ],
    create_failed_message: "Échec de la création de la déclaration. Veuillez réessayer.",
    delete_failed_message: "Échec de la suppression de la déclaration. Veuillez réessayer.",
    load_failed_message: "Impossible de charger les déclarations.",
    login_required_message: "Vous devez être connecté pour soumettre une déclaration",
};

fn saisie_time(now: DateTime<Utc>) -> Value {
    Value::String(now.format("%H:%M").to_string())
}

impl EntityRecord for Declaration {
    type Status = DeclarationStatus;

    const SCHEMA: &'static EntitySchema = &DECLARATION_SCHEMA;

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
            self.numero_reference.as_str(),
            self.num_adherent.as_str(),
            self.nom_maladie.as_str(),
        ]
    }

    fn service_defaults(now: DateTime<Utc>) -> Map<String, Value> {
        let mut fields = Self::form_defaults(now);
        fields.insert("dateEtat".to_string(), iso_date(now));
        fields
    }

    fn form_defaults(now: DateTime<Utc>) -> Map<String, Value> {
        defaults([
            ("numeroReference", Value::String(String::new())),
            ("numeroPolice", Value::String(String::new())),
            ("codeAdherent", Value::String(String::new())),
            ("dateMaladie", Value::String(String::new())),
            ("dateDossier", Value::String(String::new())),
            ("dateEtat", Value::String(String::new())),
            ("dateSaisie", iso_date(now)),
            ("heureSaisie", saisie_time(now)),
            ("nomMaladie", Value::String(String::new())),
            ("numSinistre", Value::String(String::new())),
            ("numAdherent", Value::String(String::new())),
            ("statut", Value::from("En attente")),
        ])
    }
}
