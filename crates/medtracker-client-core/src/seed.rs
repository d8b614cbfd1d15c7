//! Demo users and collections for local runs.

use chrono::{DateTime, Utc};

use crate::entity::{
    Adherent, AdherentStatus, Appointment, AppointmentStatus, Contrat, ContratStatus, ContratType,
    Declaration, DeclarationStatus, MedicalRecord, MedicalRecordStatus,
};
use crate::identity::{Identity, Profile, Role};

pub const ADMIN_USER_ID: &str = "user-1";
pub const HR_USER_ID: &str = "user-2";
pub const EMPLOYEE_USER_ID: &str = "user-3";

#[derive(Debug, Clone, Default)]
pub struct DemoDataset {
    pub users: Vec<Identity>,
    pub medical_records: Vec<MedicalRecord>,
    pub appointments: Vec<Appointment>,
    pub adherents: Vec<Adherent>,
    pub contrats: Vec<Contrat>,
    pub declarations: Vec<Declaration>,
}

impl DemoDataset {
    pub fn build(seeded_at: DateTime<Utc>) -> Self {
        Self {
            users: demo_users(seeded_at),
            medical_records: medical_records(seeded_at),
            appointments: appointments(seeded_at),
            adherents: adherents(seeded_at),
            contrats: contrats(seeded_at),
            declarations: declarations(seeded_at),
        }
    }
}

pub fn demo_users(seeded_at: DateTime<Utc>) -> Vec<Identity> {
    let user = |id: &str, name: &str, email: &str, role: Role| Identity {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        role,
        profile: Profile::default(),
        created_at: seeded_at,
    };
    vec![
        user(ADMIN_USER_ID, "Claire Rousseau", "admin@medtracker.fr", Role::Admin),
        user(HR_USER_ID, "Julien Garnier", "rh@medtracker.fr", Role::Hr),
        Identity {
            profile: Profile {
                phone: Some("06 12 34 56 78".to_string()),
                blood_type: Some("A+".to_string()),
                ..Profile::default()
            },
            ..user(
                EMPLOYEE_USER_ID,
                "Marie Dubois",
                "marie.dubois@example.com",
                Role::Employee,
            )
        },
    ]
}

fn medical_records(at: DateTime<Utc>) -> Vec<MedicalRecord> {
    let record = |id: &str,
                  owner: &str,
                  record_id: &str,
                  title: &str,
                  date: &str,
                  doctor: &str,
                  status: MedicalRecordStatus,
                  description: &str| MedicalRecord {
        id: id.to_string(),
        owner_id: owner.to_string(),
        record_id: record_id.to_string(),
        title: title.to_string(),
        date: date.to_string(),
        doctor: doctor.to_string(),
        status,
        description: description.to_string(),
        document_urls: Vec::new(),
        created_at: at,
        updated_at: at,
    };
    vec![
        record(
            "rec-1",
            EMPLOYEE_USER_ID,
            "REC-482913",
            "Bilan sanguin annuel",
            "2025-01-14",
            "Dr. Bernard",
            MedicalRecordStatus::Completed,
            "Numération formule sanguine et bilan lipidique.",
        ),
        record(
            "rec-2",
            EMPLOYEE_USER_ID,
            "REC-593104",
            "Radiographie du genou",
            "2025-03-02",
            "Dr. Lefèvre",
            MedicalRecordStatus::Scheduled,
            "Suite à une entorse.",
        ),
        record(
            "rec-3",
            HR_USER_ID,
            "REC-720455",
            "Visite médicale du travail",
            "2025-02-20",
            "Dr. Moreau",
            MedicalRecordStatus::Pending,
            "",
        ),
    ]
}

fn appointments(at: DateTime<Utc>) -> Vec<Appointment> {
    let appointment = |id: &str,
                       owner: &str,
                       kind: &str,
                       date: &str,
                       time: &str,
                       doctor: &str,
                       location: &str,
                       status: AppointmentStatus| Appointment {
        id: id.to_string(),
        owner_id: owner.to_string(),
        appointment_type: kind.to_string(),
        date: date.to_string(),
        time: time.to_string(),
        doctor_name: doctor.to_string(),
        location: location.to_string(),
        status,
        notes: String::new(),
        created_at: at,
        updated_at: at,
    };
    vec![
        appointment(
            "apt-1",
            EMPLOYEE_USER_ID,
            "Consultation générale",
            "2025-04-18",
            "09:30",
            "Dr. Bernard",
            "Cabinet médical, Paris 8e",
            AppointmentStatus::Confirmed,
        ),
        appointment(
            "apt-2",
            EMPLOYEE_USER_ID,
            "Kinésithérapie",
            "2025-04-25",
            "17:00",
            "Dr. Lefèvre",
            "Centre de rééducation, Paris 15e",
            AppointmentStatus::Scheduled,
        ),
        appointment(
            "apt-3",
            ADMIN_USER_ID,
            "Ophtalmologie",
            "2025-05-06",
            "11:15",
            "Dr. Fontaine",
            "Clinique de la Vision, Lyon",
            AppointmentStatus::Pending,
        ),
    ]
}

fn adherents(at: DateTime<Utc>) -> Vec<Adherent> {
    let adherent = |id: &str,
                    numero: &str,
                    nom: &str,
                    prenom: &str,
                    telephone: &str,
                    naissance: &str,
                    adhesion: &str,
                    adresse: &str,
                    rib: &str,
                    statut: AdherentStatus| Adherent {
        id: id.to_string(),
        owner_id: HR_USER_ID.to_string(),
        numero_adherent: numero.to_string(),
        nom: nom.to_string(),
        prenom: prenom.to_string(),
        email: format!("{}.{}@example.com", prenom.to_lowercase(), nom.to_lowercase()),
        telephone: telephone.to_string(),
        date_naissance: naissance.to_string(),
        date_adhesion: adhesion.to_string(),
        adresse: adresse.to_string(),
        rib: rib.to_string(),
        statut,
        created_at: at,
        updated_at: at,
    };
    vec![
        adherent(
            "adh-1",
            "ADH-10034",
            "Dubois",
            "Marie",
            "06 12 34 56 78",
            "15/05/1985",
            "15/01/2023",
            "25 rue de la Paix, 75008 Paris",
            "FR76 3000 4000 0300 0000 1234 567",
            AdherentStatus::Actif,
        ),
        adherent(
            "adh-2",
            "ADH-10842",
            "Martin",
            "Jean",
            "07 23 45 67 89",
            "22/11/1978",
            "03/05/2024",
            "5 avenue des Lilas, 69006 Lyon",
            "FR76 3000 4000 0300 0000 5678 901",
            AdherentStatus::Actif,
        ),
        adherent(
            "adh-3",
            "ADH-09375",
            "Lambert",
            "Sophie",
            "06 98 76 54 32",
            "08/03/1990",
            "22/11/2022",
            "12 boulevard Victor Hugo, 33000 Bordeaux",
            "FR76 3000 4000 0300 0000 8765 432",
            AdherentStatus::Inactif,
        ),
        adherent(
            "adh-4",
            "ADH-11205",
            "Petit",
            "Thomas",
            "07 65 43 21 09",
            "30/09/1982",
            "08/07/2024",
            "42 rue du Commerce, 44000 Nantes",
            "FR76 3000 4000 0300 0000 4321 098",
            AdherentStatus::EnAttente,
        ),
    ]
}

fn contrats(at: DateTime<Utc>) -> Vec<Contrat> {
    let contrat = |id: &str,
                   numero: &str,
                   police: &str,
                   contrat_type: ContratType,
                   debut: &str,
                   fin: &str,
                   statut: ContratStatus,
                   montant: f64,
                   adherent: &str| Contrat {
        id: id.to_string(),
        owner_id: HR_USER_ID.to_string(),
        numero: numero.to_string(),
        numero_police: police.to_string(),
        contrat_type,
        date_debut: debut.to_string(),
        date_fin: fin.to_string(),
        statut,
        montant,
        id_adherent: adherent.to_string(),
        created_at: at,
        updated_at: at,
    };
    vec![
        contrat(
            "cnt-1",
            "CNT-2025-1234",
            "POL-6789",
            ContratType::Individuel,
            "01/01/2025",
            "31/12/2025",
            ContratStatus::Actif,
            1200.0,
            "ADH-10034",
        ),
        contrat(
            "cnt-2",
            "CNT-2025-5678",
            "POL-3421",
            ContratType::Groupe,
            "15/02/2025",
            "14/02/2026",
            ContratStatus::Actif,
            800.0,
            "ADH-10842",
        ),
        contrat(
            "cnt-3",
            "CNT-2024-9876",
            "POL-7752",
            ContratType::Individuel,
            "01/05/2024",
            "30/04/2025",
            ContratStatus::ARenouveler,
            350.0,
            "ADH-09375",
        ),
    ]
}

fn declarations(at: DateTime<Utc>) -> Vec<Declaration> {
    let declaration = |id: &str,
                       reference: &str,
                       police: &str,
                       code: &str,
                       dates: [&str; 4],
                       heure: &str,
                       maladie: &str,
                       sinistre: &str,
                       adherent: &str,
                       statut: DeclarationStatus| {
        let [maladie_le, dossier, etat, saisie] = dates;
        Declaration {
            id: id.to_string(),
            owner_id: EMPLOYEE_USER_ID.to_string(),
            numero_reference: reference.to_string(),
            numero_police: police.to_string(),
            code_adherent: code.to_string(),
            date_maladie: maladie_le.to_string(),
            date_dossier: dossier.to_string(),
            date_etat: etat.to_string(),
            date_saisie: saisie.to_string(),
            heure_saisie: heure.to_string(),
            nom_maladie: maladie.to_string(),
            num_sinistre: sinistre.to_string(),
            num_adherent: adherent.to_string(),
            statut,
            created_at: at,
            updated_at: at,
        }
    };
    vec![
        declaration(
            "dec-1",
            "REF-2025-1234",
            "POL-6789",
            "CODE-A123",
            ["2025-03-15", "2025-03-20", "2025-03-22", "2025-03-22"],
            "10:30",
            "Grippe",
            "SIN-2025-001",
            "ADH-10034",
            DeclarationStatus::EnCours,
        ),
        declaration(
            "dec-2",
            "REF-2025-5678",
            "POL-3421",
            "CODE-B456",
            ["2025-02-10", "2025-02-15", "2025-03-01", "2025-02-15"],
            "14:15",
            "Entorse cheville",
            "SIN-2025-002",
            "ADH-10842",
            DeclarationStatus::Rembourse,
        ),
        declaration(
            "dec-3",
            "REF-2025-9012",
            "POL-7752",
            "CODE-C789",
            ["2025-04-05", "2025-04-06", "2025-04-10", "2025-04-06"],
            "09:45",
            "Angine",
            "SIN-2025-003",
            "ADH-09375",
            DeclarationStatus::EnAttente,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::entity::EntityRecord;

    fn distinct_ids<T: EntityRecord>(records: &[T]) -> bool {
        let ids: HashSet<&str> = records.iter().map(EntityRecord::id).collect();
        ids.len() == records.len()
    }

    #[test]
    fn demo_dataset_covers_every_role_and_kind() {
        let dataset = DemoDataset::build(Utc::now());
        let roles: Vec<Role> = dataset.users.iter().map(|user| user.role).collect();
        assert_eq!(roles, [Role::Admin, Role::Hr, Role::Employee]);
        assert!(dataset.users.iter().all(Identity::is_well_formed));

        assert!(distinct_ids(&dataset.medical_records));
        assert!(distinct_ids(&dataset.appointments));
        assert!(distinct_ids(&dataset.adherents));
        assert!(distinct_ids(&dataset.contrats));
        assert!(distinct_ids(&dataset.declarations));
        assert_eq!(dataset.adherents[0].email, "marie.dubois@example.com");
    }
}
