use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PortalError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Hr,
    #[default]
    Employee,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Hr => "hr",
            Self::Employee => "employee",
        }
    }

    /// Privileged roles may list every owner's records.
    pub fn is_privileged(self) -> bool {
        matches!(self, Self::Admin | Self::Hr)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medications: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(flatten)]
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// A persisted blob is only trusted when it names a user.
    pub fn is_well_formed(&self) -> bool {
        !self.id.trim().is_empty() && !self.email.trim().is_empty()
    }
}

/// Partial profile edit; `None` leaves the current value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
}

impl ProfileUpdate {
    pub fn apply_to(self, identity: &mut Identity) {
        if let Some(name) = self.name.filter(|name| !name.trim().is_empty()) {
            identity.name = name.trim().to_string();
        }
        let profile = &mut identity.profile;
        let fields = [
            (self.phone, &mut profile.phone),
            (self.date_of_birth, &mut profile.date_of_birth),
            (self.address, &mut profile.address),
            (self.emergency_contact, &mut profile.emergency_contact),
            (self.blood_type, &mut profile.blood_type),
            (self.allergies, &mut profile.allergies),
            (self.medications, &mut profile.medications),
        ];
        for (update, slot) in fields {
            if let Some(value) = update {
                let value = value.trim().to_string();
                *slot = if value.is_empty() { None } else { Some(value) };
            }
        }
    }
}

pub fn normalize_email(raw: &str) -> Result<String, PortalError> {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(PortalError::missing_fields(vec!["email".to_string()]));
    }
    Ok(normalized)
}

pub fn normalize_name(raw: &str) -> Result<String, PortalError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PortalError::missing_fields(vec!["name".to_string()]));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn identity() -> Identity {
        Identity {
            id: "user-1".to_string(),
            name: "Marie Dubois".to_string(),
            email: "marie@example.com".to_string(),
            role: Role::Hr,
            profile: Profile::default(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn identity_serializes_with_camel_case_and_flat_profile() {
        let mut identity = identity();
        identity.profile.blood_type = Some("A+".to_string());
        let value = serde_json::to_value(&identity).expect("serialize");
        assert_eq!(value["role"], json!("hr"));
        assert_eq!(value["bloodType"], json!("A+"));
        assert!(value.get("createdAt").is_some());
        assert!(value.get("phone").is_none());
    }

    #[test]
    fn missing_role_defaults_to_employee() {
        let parsed: Identity = serde_json::from_value(json!({
            "id": "user-9",
            "name": "Jean",
            "email": "jean@example.com",
            "createdAt": "2025-01-01T00:00:00Z"
        }))
        .expect("parse");
        assert_eq!(parsed.role, Role::Employee);
        assert!(parsed.is_well_formed());
    }

    #[test]
    fn only_admin_and_hr_are_privileged() {
        assert!(Role::Admin.is_privileged());
        assert!(Role::Hr.is_privileged());
        assert!(!Role::Employee.is_privileged());
    }

    #[test]
    fn profile_update_trims_and_clears_blank_values() {
        let mut identity = identity();
        identity.profile.allergies = Some("Pollen".to_string());
        ProfileUpdate {
            name: Some("  Marie D.  ".to_string()),
            phone: Some(" 06 12 34 56 78 ".to_string()),
            allergies: Some("   ".to_string()),
            ..ProfileUpdate::default()
        }
        .apply_to(&mut identity);

        assert_eq!(identity.name, "Marie D.");
        assert_eq!(identity.profile.phone.as_deref(), Some("06 12 34 56 78"));
        assert_eq!(identity.profile.allergies, None);
    }

    #[test]
    fn normalize_email_lowercases_and_rejects_empty() {
        assert_eq!(
            normalize_email("  Marie@Example.COM ").expect("valid"),
            "marie@example.com"
        );
        let error = normalize_email("   ").expect_err("empty email");
        assert_eq!(error.code(), "validation_failed");
    }
}
