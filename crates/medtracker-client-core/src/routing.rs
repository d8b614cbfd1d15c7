use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AppRoute {
    Login,
    Register,
    Dashboard,
    Records,
    Appointments,
    Profile,
    Contrats,
    Adherents,
    Declarations,
    NotFound { path: String },
}

impl AppRoute {
    pub fn from_path(raw: &str) -> Self {
        let path = raw
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim()
            .trim_end_matches('/');
        match path {
            "" | "/dashboard" => Self::Dashboard,
            "/login" => Self::Login,
            "/register" => Self::Register,
            "/records" => Self::Records,
            "/appointments" => Self::Appointments,
            "/profile" => Self::Profile,
            "/contrats" => Self::Contrats,
            "/adherents" => Self::Adherents,
            "/declarations" => Self::Declarations,
            other => Self::NotFound {
                path: other.to_string(),
            },
        }
    }

    pub fn to_path(&self) -> String {
        match self {
            Self::Login => "/login".to_string(),
            Self::Register => "/register".to_string(),
            Self::Dashboard => "/dashboard".to_string(),
            Self::Records => "/records".to_string(),
            Self::Appointments => "/appointments".to_string(),
            Self::Profile => "/profile".to_string(),
            Self::Contrats => "/contrats".to_string(),
            Self::Adherents => "/adherents".to_string(),
            Self::Declarations => "/declarations".to_string(),
            Self::NotFound { path } => path.clone(),
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }

    /// The list page that manages `kind`.
    pub fn for_entity(kind: EntityKind) -> Self {
        match kind {
            EntityKind::MedicalRecord => Self::Records,
            EntityKind::Appointment => Self::Appointments,
            EntityKind::Adherent => Self::Adherents,
            EntityKind::Contrat => Self::Contrats,
            EntityKind::Declaration => Self::Declarations,
        }
    }
}

/// Route state carried on a redirect to the login view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectState {
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_action: Option<EntityKind>,
}

impl RedirectState {
    pub fn from_route(route: &AppRoute) -> Self {
        Self {
            from: route.to_path(),
            pending_action: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_round_trip_for_known_routes() {
        for route in [
            AppRoute::Login,
            AppRoute::Register,
            AppRoute::Dashboard,
            AppRoute::Records,
            AppRoute::Appointments,
            AppRoute::Profile,
            AppRoute::Contrats,
            AppRoute::Adherents,
            AppRoute::Declarations,
        ] {
            assert_eq!(AppRoute::from_path(&route.to_path()), route);
        }
    }

    #[test]
    fn index_query_and_trailing_slash_are_normalized() {
        assert_eq!(AppRoute::from_path("/"), AppRoute::Dashboard);
        assert_eq!(AppRoute::from_path("/contrats/"), AppRoute::Contrats);
        assert_eq!(
            AppRoute::from_path("/declarations?refresh=1#top"),
            AppRoute::Declarations
        );
    }

    #[test]
    fn unknown_paths_are_protected_not_found_routes() {
        let route = AppRoute::from_path("/admin");
        assert_eq!(
            route,
            AppRoute::NotFound {
                path: "/admin".to_string()
            }
        );
        assert!(!route.is_public());
        assert!(AppRoute::Login.is_public());
    }

    #[test]
    fn every_entity_kind_has_a_protected_list_page() {
        for (kind, path) in [
            (EntityKind::MedicalRecord, "/records"),
            (EntityKind::Appointment, "/appointments"),
            (EntityKind::Adherent, "/adherents"),
            (EntityKind::Contrat, "/contrats"),
            (EntityKind::Declaration, "/declarations"),
        ] {
            let route = AppRoute::for_entity(kind);
            assert_eq!(route.to_path(), path);
            assert!(!route.is_public());
        }
    }

    #[test]
    fn redirect_state_uses_camel_case_keys() {
        let state = RedirectState {
            from: "/declarations".to_string(),
            pending_action: Some(EntityKind::Declaration),
        };
        let value = serde_json::to_value(&state).expect("serialize");
        assert_eq!(value["from"], "/declarations");
        assert_eq!(value["pendingAction"], "declaration");
    }
}
