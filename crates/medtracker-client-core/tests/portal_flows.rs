#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use medtracker_client_core::entity::{Declaration, MedicalRecord, MedicalRecordStatus};
use medtracker_client_core::seed::{DemoDataset, EMPLOYEE_USER_ID};
use medtracker_client_core::{
    AppRoute, Clock, FixedClock, GuardDecision, MemoryStorage, PortalApp,
    PortalConfig, PortalError, SimulatedLatency, SubmitOutcome,
};
use serde_json::{Map, Value, json};

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap(),
    ))
}

fn instant_config(state_dir: Option<std::path::PathBuf>) -> PortalConfig {
    PortalConfig {
        state_dir,
        latency: SimulatedLatency::none(),
        seed_demo_data: true,
    }
}

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("json object")
}

#[tokio::test]
async fn protected_page_redirects_to_login_and_back() {
    let mut app = PortalApp::bootstrap_with_clock(&instant_config(None), clock());
    assert!(app.current_identity().is_none());

    let GuardDecision::Redirect { to, state } = app.navigate("/records") else {
        panic!("anonymous navigation must redirect");
    };
    assert_eq!(to, AppRoute::Login);
    assert_eq!(state.from, "/records");

    let landed = app
        .login("marie.dubois@example.com", "anything")
        .await
        .expect("login");
    assert_eq!(landed, AppRoute::Records);
    assert_eq!(
        app.navigate("/records"),
        GuardDecision::Render(AppRoute::Records)
    );
}

#[tokio::test]
async fn unknown_email_leaves_session_unchanged() {
    let mut app = PortalApp::bootstrap_with_clock(&instant_config(None), clock());
    let error = app
        .login("nobody@example.com", "x")
        .await
        .expect_err("unknown email");
    assert!(matches!(error, PortalError::NotFound(_)));
    assert!(app.current_identity().is_none());
}

#[tokio::test]
async fn session_survives_a_restart_with_the_same_state_dir() {
    let state_dir = tempfile::tempdir().expect("tempdir");
    let config = instant_config(Some(state_dir.path().to_path_buf()));

    let mut first = PortalApp::bootstrap_with_clock(&config, clock());
    let identity = first
        .session_mut()
        .login("rh@medtracker.fr", "x")
        .await
        .expect("login");
    first.shutdown();

    let restarted = PortalApp::bootstrap_with_clock(&config, clock());
    assert_eq!(restarted.current_identity(), Some(&identity));

    let mut third = PortalApp::bootstrap_with_clock(&config, clock());
    third.logout().await;
    let after_logout = PortalApp::bootstrap_with_clock(&config, clock());
    assert!(after_logout.current_identity().is_none());
}

#[tokio::test]
async fn created_record_is_listed_for_its_owner() {
    let mut app = PortalApp::bootstrap_with_clock(&instant_config(None), clock());
    app.login("marie.dubois@example.com", "x").await.expect("login");
    let owner = app.current_identity().cloned().expect("identity");

    let created = app
        .services()
        .medical_records
        .create(
            &owner.id,
            object(json!({
                "title": "Annual Checkup",
                "date": "2025-01-10",
                "doctor": "Dr. Smith",
                "status": "completed",
            })),
        )
        .await
        .expect("create");
    assert!(!created.id.is_empty());
    assert_eq!(created.title, "Annual Checkup");
    assert_eq!(created.date, "2025-01-10");
    assert_eq!(created.doctor, "Dr. Smith");
    assert_eq!(created.status, MedicalRecordStatus::Completed);

    let owned = app
        .services()
        .medical_records
        .list_by_owner(&owner.id)
        .await
        .expect("list");
    assert!(owned.iter().any(|record| record.id == created.id));
}

#[tokio::test]
async fn delete_removes_exactly_one_and_ignores_unknown_ids() {
    let app = PortalApp::bootstrap_with_clock(&instant_config(None), clock());
    let declarations = &app.services().declarations;
    let before = declarations.list_all().await.expect("list");

    declarations.delete("dec-missing").await.expect("no-op");
    assert_eq!(declarations.list_all().await.expect("list").len(), before.len());

    let target = before[0].id.clone();
    declarations.delete(&target).await.expect("delete");
    let after = declarations.list_all().await.expect("list");
    assert_eq!(after.len(), before.len() - 1);
    assert!(after.iter().all(|record| record.id != target));
    assert_eq!(declarations.get_by_id(&target).await.expect("get"), None);
}

#[tokio::test]
async fn grippe_search_finds_the_flu_declaration() {
    let mut app = PortalApp::bootstrap_with_clock(&instant_config(None), clock());
    app.login("admin@medtracker.fr", "x").await.expect("login");
    let admin = app.current_identity().cloned().expect("identity");

    let mut page = app.controller::<Declaration>();
    page.load(&admin, None).await;
    page.set_search_term("grippe");
    let visible = page.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].nom_maladie, "Grippe");
}

#[tokio::test]
async fn anonymous_form_submit_is_parked_and_resumed_after_login() {
    let clock = clock();
    let mut app = PortalApp::from_parts(
        Arc::new(MemoryStorage::new()),
        Arc::new(MemoryStorage::new()),
        clock.clone(),
        SimulatedLatency::none(),
        DemoDataset::build(clock.now()),
    );

    let mut form = app.open_form::<MedicalRecord>();
    form.set_field("title", "Annual Checkup");
    form.set_field("date", "2025-01-10");
    form.set_field("doctor", "Dr. Smith");
    let outcome = form
        .submit(app.guard(), None, &app.services().medical_records)
        .await;
    let SubmitOutcome::Redirect { to, state } = outcome else {
        panic!("expected redirect, got {outcome:?}");
    };
    app.follow_redirect(to, state);

    let landed = app
        .login("marie.dubois@example.com", "x")
        .await
        .expect("login");
    assert_eq!(landed, AppRoute::Records);

    let mut resumed = app
        .resume_pending_form::<MedicalRecord>()
        .expect("pending form");
    let identity = app.current_identity().cloned();
    let SubmitOutcome::Created(record) = resumed
        .submit(app.guard(), identity.as_ref(), &app.services().medical_records)
        .await
    else {
        panic!("resumed submit should create");
    };
    assert_eq!(record.owner_id, EMPLOYEE_USER_ID);
    assert!(app.resume_pending_form::<MedicalRecord>().is_none());
}
