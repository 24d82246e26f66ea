use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_database::{
    AvailabilityStore, BookingStore, CancelOutcome, PatientStore, StoreError, SupabaseStore,
};
use shared_models::scheduling::{AppointmentStatus, DayOfWeek, NewAppointment, NewPatient};
use shared_models::SchedulingError;
use shared_utils::pagination::PageWindow;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

async fn store_for(server: &MockServer) -> SupabaseStore {
    let config = TestConfig {
        supabase_url: server.uri(),
        ..TestConfig::default()
    };
    SupabaseStore::new(&config.to_app_config())
}

#[tokio::test]
async fn test_exclusion_violation_surfaces_as_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(header("apikey", "test-service-key"))
        .respond_with(ResponseTemplate::new(409).set_body_json(MockSupabaseResponses::error_response(
            "conflicting key value violates exclusion constraint \"appointments_no_overlap\"",
            "23P01",
        )))
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let result = store
        .create_appointment(NewAppointment {
            admin_id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            start_time: t(10, 15),
            end_time: t(10, 45),
        })
        .await;

    assert_eq!(result, Err(StoreError::Conflict));
}

#[tokio::test]
async fn test_create_appointment_returns_generated_id() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": id }])))
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let created = store
        .create_appointment(NewAppointment {
            admin_id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            start_time: t(10, 0),
            end_time: t(10, 30),
        })
        .await;

    assert_eq!(created, Ok(id));
}

#[tokio::test]
async fn test_list_by_admin_reads_total_from_content_range() {
    let server = MockServer::start().await;
    let admin_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("client_id", format!("eq.{}", admin_id)))
        .and(query_param("limit", "2"))
        .and(query_param("offset", "2"))
        .and(header("Prefer", "count=exact"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Range", "2-3/5")
                .set_body_json(json!([
                    MockSupabaseResponses::appointment_row(
                        Uuid::new_v4(), admin_id, patient_id, "Bruno Dias", "2024-06-03", "10:00:00", "10:30:00", "scheduled"
                    ),
                    MockSupabaseResponses::appointment_row(
                        Uuid::new_v4(), admin_id, patient_id, "Carla Reis", "2024-06-04", "11:00:00", "11:30:00", "cancelled"
                    ),
                ])),
        )
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let (views, total) = store
        .list_by_admin(admin_id, PageWindow::new(2, 2).unwrap())
        .await
        .unwrap();

    assert_eq!(total, 5);
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].full_name, "Bruno Dias");
    assert_eq!(views[0].start_time, t(10, 0));
    assert_eq!(views[1].status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn test_list_by_date_filters_scheduled_rows() {
    let server = MockServer::start().await;
    let admin_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("date", "eq.2024-06-03"))
        .and(query_param("status", "eq.scheduled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let views = store
        .list_by_admin_and_date(admin_id, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap())
        .await
        .unwrap();

    assert!(views.is_empty());
}

#[tokio::test]
async fn test_windows_by_weekday_parse_storage_times() {
    let server = MockServer::start().await;
    let admin_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/calendar_slots"))
        .and(query_param("weekday", "eq.1"))
        .and(query_param("order", "start_time.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::window_row(Uuid::new_v4(), admin_id, 1, "09:00:00", "12:00:00"),
            MockSupabaseResponses::window_row(Uuid::new_v4(), admin_id, 1, "14:00:00", "18:00:00"),
        ])))
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let windows = store
        .list_windows_by_weekday(admin_id, DayOfWeek::try_from(1).unwrap())
        .await
        .unwrap();

    assert_eq!(windows.len(), 2);
    assert_eq!((windows[0].start_time, windows[0].end_time), (t(9, 0), t(12, 0)));
    assert_eq!(windows[1].admin_id, admin_id);
}

#[tokio::test]
async fn test_delete_without_matching_row_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/calendar_slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let result = store.delete_window(Uuid::new_v4(), Uuid::new_v4()).await;

    assert_eq!(result, Err(StoreError::NotFound));
}

#[tokio::test]
async fn test_cancel_distinguishes_already_cancelled() {
    let server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.scheduled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": appointment_id }])))
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let outcome = store.cancel_appointment(Uuid::new_v4(), appointment_id).await;

    assert_eq!(outcome, Ok(CancelOutcome::AlreadyCancelled));
}

#[tokio::test]
async fn test_find_patient_maps_rows() {
    let server = MockServer::start().await;
    let admin_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", format!("eq.{}", patient_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_row(patient_id, admin_id, "Ana Lima", "ana@example.com")
        ])))
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let patient = store.find_patient(admin_id, patient_id).await.unwrap().unwrap();

    assert_eq!(patient.email, "ana@example.com");
    assert_eq!(patient.admin_id, admin_id);
}

#[tokio::test]
async fn test_server_errors_are_backend_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/calendar_slots"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let result = store.list_windows(Uuid::new_v4()).await;

    assert_matches!(result, Err(StoreError::Backend { operation: "list_windows", .. }));
}

#[tokio::test]
async fn test_deleting_referenced_patient_is_not_a_slot_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(409).set_body_json(MockSupabaseResponses::error_response(
            "update or delete on table \"patients\" violates foreign key constraint \"appointments_patient_id_fkey\" on table \"appointments\"",
            "23503",
        )))
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let result = store.delete_patient(Uuid::new_v4(), Uuid::new_v4()).await;

    assert_eq!(result, Err(StoreError::Referenced));
    assert_eq!(
        result.unwrap_err().for_entity("patient"),
        SchedulingError::InUse("patient")
    );
}

#[tokio::test]
async fn test_window_exclusion_violation_surfaces_as_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/calendar_slots"))
        .respond_with(ResponseTemplate::new(409).set_body_json(MockSupabaseResponses::error_response(
            "conflicting key value violates exclusion constraint \"calendar_slots_no_overlap\"",
            "23P01",
        )))
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let result = store
        .create_window(Uuid::new_v4(), DayOfWeek::try_from(1).unwrap(), t(9, 0), t(12, 0))
        .await;

    assert_eq!(result, Err(StoreError::Conflict));
}

#[tokio::test]
async fn test_unclassified_conflict_is_backend_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(409).set_body_json(MockSupabaseResponses::error_response(
            "duplicate key value violates unique constraint",
            "23505",
        )))
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let result = store
        .create_patient(
            Uuid::new_v4(),
            NewPatient {
                full_name: "Ana Lima".to_string(),
                email: "ana@example.com".to_string(),
                phone: "+55 11 90000-0000".to_string(),
                birth_date: NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
            },
        )
        .await;

    assert_matches!(result, Err(StoreError::Backend { operation: "create_patient", .. }));
}
