use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use futures::future::join_all;
use uuid::Uuid;

use appointment_cell::{
    AppointmentBookingService, BookAppointmentRequest, BookingConfirmation, BookingNotifier,
    NotificationError,
};
use performance_cell::{ListingCache, MokaListingCache, NoopListingCache};
use shared_database::{
    AvailabilityStore, BookingStore, CancelOutcome, InMemoryStore, PatientStore, SchedulingStore,
    StoreError,
};
use shared_models::scheduling::{
    AppointmentStatus, AppointmentView, AvailabilityWindow, DayOfWeek, NewAppointment,
    NewPatient, Patient, PatientView,
};
use shared_models::SchedulingError;
use shared_utils::pagination::PageWindow;
use shared_utils::test_utils::TestConfig;
use shared_utils::time::parse_clock_time;

// 2024-06-03 is a Monday.
const MONDAY: &str = "2024-06-03";

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<BookingConfirmation>>,
}

#[async_trait]
impl BookingNotifier for RecordingNotifier {
    async fn notify_booking_confirmed(
        &self,
        confirmation: &BookingConfirmation,
    ) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(confirmation.clone());
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl BookingNotifier for FailingNotifier {
    async fn notify_booking_confirmed(
        &self,
        _confirmation: &BookingConfirmation,
    ) -> Result<(), NotificationError> {
        Err(NotificationError::Rejected {
            status: 503,
            body: "relay down".to_string(),
        })
    }
}

struct Clinic {
    service: Arc<AppointmentBookingService>,
    store: Arc<InMemoryStore>,
    cache: Arc<dyn ListingCache>,
    notifier: Arc<RecordingNotifier>,
    admin: Uuid,
}

impl Clinic {
    async fn with_cache(cache: Arc<dyn ListingCache>) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let admin = Uuid::new_v4();

        store
            .create_window(
                admin,
                DayOfWeek::try_from(1).unwrap(),
                parse_clock_time("09:00").unwrap(),
                parse_clock_time("12:00").unwrap(),
            )
            .await
            .unwrap();

        let dyn_store: Arc<dyn SchedulingStore> = store.clone();
        let service = Arc::new(AppointmentBookingService::new(
            &TestConfig::default().to_app_config(),
            dyn_store,
            Arc::clone(&cache),
            notifier.clone(),
        ));

        Self {
            service,
            store,
            cache,
            notifier,
            admin,
        }
    }

    async fn new() -> Self {
        Self::with_cache(Arc::new(MokaListingCache::new(Duration::from_secs(30), 1_000))).await
    }

    async fn patient(&self, full_name: &str) -> Uuid {
        self.store
            .create_patient(
                self.admin,
                NewPatient {
                    full_name: full_name.to_string(),
                    email: format!("{}@example.com", full_name.to_lowercase().replace(' ', ".")),
                    phone: "+55 11 90000-0000".to_string(),
                    birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                },
            )
            .await
            .unwrap()
    }

    async fn book(&self, patient_id: Uuid, start: &str, end: &str) -> Result<Uuid, SchedulingError> {
        self.service
            .book_appointment(self.admin, request(patient_id, MONDAY, start, end))
            .await
    }
}

fn request(patient_id: Uuid, date: &str, start: &str, end: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        patient_id,
        date: date.to_string(),
        start_time: start.to_string(),
        end_time: end.to_string(),
    }
}

#[tokio::test]
async fn test_monday_morning_scenario() {
    let clinic = Clinic::new().await;
    let patient = clinic.patient("Ana Lima").await;

    assert!(clinic.book(patient, "10:00", "10:30").await.is_ok());
    assert_eq!(clinic.book(patient, "10:15", "10:45").await, Err(SchedulingError::SlotConflict));
    assert_eq!(clinic.book(patient, "08:00", "08:30").await, Err(SchedulingError::OutsideAvailability));
    assert_eq!(clinic.book(patient, "11:50", "12:10").await, Err(SchedulingError::OutsideAvailability));
    assert!(clinic.book(patient, "10:30", "11:00").await.is_ok());

    let day = clinic
        .service
        .list_appointments_by_date(clinic.admin, MONDAY)
        .await
        .unwrap();
    assert_eq!(day.len(), 2);
}

#[tokio::test]
async fn test_day_without_windows_is_outside_availability() {
    let clinic = Clinic::new().await;
    let patient = clinic.patient("Ana Lima").await;

    // 2024-06-04 is a Tuesday.
    let result = clinic
        .service
        .book_appointment(clinic.admin, request(patient, "2024-06-04", "10:00", "10:30"))
        .await;

    assert_eq!(result, Err(SchedulingError::OutsideAvailability));
}

#[tokio::test]
async fn test_malformed_input_is_rejected_before_storage() {
    let clinic = Clinic::new().await;
    let patient = clinic.patient("Ana Lima").await;

    assert_matches!(
        clinic
            .service
            .book_appointment(clinic.admin, request(patient, "03/06/2024", "10:00", "10:30"))
            .await,
        Err(SchedulingError::InvalidArgument(_))
    );
    assert_matches!(clinic.book(patient, "10:00", "25:00").await, Err(SchedulingError::InvalidArgument(_)));
    assert_eq!(clinic.book(patient, "10:30", "10:00").await, Err(SchedulingError::InvalidRange));
    assert_eq!(clinic.book(patient, "10:00", "10:00").await, Err(SchedulingError::InvalidRange));
}

#[tokio::test]
async fn test_patient_must_belong_to_admin() {
    let clinic = Clinic::new().await;
    let stranger = Clinic::new().await;
    let foreign_patient = stranger.patient("Bruno Dias").await;

    assert_eq!(
        clinic.book(foreign_patient, "10:00", "10:30").await,
        Err(SchedulingError::NotFound("patient"))
    );
    assert_eq!(
        clinic.book(Uuid::new_v4(), "10:00", "10:30").await,
        Err(SchedulingError::NotFound("patient"))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overlapping_bookings_admit_exactly_one() {
    let clinic = Clinic::new().await;
    let patient = clinic.patient("Ana Lima").await;

    let attempts = (0..8).map(|i| {
        let service = Arc::clone(&clinic.service);
        let admin = clinic.admin;
        let start = format!("10:{:02}", i * 2);
        let end = format!("10:{:02}", 30 + i * 2);
        tokio::spawn(async move {
            service
                .book_appointment(admin, request(patient, MONDAY, &start, &end))
                .await
        })
    });

    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| *r == Err(SchedulingError::SlotConflict)));

    let day = clinic
        .service
        .list_appointments_by_date(clinic.admin, MONDAY)
        .await
        .unwrap();
    assert_eq!(day.len(), 1);
}

#[tokio::test]
async fn test_repeated_listing_is_served_from_cache() {
    let clinic = Clinic::new().await;
    let patient = clinic.patient("Ana Lima").await;
    clinic.book(patient, "09:00", "09:30").await.unwrap();

    let first = clinic.service.list_appointments(clinic.admin, Some(1), Some(10)).await.unwrap();
    let second = clinic.service.list_appointments(clinic.admin, Some(1), Some(10)).await.unwrap();

    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
    assert_eq!(clinic.cache.stats().await.hits, 1);
}

#[tokio::test]
async fn test_booking_invalidates_every_listing_of_the_admin() {
    let clinic = Clinic::new().await;
    let patient = clinic.patient("Ana Lima").await;

    let before_day = clinic.service.list_appointments_by_date(clinic.admin, MONDAY).await.unwrap();
    let before_page = clinic.service.list_appointments(clinic.admin, None, None).await.unwrap();
    assert!(before_day.is_empty());
    assert_eq!(before_page.total, 0);

    let id = clinic.book(patient, "10:00", "10:30").await.unwrap();

    let after_day = clinic.service.list_appointments_by_date(clinic.admin, MONDAY).await.unwrap();
    let after_page = clinic.service.list_appointments(clinic.admin, None, None).await.unwrap();
    assert_eq!(after_day[0].id, id);
    assert_eq!(after_page.total, 1);
    assert_eq!(after_page.data[0].full_name, "Ana Lima");
}

#[tokio::test]
async fn test_pagination_metadata_and_name_order() {
    let clinic = Clinic::new().await;
    let carla = clinic.patient("Carla Reis").await;
    let ana = clinic.patient("Ana Lima").await;
    let bruno = clinic.patient("Bruno Dias").await;

    clinic.book(carla, "09:00", "09:30").await.unwrap();
    clinic.book(ana, "09:30", "10:00").await.unwrap();
    clinic.book(bruno, "10:00", "10:30").await.unwrap();

    let first = clinic.service.list_appointments(clinic.admin, Some(1), Some(2)).await.unwrap();
    let second = clinic.service.list_appointments(clinic.admin, Some(2), Some(2)).await.unwrap();

    assert_eq!((first.total, first.total_pages, first.limit), (3, 2, 2));
    let names: Vec<_> = first.data.iter().map(|a| a.full_name.as_str()).collect();
    assert_eq!(names, vec!["Ana Lima", "Bruno Dias"]);
    assert_eq!(second.data.len(), 1);
    assert_eq!(second.data[0].full_name, "Carla Reis");

    assert_eq!(clinic.service.count_appointments(clinic.admin).await.unwrap(), 3);

    // Page 0 is page 1 and shares its cache entry.
    let hits_before = clinic.cache.stats().await.hits;
    let zeroth = clinic.service.list_appointments(clinic.admin, Some(0), Some(2)).await.unwrap();
    assert_eq!(zeroth, first);
    assert_eq!(clinic.cache.stats().await.hits, hits_before + 1);

    assert_matches!(
        clinic.service.list_appointments(clinic.admin, Some(1), Some(0)).await,
        Err(SchedulingError::InvalidArgument(_))
    );
}

#[tokio::test]
async fn test_cancellation_is_one_way_and_frees_the_slot() {
    let clinic = Clinic::new().await;
    let patient = clinic.patient("Ana Lima").await;
    let id = clinic.book(patient, "10:00", "10:30").await.unwrap();

    let cancelled = clinic.service.cancel_appointment(clinic.admin, id).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    assert_eq!(
        clinic.service.cancel_appointment(clinic.admin, id).await,
        Err(SchedulingError::AlreadyCancelled)
    );
    assert_eq!(
        clinic.service.cancel_appointment(Uuid::new_v4(), id).await,
        Err(SchedulingError::NotFound("appointment"))
    );

    assert!(clinic
        .service
        .list_appointments_by_date(clinic.admin, MONDAY)
        .await
        .unwrap()
        .is_empty());
    assert!(clinic.book(patient, "10:00", "10:30").await.is_ok());

    // Cancelled history stays in the general listing.
    let all = clinic.service.list_appointments(clinic.admin, None, None).await.unwrap();
    assert_eq!(all.total, 2);
}

#[tokio::test]
async fn test_confirmation_is_sent_after_booking() {
    let clinic = Clinic::new().await;
    let patient = clinic.patient("Ana Lima").await;
    clinic.book(patient, "10:00", "10:30").await.unwrap();

    for _ in 0..50 {
        if !clinic.notifier.sent.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let sent = clinic.notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].patient_email, "ana.lima@example.com");
    assert_eq!(sent[0].start_time, parse_clock_time("10:00").unwrap());
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_booking() {
    let store = Arc::new(InMemoryStore::new());
    let admin = Uuid::new_v4();
    store
        .create_window(
            admin,
            DayOfWeek::try_from(1).unwrap(),
            parse_clock_time("09:00").unwrap(),
            parse_clock_time("12:00").unwrap(),
        )
        .await
        .unwrap();
    let patient = store
        .create_patient(
            admin,
            NewPatient {
                full_name: "Ana Lima".to_string(),
                email: "ana@example.com".to_string(),
                phone: "+55 11 90000-0000".to_string(),
                birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            },
        )
        .await
        .unwrap();

    let service = AppointmentBookingService::new(
        &TestConfig::default().to_app_config(),
        store,
        Arc::new(NoopListingCache),
        Arc::new(FailingNotifier),
    );

    let result = service
        .book_appointment(admin, request(patient, MONDAY, "10:00", "10:30"))
        .await;
    tokio_test::assert_ok!(result);
}

#[tokio::test]
async fn test_results_are_identical_with_cache_disabled() {
    let clinic = Clinic::with_cache(Arc::new(NoopListingCache)).await;
    let patient = clinic.patient("Ana Lima").await;

    clinic.book(patient, "10:00", "10:30").await.unwrap();
    assert_eq!(clinic.book(patient, "10:10", "10:20").await, Err(SchedulingError::SlotConflict));

    let page = clinic.service.list_appointments(clinic.admin, None, None).await.unwrap();
    assert_eq!(page.total, 1);
    assert!(!clinic.cache.stats().await.enabled);
}

/// Delegates to an in-memory store but stalls appointment writes and paged reads.
struct StallingStore {
    inner: Arc<InMemoryStore>,
    stall: Duration,
}

#[async_trait]
impl AvailabilityStore for StallingStore {
    async fn create_window(
        &self,
        admin_id: Uuid,
        weekday: DayOfWeek,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Uuid, StoreError> {
        self.inner.create_window(admin_id, weekday, start, end).await
    }

    async fn list_windows(&self, admin_id: Uuid) -> Result<Vec<AvailabilityWindow>, StoreError> {
        self.inner.list_windows(admin_id).await
    }

    async fn list_windows_by_weekday(
        &self,
        admin_id: Uuid,
        weekday: DayOfWeek,
    ) -> Result<Vec<AvailabilityWindow>, StoreError> {
        self.inner.list_windows_by_weekday(admin_id, weekday).await
    }

    async fn delete_window(&self, admin_id: Uuid, window_id: Uuid) -> Result<(), StoreError> {
        self.inner.delete_window(admin_id, window_id).await
    }
}

#[async_trait]
impl BookingStore for StallingStore {
    async fn create_appointment(&self, appointment: NewAppointment) -> Result<Uuid, StoreError> {
        tokio::time::sleep(self.stall).await;
        self.inner.create_appointment(appointment).await
    }

    async fn list_by_admin(
        &self,
        admin_id: Uuid,
        window: PageWindow,
    ) -> Result<(Vec<AppointmentView>, u64), StoreError> {
        tokio::time::sleep(self.stall).await;
        self.inner.list_by_admin(admin_id, window).await
    }

    async fn list_by_admin_and_date(
        &self,
        admin_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<AppointmentView>, StoreError> {
        self.inner.list_by_admin_and_date(admin_id, date).await
    }

    async fn count_by_admin(&self, admin_id: Uuid) -> Result<u64, StoreError> {
        self.inner.count_by_admin(admin_id).await
    }

    async fn cancel_appointment(
        &self,
        admin_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<CancelOutcome, StoreError> {
        self.inner.cancel_appointment(admin_id, appointment_id).await
    }
}

#[async_trait]
impl PatientStore for StallingStore {
    async fn create_patient(&self, admin_id: Uuid, patient: NewPatient) -> Result<Uuid, StoreError> {
        self.inner.create_patient(admin_id, patient).await
    }

    async fn find_patient(&self, admin_id: Uuid, patient_id: Uuid) -> Result<Option<Patient>, StoreError> {
        self.inner.find_patient(admin_id, patient_id).await
    }

    async fn list_patients(
        &self,
        admin_id: Uuid,
        window: PageWindow,
    ) -> Result<(Vec<PatientView>, u64), StoreError> {
        self.inner.list_patients(admin_id, window).await
    }

    async fn delete_patient(&self, admin_id: Uuid, patient_id: Uuid) -> Result<(), StoreError> {
        self.inner.delete_patient(admin_id, patient_id).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_expired_deadline_fails_without_side_effects() {
    let config = TestConfig::default().to_app_config();
    let inner = Arc::new(InMemoryStore::new());
    let admin = Uuid::new_v4();

    inner
        .create_window(
            admin,
            DayOfWeek::try_from(1).unwrap(),
            parse_clock_time("09:00").unwrap(),
            parse_clock_time("12:00").unwrap(),
        )
        .await
        .unwrap();
    let patient = inner
        .create_patient(
            admin,
            NewPatient {
                full_name: "Ana Lima".to_string(),
                email: "ana@example.com".to_string(),
                phone: "+55 11 90000-0000".to_string(),
                birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            },
        )
        .await
        .unwrap();

    let store: Arc<dyn SchedulingStore> = Arc::new(StallingStore {
        inner: Arc::clone(&inner),
        stall: config.storage_timeout * 6,
    });
    let cache: Arc<dyn ListingCache> = Arc::new(MokaListingCache::new(Duration::from_secs(30), 100));
    let notifier = Arc::new(RecordingNotifier::default());
    let service = AppointmentBookingService::new(&config, store, Arc::clone(&cache), notifier.clone());

    let booked = service
        .book_appointment(admin, request(patient, MONDAY, "10:00", "10:30"))
        .await;

    assert_matches!(booked, Err(SchedulingError::Storage(_)));
    assert_eq!(inner.count_by_admin(admin).await.unwrap(), 0);
    assert_eq!(cache.stats().await.invalidations, 0);

    // A failed read must not leave a page behind for the next caller.
    for _ in 0..2 {
        assert_matches!(
            service.list_appointments(admin, None, None).await,
            Err(SchedulingError::Storage(_))
        );
    }
    let stats = cache.stats().await;
    assert_eq!((stats.hits, stats.misses), (0, 2));

    tokio::task::yield_now().await;
    assert!(notifier.sent.lock().unwrap().is_empty());
}
