use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use shared_models::scheduling::{
    Appointment, AppointmentView, AvailabilityWindow, DayOfWeek, NewAppointment, NewPatient,
    Patient, PatientView,
};
use shared_utils::pagination::PageWindow;

use crate::error::StoreError;

/// Persistence for an admin's recurring weekly availability.
///
/// `start < end` is validated by callers.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] when a window of the same admin and
    /// weekday overlaps `[start, end)` at commit time.
    async fn create_window(
        &self,
        admin_id: Uuid,
        weekday: DayOfWeek,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Uuid, StoreError>;

    async fn list_windows(&self, admin_id: Uuid) -> Result<Vec<AvailabilityWindow>, StoreError>;

    /// Ordered by start time ascending.
    async fn list_windows_by_weekday(
        &self,
        admin_id: Uuid,
        weekday: DayOfWeek,
    ) -> Result<Vec<AvailabilityWindow>, StoreError>;

    /// `NotFound` when no window with this id belongs to the admin.
    async fn delete_window(&self, admin_id: Uuid, window_id: Uuid) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled(Appointment),
    AlreadyCancelled,
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Inserts with status `scheduled`.
    ///
    /// Fails with [`StoreError::Conflict`] when another scheduled appointment of the
    /// same admin and date overlaps `[start, end)` at commit time. This is the
    /// storage exclusion constraint, not a business pre-check.
    async fn create_appointment(&self, appointment: NewAppointment) -> Result<Uuid, StoreError>;

    /// Joined with patient names, ordered by patient full name ascending.
    async fn list_by_admin(
        &self,
        admin_id: Uuid,
        window: PageWindow,
    ) -> Result<(Vec<AppointmentView>, u64), StoreError>;

    /// Scheduled appointments only, ordered by start time ascending.
    async fn list_by_admin_and_date(
        &self,
        admin_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<AppointmentView>, StoreError>;

    async fn count_by_admin(&self, admin_id: Uuid) -> Result<u64, StoreError>;

    /// One-way `scheduled -> cancelled`.
    async fn cancel_appointment(
        &self,
        admin_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<CancelOutcome, StoreError>;
}

#[async_trait]
pub trait PatientStore: Send + Sync {
    async fn create_patient(&self, admin_id: Uuid, patient: NewPatient) -> Result<Uuid, StoreError>;

    async fn find_patient(&self, admin_id: Uuid, patient_id: Uuid) -> Result<Option<Patient>, StoreError>;

    /// Ordered by full name ascending.
    async fn list_patients(
        &self,
        admin_id: Uuid,
        window: PageWindow,
    ) -> Result<(Vec<PatientView>, u64), StoreError>;

    /// Fails with [`StoreError::Referenced`] while any appointment, cancelled or
    /// not, still points at the patient.
    async fn delete_patient(&self, admin_id: Uuid, patient_id: Uuid) -> Result<(), StoreError>;
}

/// A backend holding all scheduling relations.
pub trait SchedulingStore: AvailabilityStore + BookingStore + PatientStore {}

impl<T> SchedulingStore for T where T: AvailabilityStore + BookingStore + PatientStore {}
