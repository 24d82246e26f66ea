use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::scheduling::{
    clock, Appointment, AppointmentStatus, AppointmentView, AvailabilityWindow, DayOfWeek,
    NewAppointment, NewPatient, Patient, PatientView, DATE_FORMAT,
};
use shared_utils::pagination::PageWindow;

use crate::error::StoreError;
use crate::store::{AvailabilityStore, BookingStore, CancelOutcome, PatientStore};
use crate::supabase::{return_representation, SupabaseClient};

const APPOINTMENT_VIEW_SELECT: &str =
    "id,client_id,patient_id,date,start_time,end_time,status,patients!inner(full_name)";

#[derive(Debug, Deserialize)]
struct IdRow {
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct WindowRow {
    id: Uuid,
    client_id: Uuid,
    weekday: DayOfWeek,
    #[serde(with = "clock")]
    start_time: NaiveTime,
    #[serde(with = "clock")]
    end_time: NaiveTime,
}

impl From<WindowRow> for AvailabilityWindow {
    fn from(row: WindowRow) -> Self {
        Self {
            id: row.id,
            admin_id: row.client_id,
            weekday: row.weekday,
            start_time: row.start_time,
            end_time: row.end_time,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PatientName {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct AppointmentRow {
    id: Uuid,
    client_id: Uuid,
    patient_id: Uuid,
    date: NaiveDate,
    #[serde(with = "clock")]
    start_time: NaiveTime,
    #[serde(with = "clock")]
    end_time: NaiveTime,
    status: AppointmentStatus,
    patients: Option<PatientName>,
}

impl AppointmentRow {
    fn into_appointment(self) -> Appointment {
        Appointment {
            id: self.id,
            admin_id: self.client_id,
            patient_id: self.patient_id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            status: self.status,
        }
    }
}

impl From<AppointmentRow> for AppointmentView {
    fn from(mut row: AppointmentRow) -> Self {
        let full_name = row.patients.take().map(|p| p.full_name).unwrap_or_default();
        AppointmentView::from_appointment(row.into_appointment(), full_name)
    }
}

#[derive(Debug, Deserialize)]
struct PatientRow {
    id: Uuid,
    client_id: Uuid,
    full_name: String,
    email: String,
    phone: String,
    birth_date: NaiveDate,
}

impl From<PatientRow> for Patient {
    fn from(row: PatientRow) -> Self {
        Self {
            id: row.id,
            admin_id: row.client_id,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            birth_date: row.birth_date,
        }
    }
}

/// Backend over Supabase's PostgREST interface.
///
/// Overlap exclusion is enforced by the `appointments_no_overlap` and
/// `calendar_slots_no_overlap` constraints in `migrations/001_scheduling.sql`.
/// PostgREST reports violations as 409 with SQLSTATE 23P01 in the body.
pub struct SupabaseStore {
    supabase: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn insert_returning_id(
        &self,
        operation: &'static str,
        table: &str,
        body: serde_json::Value,
    ) -> Result<Uuid, StoreError> {
        let rows: Vec<IdRow> = self
            .supabase
            .request(
                Method::POST,
                &format!("/rest/v1/{}?select=id", table),
                Some(body),
                Some(return_representation()),
            )
            .await
            .map_err(|e| StoreError::from_supabase(operation, e))?;

        rows.into_iter()
            .next()
            .map(|row| row.id)
            .ok_or_else(|| StoreError::backend(operation, "insert returned no row"))
    }

    async fn delete_owned(
        &self,
        operation: &'static str,
        table: &str,
        admin_id: Uuid,
        id: Uuid,
    ) -> Result<(), StoreError> {
        let path = format!("/rest/v1/{}?id=eq.{}&client_id=eq.{}&select=id", table, id, admin_id);
        let deleted: Vec<IdRow> = self
            .supabase
            .request(Method::DELETE, &path, None, Some(return_representation()))
            .await
            .map_err(|e| StoreError::from_supabase(operation, e))?;

        if deleted.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl AvailabilityStore for SupabaseStore {
    async fn create_window(
        &self,
        admin_id: Uuid,
        weekday: DayOfWeek,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Uuid, StoreError> {
        self.insert_returning_id(
            "create_window",
            "calendar_slots",
            json!({
                "client_id": admin_id,
                "weekday": weekday.index(),
                "start_time": start.format("%H:%M:%S").to_string(),
                "end_time": end.format("%H:%M:%S").to_string(),
            }),
        )
        .await
    }

    async fn list_windows(&self, admin_id: Uuid) -> Result<Vec<AvailabilityWindow>, StoreError> {
        let path = format!(
            "/rest/v1/calendar_slots?client_id=eq.{}&select=id,client_id,weekday,start_time,end_time&order=weekday.asc,start_time.asc",
            admin_id
        );
        let rows: Vec<WindowRow> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| StoreError::from_supabase("list_windows", e))?;

        Ok(rows.into_iter().map(AvailabilityWindow::from).collect())
    }

    async fn list_windows_by_weekday(
        &self,
        admin_id: Uuid,
        weekday: DayOfWeek,
    ) -> Result<Vec<AvailabilityWindow>, StoreError> {
        let path = format!(
            "/rest/v1/calendar_slots?client_id=eq.{}&weekday=eq.{}&select=id,client_id,weekday,start_time,end_time&order=start_time.asc",
            admin_id, weekday
        );
        let rows: Vec<WindowRow> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| StoreError::from_supabase("list_windows_by_weekday", e))?;

        Ok(rows.into_iter().map(AvailabilityWindow::from).collect())
    }

    async fn delete_window(&self, admin_id: Uuid, window_id: Uuid) -> Result<(), StoreError> {
        self.delete_owned("delete_window", "calendar_slots", admin_id, window_id)
            .await
    }
}

#[async_trait]
impl BookingStore for SupabaseStore {
    async fn create_appointment(&self, appointment: NewAppointment) -> Result<Uuid, StoreError> {
        let result = self
            .insert_returning_id(
                "create_appointment",
                "appointments",
                json!({
                    "client_id": appointment.admin_id,
                    "patient_id": appointment.patient_id,
                    "date": appointment.date.format(DATE_FORMAT).to_string(),
                    "start_time": appointment.start_time.format("%H:%M:%S").to_string(),
                    "end_time": appointment.end_time.format("%H:%M:%S").to_string(),
                    "status": AppointmentStatus::Scheduled.as_str(),
                }),
            )
            .await;

        if result == Err(StoreError::Conflict) {
            debug!(
                "appointments_no_overlap rejected insert for admin {} on {}",
                appointment.admin_id, appointment.date
            );
        }
        result
    }

    async fn list_by_admin(
        &self,
        admin_id: Uuid,
        window: PageWindow,
    ) -> Result<(Vec<AppointmentView>, u64), StoreError> {
        let path = format!(
            "/rest/v1/appointments?client_id=eq.{}&select={}&order=patients(full_name).asc,date.asc,start_time.asc,id.asc&limit={}&offset={}",
            admin_id, APPOINTMENT_VIEW_SELECT, window.page_size, window.offset
        );
        let (rows, total): (Vec<AppointmentRow>, u64) = self
            .supabase
            .request_with_count(&path)
            .await
            .map_err(|e| StoreError::from_supabase("list_by_admin", e))?;

        Ok((rows.into_iter().map(AppointmentView::from).collect(), total))
    }

    async fn list_by_admin_and_date(
        &self,
        admin_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<AppointmentView>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?client_id=eq.{}&date=eq.{}&status=eq.scheduled&select={}&order=start_time.asc,id.asc",
            admin_id,
            date.format(DATE_FORMAT),
            APPOINTMENT_VIEW_SELECT
        );
        let rows: Vec<AppointmentRow> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| StoreError::from_supabase("list_by_admin_and_date", e))?;

        Ok(rows.into_iter().map(AppointmentView::from).collect())
    }

    async fn count_by_admin(&self, admin_id: Uuid) -> Result<u64, StoreError> {
        let path = format!("/rest/v1/appointments?client_id=eq.{}&select=id&limit=0", admin_id);
        let (_, total): (Vec<IdRow>, u64) = self
            .supabase
            .request_with_count(&path)
            .await
            .map_err(|e| StoreError::from_supabase("count_by_admin", e))?;

        Ok(total)
    }

    async fn cancel_appointment(
        &self,
        admin_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<CancelOutcome, StoreError> {
        // The status filter makes the transition a single conditional update.
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&client_id=eq.{}&status=eq.scheduled&select=id,client_id,patient_id,date,start_time,end_time,status",
            appointment_id, admin_id
        );
        let updated: Vec<AppointmentRow> = self
            .supabase
            .request(
                Method::PATCH,
                &path,
                Some(json!({ "status": AppointmentStatus::Cancelled.as_str() })),
                Some(return_representation()),
            )
            .await
            .map_err(|e| StoreError::from_supabase("cancel_appointment", e))?;

        if let Some(row) = updated.into_iter().next() {
            return Ok(CancelOutcome::Cancelled(row.into_appointment()));
        }

        let lookup = format!(
            "/rest/v1/appointments?id=eq.{}&client_id=eq.{}&select=id",
            appointment_id, admin_id
        );
        let existing: Vec<IdRow> = self
            .supabase
            .request(Method::GET, &lookup, None, None)
            .await
            .map_err(|e| StoreError::from_supabase("cancel_appointment", e))?;

        if existing.is_empty() {
            Err(StoreError::NotFound)
        } else {
            Ok(CancelOutcome::AlreadyCancelled)
        }
    }
}

#[async_trait]
impl PatientStore for SupabaseStore {
    async fn create_patient(&self, admin_id: Uuid, patient: NewPatient) -> Result<Uuid, StoreError> {
        self.insert_returning_id(
            "create_patient",
            "patients",
            json!({
                "client_id": admin_id,
                "full_name": patient.full_name,
                "email": patient.email,
                "phone": patient.phone,
                "birth_date": patient.birth_date.format(DATE_FORMAT).to_string(),
            }),
        )
        .await
    }

    async fn find_patient(&self, admin_id: Uuid, patient_id: Uuid) -> Result<Option<Patient>, StoreError> {
        let path = format!(
            "/rest/v1/patients?id=eq.{}&client_id=eq.{}&select=id,client_id,full_name,email,phone,birth_date",
            patient_id, admin_id
        );
        let rows: Vec<PatientRow> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| StoreError::from_supabase("find_patient", e))?;

        Ok(rows.into_iter().next().map(Patient::from))
    }

    async fn list_patients(
        &self,
        admin_id: Uuid,
        window: PageWindow,
    ) -> Result<(Vec<PatientView>, u64), StoreError> {
        let path = format!(
            "/rest/v1/patients?client_id=eq.{}&select=id,client_id,full_name,email,phone,birth_date&order=full_name.asc,id.asc&limit={}&offset={}",
            admin_id, window.page_size, window.offset
        );
        let (rows, total): (Vec<PatientRow>, u64) = self
            .supabase
            .request_with_count(&path)
            .await
            .map_err(|e| StoreError::from_supabase("list_patients", e))?;

        Ok((
            rows.into_iter().map(Patient::from).map(PatientView::from).collect(),
            total,
        ))
    }

    async fn delete_patient(&self, admin_id: Uuid, patient_id: Uuid) -> Result<(), StoreError> {
        self.delete_owned("delete_patient", "patients", admin_id, patient_id)
            .await
    }
}
