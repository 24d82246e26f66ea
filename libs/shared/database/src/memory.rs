use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::scheduling::{
    Appointment, AppointmentStatus, AppointmentView, AvailabilityWindow, DayOfWeek,
    NewAppointment, NewPatient, Patient, PatientView,
};
use shared_utils::pagination::PageWindow;

use crate::error::StoreError;
use crate::store::{AvailabilityStore, BookingStore, CancelOutcome, PatientStore};

#[derive(Default)]
struct Tables {
    windows: Vec<AvailabilityWindow>,
    appointments: Vec<Appointment>,
    patients: HashMap<Uuid, Patient>,
}

impl Tables {
    fn appointment_view(&self, appointment: &Appointment) -> Option<AppointmentView> {
        self.patients
            .get(&appointment.patient_id)
            .map(|patient| AppointmentView::from_appointment(appointment.clone(), patient.full_name.clone()))
    }
}

/// Process-local backend.
///
/// Every write runs to completion under one write lock with no suspension point
/// in between, which gives the same isolation as a single storage transaction.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AvailabilityStore for InMemoryStore {
    async fn create_window(
        &self,
        admin_id: Uuid,
        weekday: DayOfWeek,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Uuid, StoreError> {
        let mut tables = self.tables.write().await;

        let collides = tables.windows.iter().any(|existing| {
            existing.admin_id == admin_id
                && existing.weekday == weekday
                && existing.start_time < end
                && start < existing.end_time
        });
        if collides {
            debug!("exclusion check rejected window for admin {} on {}", admin_id, weekday);
            return Err(StoreError::Conflict);
        }

        let id = Uuid::new_v4();
        tables.windows.push(AvailabilityWindow {
            id,
            admin_id,
            weekday,
            start_time: start,
            end_time: end,
        });
        Ok(id)
    }

    async fn list_windows(&self, admin_id: Uuid) -> Result<Vec<AvailabilityWindow>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .windows
            .iter()
            .filter(|w| w.admin_id == admin_id)
            .cloned()
            .collect())
    }

    async fn list_windows_by_weekday(
        &self,
        admin_id: Uuid,
        weekday: DayOfWeek,
    ) -> Result<Vec<AvailabilityWindow>, StoreError> {
        let tables = self.tables.read().await;
        let mut windows: Vec<_> = tables
            .windows
            .iter()
            .filter(|w| w.admin_id == admin_id && w.weekday == weekday)
            .cloned()
            .collect();
        windows.sort_by_key(|w| (w.start_time, w.end_time));
        Ok(windows)
    }

    async fn delete_window(&self, admin_id: Uuid, window_id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.windows.len();
        tables
            .windows
            .retain(|w| !(w.id == window_id && w.admin_id == admin_id));

        if tables.windows.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn create_appointment(&self, appointment: NewAppointment) -> Result<Uuid, StoreError> {
        let mut tables = self.tables.write().await;

        let collides = tables.appointments.iter().any(|existing| {
            existing.admin_id == appointment.admin_id
                && existing.date == appointment.date
                && existing.is_scheduled()
                && existing.start_time < appointment.end_time
                && appointment.start_time < existing.end_time
        });
        if collides {
            debug!(
                "exclusion check rejected appointment for admin {} on {}",
                appointment.admin_id, appointment.date
            );
            return Err(StoreError::Conflict);
        }

        let id = Uuid::new_v4();
        tables.appointments.push(Appointment::from_new(id, appointment));
        Ok(id)
    }

    async fn list_by_admin(
        &self,
        admin_id: Uuid,
        window: PageWindow,
    ) -> Result<(Vec<AppointmentView>, u64), StoreError> {
        let tables = self.tables.read().await;

        let mut views: Vec<AppointmentView> = tables
            .appointments
            .iter()
            .filter(|a| a.admin_id == admin_id)
            .filter_map(|a| tables.appointment_view(a))
            .collect();
        views.sort_by(|a, b| {
            (&a.full_name, a.date, a.start_time, a.id).cmp(&(&b.full_name, b.date, b.start_time, b.id))
        });

        let total = views.len() as u64;
        let page = views.into_iter().skip(window.skip()).take(window.limit()).collect();

        Ok((page, total))
    }

    async fn list_by_admin_and_date(
        &self,
        admin_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<AppointmentView>, StoreError> {
        let tables = self.tables.read().await;

        let mut views: Vec<AppointmentView> = tables
            .appointments
            .iter()
            .filter(|a| a.admin_id == admin_id && a.date == date && a.is_scheduled())
            .filter_map(|a| tables.appointment_view(a))
            .collect();
        views.sort_by_key(|v| (v.start_time, v.id));

        Ok(views)
    }

    async fn count_by_admin(&self, admin_id: Uuid) -> Result<u64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.appointments.iter().filter(|a| a.admin_id == admin_id).count() as u64)
    }

    async fn cancel_appointment(
        &self,
        admin_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<CancelOutcome, StoreError> {
        let mut tables = self.tables.write().await;

        let appointment = tables
            .appointments
            .iter_mut()
            .find(|a| a.id == appointment_id && a.admin_id == admin_id)
            .ok_or(StoreError::NotFound)?;

        if appointment.status == AppointmentStatus::Cancelled {
            return Ok(CancelOutcome::AlreadyCancelled);
        }

        appointment.status = AppointmentStatus::Cancelled;
        Ok(CancelOutcome::Cancelled(appointment.clone()))
    }
}

#[async_trait]
impl PatientStore for InMemoryStore {
    async fn create_patient(&self, admin_id: Uuid, patient: NewPatient) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        self.tables.write().await.patients.insert(
            id,
            Patient {
                id,
                admin_id,
                full_name: patient.full_name,
                email: patient.email,
                phone: patient.phone,
                birth_date: patient.birth_date,
            },
        );
        Ok(id)
    }

    async fn find_patient(&self, admin_id: Uuid, patient_id: Uuid) -> Result<Option<Patient>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .patients
            .get(&patient_id)
            .filter(|p| p.admin_id == admin_id)
            .cloned())
    }

    async fn list_patients(
        &self,
        admin_id: Uuid,
        window: PageWindow,
    ) -> Result<(Vec<PatientView>, u64), StoreError> {
        let tables = self.tables.read().await;

        let mut patients: Vec<&Patient> = tables
            .patients
            .values()
            .filter(|p| p.admin_id == admin_id)
            .collect();
        patients.sort_by(|a, b| (&a.full_name, a.id).cmp(&(&b.full_name, b.id)));

        let total = patients.len() as u64;
        let page = patients
            .into_iter()
            .skip(window.skip())
            .take(window.limit())
            .cloned()
            .map(PatientView::from)
            .collect();

        Ok((page, total))
    }

    async fn delete_patient(&self, admin_id: Uuid, patient_id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .patients
            .get(&patient_id)
            .is_some_and(|p| p.admin_id == admin_id);
        if !owned {
            return Err(StoreError::NotFound);
        }
        if tables.appointments.iter().any(|a| a.patient_id == patient_id) {
            return Err(StoreError::Referenced);
        }

        tables.patients.remove(&patient_id);
        Ok(())
    }
}
