use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use performance_cell::{CachedListing, ListingCache, ScopeKey};
use shared_config::AppConfig;
use shared_database::{CancelOutcome, Deadline, SchedulingStore};
use shared_models::scheduling::{Appointment, AppointmentView, NewAppointment};
use shared_models::SchedulingError;
use shared_utils::pagination::{Page, PageWindow};
use shared_utils::time::{parse_clock_time, parse_date};

use crate::models::BookAppointmentRequest;
use crate::services::notification::{BookingConfirmation, BookingNotifier};
use crate::services::resolver::AvailabilityResolver;

pub struct AppointmentBookingService {
    store: Arc<dyn SchedulingStore>,
    resolver: AvailabilityResolver,
    cache: Arc<dyn ListingCache>,
    notifier: Arc<dyn BookingNotifier>,
    storage_timeout: Duration,
    default_page_size: i64,
}

impl AppointmentBookingService {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn SchedulingStore>,
        cache: Arc<dyn ListingCache>,
        notifier: Arc<dyn BookingNotifier>,
    ) -> Self {
        Self {
            resolver: AvailabilityResolver::new(Arc::clone(&store)),
            store,
            cache,
            notifier,
            storage_timeout: config.storage_timeout,
            default_page_size: config.default_page_size,
        }
    }

    fn deadline(&self) -> Deadline {
        Deadline::after(self.storage_timeout)
    }

    pub async fn book_appointment(
        &self,
        admin_id: Uuid,
        request: BookAppointmentRequest,
    ) -> Result<Uuid, SchedulingError> {
        debug!("Booking request from admin {} for patient {}", admin_id, request.patient_id);

        let date = parse_date(&request.date)?;
        let start_time = parse_clock_time(&request.start_time)?;
        let end_time = parse_clock_time(&request.end_time)?;

        if start_time >= end_time {
            return Err(SchedulingError::InvalidRange);
        }

        let deadline = self.deadline();
        let patient = deadline
            .run("find_patient", self.store.find_patient(admin_id, request.patient_id))
            .await
            .map_err(|e| e.for_entity("patient"))?
            .ok_or(SchedulingError::NotFound("patient"))?;

        let appointment_id = self
            .resolver
            .resolve(
                NewAppointment {
                    admin_id,
                    patient_id: patient.id,
                    date,
                    start_time,
                    end_time,
                },
                deadline,
            )
            .await?;

        info!("Appointment {} booked for admin {} on {}", appointment_id, admin_id, date);

        // The booking stands even if stale listings survive until their TTL.
        if let Err(e) = self.cache.invalidate_admin(admin_id).await {
            warn!("Listing cache not invalidated for admin {}: {}", admin_id, e);
        }

        let notifier = Arc::clone(&self.notifier);
        let confirmation = BookingConfirmation {
            patient_email: patient.email,
            date,
            start_time,
            end_time,
        };
        tokio::spawn(async move {
            if let Err(e) = notifier.notify_booking_confirmed(&confirmation).await {
                warn!("Confirmation for appointment {} not delivered: {}", appointment_id, e);
            }
        });

        Ok(appointment_id)
    }

    pub async fn list_appointments(
        &self,
        admin_id: Uuid,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Page<AppointmentView>, SchedulingError> {
        let window = PageWindow::from_query(page, page_size, self.default_page_size)?;
        let key = ScopeKey::appointments(admin_id, window);

        if let Some(CachedListing::Appointments(cached)) = self.cache.get(&key).await {
            debug!("Appointment listing served from cache for admin {}", admin_id);
            return Ok((*cached).clone());
        }

        let (data, total) = self
            .deadline()
            .run("list_by_admin", self.store.list_by_admin(admin_id, window))
            .await
            .map_err(|e| e.for_entity("appointment"))?;

        let page = Arc::new(Page::assemble(data, window, total));
        self.cache
            .put(key, CachedListing::Appointments(Arc::clone(&page)))
            .await;

        Ok((*page).clone())
    }

    pub async fn list_appointments_by_date(
        &self,
        admin_id: Uuid,
        date_text: &str,
    ) -> Result<Vec<AppointmentView>, SchedulingError> {
        let date = parse_date(date_text)?;
        let key = ScopeKey::appointments_on(admin_id, date);

        if let Some(CachedListing::AppointmentsByDate(cached)) = self.cache.get(&key).await {
            debug!("Appointments on {} served from cache for admin {}", date, admin_id);
            return Ok((*cached).clone());
        }

        let appointments = self
            .deadline()
            .run("list_by_admin_and_date", self.store.list_by_admin_and_date(admin_id, date))
            .await
            .map_err(|e| e.for_entity("appointment"))?;

        self.cache
            .put(key, CachedListing::AppointmentsByDate(Arc::new(appointments.clone())))
            .await;

        Ok(appointments)
    }

    pub async fn count_appointments(&self, admin_id: Uuid) -> Result<u64, SchedulingError> {
        self.deadline()
            .run("count_by_admin", self.store.count_by_admin(admin_id))
            .await
            .map_err(|e| e.for_entity("appointment"))
    }

    pub async fn cancel_appointment(
        &self,
        admin_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        let outcome = self
            .deadline()
            .run("cancel_appointment", self.store.cancel_appointment(admin_id, appointment_id))
            .await
            .map_err(|e| e.for_entity("appointment"))?;

        match outcome {
            CancelOutcome::Cancelled(appointment) => {
                info!("Appointment {} cancelled by admin {}", appointment_id, admin_id);
                if let Err(e) = self.cache.invalidate_admin(admin_id).await {
                    warn!("Listing cache not invalidated for admin {}: {}", admin_id, e);
                }
                Ok(appointment)
            }
            CancelOutcome::AlreadyCancelled => Err(SchedulingError::AlreadyCancelled),
        }
    }
}
