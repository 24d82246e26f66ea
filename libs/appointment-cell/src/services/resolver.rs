use std::sync::Arc;

use chrono::NaiveTime;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::{Deadline, SchedulingStore, StoreError};
use shared_models::scheduling::{AppointmentView, AvailabilityWindow, DayOfWeek, NewAppointment};
use shared_models::SchedulingError;

/// First window that fully contains `[start, end)`. A request spanning two
/// adjacent windows is not contained by either.
pub fn containing_window(
    windows: &[AvailabilityWindow],
    start: NaiveTime,
    end: NaiveTime,
) -> Option<&AvailabilityWindow> {
    windows.iter().find(|window| window.contains(start, end))
}

/// First scheduled appointment overlapping `[start, end)`. Back-to-back is not overlap.
pub fn first_conflict(
    existing: &[AppointmentView],
    start: NaiveTime,
    end: NaiveTime,
) -> Option<&AppointmentView> {
    existing.iter().find(|appointment| appointment.overlaps(start, end))
}

/// Admits a booking against the admin's weekly availability and the day's
/// scheduled appointments, then commits it.
///
/// The pre-check against the day's appointments gives callers a precise
/// rejection. Two requests that both pass it concurrently are still separated by
/// the store's exclusion constraint, whose rejection surfaces here as
/// [`SchedulingError::SlotConflict`].
pub struct AvailabilityResolver {
    store: Arc<dyn SchedulingStore>,
}

impl AvailabilityResolver {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(
        &self,
        request: NewAppointment,
        deadline: Deadline,
    ) -> Result<Uuid, SchedulingError> {
        if request.start_time >= request.end_time {
            return Err(SchedulingError::InvalidRange);
        }

        let weekday = DayOfWeek::of(request.date);
        let windows = deadline
            .run(
                "list_windows_by_weekday",
                self.store.list_windows_by_weekday(request.admin_id, weekday),
            )
            .await
            .map_err(|e| e.for_entity("availability window"))?;

        if windows.is_empty() {
            warn!(
                "No availability on weekday {} for admin {}",
                weekday, request.admin_id
            );
            return Err(SchedulingError::OutsideAvailability);
        }

        let Some(window) = containing_window(&windows, request.start_time, request.end_time) else {
            warn!(
                "{} {}-{} is outside every window of admin {}",
                request.date, request.start_time, request.end_time, request.admin_id
            );
            return Err(SchedulingError::OutsideAvailability);
        };
        debug!("Request fits window {}", window.id);

        let existing = deadline
            .run(
                "list_by_admin_and_date",
                self.store.list_by_admin_and_date(request.admin_id, request.date),
            )
            .await
            .map_err(|e| e.for_entity("appointment"))?;

        if let Some(conflict) = first_conflict(&existing, request.start_time, request.end_time) {
            warn!(
                "{} {}-{} conflicts with appointment {}",
                request.date, request.start_time, request.end_time, conflict.id
            );
            return Err(SchedulingError::SlotConflict);
        }

        let admin_id = request.admin_id;
        let date = request.date;
        match deadline
            .run("create_appointment", self.store.create_appointment(request))
            .await
        {
            Ok(id) => Ok(id),
            Err(StoreError::Conflict) => {
                warn!(
                    "Concurrent booking for admin {} on {} lost the exclusion check",
                    admin_id, date
                );
                Err(SchedulingError::SlotConflict)
            }
            Err(e) => Err(e.for_entity("appointment")),
        }
    }
}
