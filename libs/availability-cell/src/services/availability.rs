use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{Deadline, SchedulingStore, StoreError};
use shared_models::scheduling::{DayOfWeek, WindowView};
use shared_models::SchedulingError;
use shared_utils::time::parse_clock_time;

use crate::models::CreateWindowRequest;

pub struct AvailabilityService {
    store: Arc<dyn SchedulingStore>,
    storage_timeout: Duration,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn SchedulingStore>, config: &AppConfig) -> Self {
        Self {
            store,
            storage_timeout: config.storage_timeout,
        }
    }

    fn deadline(&self) -> Deadline {
        Deadline::after(self.storage_timeout)
    }

    /// Declare a recurring weekly window for the admin.
    pub async fn create_window(
        &self,
        admin_id: Uuid,
        request: CreateWindowRequest,
    ) -> Result<Uuid, SchedulingError> {
        debug!("Creating availability window for admin: {}", admin_id);

        let weekday = DayOfWeek::try_from(request.weekday).map_err(SchedulingError::InvalidArgument)?;
        let start = parse_clock_time(&request.start_time)?;
        let end = parse_clock_time(&request.end_time)?;

        if start >= end {
            return Err(SchedulingError::InvalidRange);
        }

        let deadline = self.deadline();
        let same_day = deadline
            .run("list_windows_by_weekday", self.store.list_windows_by_weekday(admin_id, weekday))
            .await
            .map_err(|e| e.for_entity("availability window"))?;

        if let Some(existing) = same_day.iter().find(|w| w.overlaps(start, end)) {
            debug!(
                "Window {}-{} on day {} overlaps existing window {}",
                request.start_time, request.end_time, weekday, existing.id
            );
            return Err(SchedulingError::WindowOverlap);
        }

        // A concurrent create can slip past the read above; the store's exclusion rule catches it.
        let id = deadline
            .run("create_window", self.store.create_window(admin_id, weekday, start, end))
            .await
            .map_err(|e| match e {
                StoreError::Conflict => SchedulingError::WindowOverlap,
                other => other.for_entity("availability window"),
            })?;

        info!("Availability window {} created for admin {}", id, admin_id);
        Ok(id)
    }

    pub async fn list_windows(&self, admin_id: Uuid) -> Result<Vec<WindowView>, SchedulingError> {
        let windows = self
            .deadline()
            .run("list_windows", self.store.list_windows(admin_id))
            .await
            .map_err(|e| e.for_entity("availability window"))?;

        Ok(windows.into_iter().map(WindowView::from).collect())
    }

    pub async fn delete_window(&self, admin_id: Uuid, window_id: Uuid) -> Result<(), SchedulingError> {
        self.deadline()
            .run("delete_window", self.store.delete_window(admin_id, window_id))
            .await
            .map_err(|e| e.for_entity("availability window"))?;

        info!("Availability window {} deleted for admin {}", window_id, admin_id);
        Ok(())
    }
}
