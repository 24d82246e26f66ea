use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use performance_cell::{CachedListing, ListingCache, ScopeKey};
use shared_config::AppConfig;
use shared_database::{Deadline, SchedulingStore};
use shared_models::scheduling::{NewPatient, PatientView};
use shared_models::SchedulingError;
use shared_utils::pagination::{Page, PageWindow};
use shared_utils::time::parse_date;

use crate::models::CreatePatientRequest;

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"));

pub struct PatientService {
    store: Arc<dyn SchedulingStore>,
    cache: Arc<dyn ListingCache>,
    storage_timeout: Duration,
    default_page_size: i64,
}

impl PatientService {
    pub fn new(config: &AppConfig, store: Arc<dyn SchedulingStore>, cache: Arc<dyn ListingCache>) -> Self {
        Self {
            store,
            cache,
            storage_timeout: config.storage_timeout,
            default_page_size: config.default_page_size,
        }
    }

    fn deadline(&self) -> Deadline {
        Deadline::after(self.storage_timeout)
    }

    async fn invalidate_listings(&self, admin_id: Uuid) {
        if let Err(e) = self.cache.invalidate_admin(admin_id).await {
            warn!("Listing cache not invalidated for admin {}: {}", admin_id, e);
        }
    }

    pub async fn create_patient(
        &self,
        admin_id: Uuid,
        request: CreatePatientRequest,
    ) -> Result<Uuid, SchedulingError> {
        let full_name = request.full_name.trim();
        if full_name.is_empty() {
            return Err(SchedulingError::InvalidArgument("full_name is required".to_string()));
        }
        if !EMAIL_SHAPE.is_match(&request.email) {
            return Err(SchedulingError::InvalidArgument(format!(
                "invalid email '{}'",
                request.email
            )));
        }
        let birth_date = parse_date(&request.birth_date)?;

        debug!("Creating patient for admin {}", admin_id);

        let patient = NewPatient {
            full_name: full_name.to_string(),
            email: request.email,
            phone: request.phone,
            birth_date,
        };
        let id = self
            .deadline()
            .run("create_patient", self.store.create_patient(admin_id, patient))
            .await
            .map_err(|e| e.for_entity("patient"))?;

        info!("Patient {} created for admin {}", id, admin_id);
        self.invalidate_listings(admin_id).await;
        Ok(id)
    }

    pub async fn list_patients(
        &self,
        admin_id: Uuid,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Page<PatientView>, SchedulingError> {
        let window = PageWindow::from_query(page, page_size, self.default_page_size)?;
        let key = ScopeKey::patients(admin_id, window);

        if let Some(CachedListing::Patients(cached)) = self.cache.get(&key).await {
            return Ok((*cached).clone());
        }

        let (data, total) = self
            .deadline()
            .run("list_patients", self.store.list_patients(admin_id, window))
            .await
            .map_err(|e| e.for_entity("patient"))?;

        let page = Arc::new(Page::assemble(data, window, total));
        self.cache
            .put(key, CachedListing::Patients(Arc::clone(&page)))
            .await;

        Ok((*page).clone())
    }

    /// Rejected with `InUse` while any appointment still references the patient.
    pub async fn delete_patient(&self, admin_id: Uuid, patient_id: Uuid) -> Result<(), SchedulingError> {
        self.deadline()
            .run("delete_patient", self.store.delete_patient(admin_id, patient_id))
            .await
            .map_err(|e| e.for_entity("patient"))?;

        info!("Patient {} deleted by admin {}", patient_id, admin_id);
        self.invalidate_listings(admin_id).await;
        Ok(())
    }
}
