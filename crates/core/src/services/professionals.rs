//! Professional management.

use crate::registry::Registry;
use crate::validation::normalise_professional;
use crate::{CapsError, CapsResult};
use caps_types::{Professional, ProfessionalDetails, RecordId};
use chrono::Utc;
use std::sync::Arc;

/// Service for the staff who perform attendance actions.
#[derive(Clone, Debug)]
pub struct ProfessionalService {
    registry: Arc<Registry>,
}

impl ProfessionalService {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn create(&self, details: ProfessionalDetails) -> CapsResult<Professional> {
        let professional = Professional::create(normalise_professional(details), Utc::now());
        self.registry.professionals.insert(&professional)?;

        tracing::info!("created professional {}", professional.id);
        Ok(professional)
    }

    pub fn get(&self, id: RecordId) -> CapsResult<Professional> {
        self.registry.professionals.require(id)
    }

    /// Professionals ordered by name; with `active_only`, inactive ones are left out.
    pub fn list(&self, active_only: bool) -> CapsResult<Vec<Professional>> {
        let mut professionals: Vec<_> = self
            .registry
            .professionals
            .list()?
            .into_iter()
            .filter(|p| !active_only || p.details.active)
            .collect();
        professionals.sort_by_cached_key(|p| p.details.name.as_str().to_lowercase());
        Ok(professionals)
    }

    pub fn update(&self, id: RecordId, details: ProfessionalDetails) -> CapsResult<Professional> {
        let _guard = self.registry.write_guard()?;
        let mut professional = self.registry.professionals.require(id)?;
        professional.apply(normalise_professional(details), Utc::now());
        self.registry.professionals.update(&professional)?;

        tracing::info!("updated professional {}", id);
        Ok(professional)
    }

    /// Deletes a professional.
    ///
    /// # Errors
    ///
    /// Returns [`CapsError::Conflict`] while any attendance action references the professional;
    /// deactivate them instead.
    pub fn delete(&self, id: RecordId) -> CapsResult<()> {
        let _guard = self.registry.write_guard()?;
        self.registry.professionals.require(id)?;

        let referenced = self
            .registry
            .actions
            .list()?
            .iter()
            .any(|a| a.details.professional_id == id);
        if referenced {
            return Err(CapsError::Conflict(format!(
                "professional {} is referenced by attendance actions",
                id
            )));
        }

        self.registry.professionals.delete(id)?;
        tracing::info!("deleted professional {}", id);
        Ok(())
    }
}
