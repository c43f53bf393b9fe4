//! SIGTAP procedure catalogue.

use crate::registry::Registry;
use crate::validation::normalise_procedure;
use crate::{CapsError, CapsResult};
use caps_types::{Procedure, ProcedureDetails, RecordId};
use chrono::Utc;
use std::sync::Arc;

/// Service for the procedures attendance actions are recorded against.
#[derive(Clone, Debug)]
pub struct ProcedureService {
    registry: Arc<Registry>,
}

impl ProcedureService {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Adds a procedure.
    ///
    /// # Errors
    ///
    /// Returns [`CapsError::Conflict`] if another procedure already uses the same SIGTAP code.
    pub fn create(&self, details: ProcedureDetails) -> CapsResult<Procedure> {
        let details = normalise_procedure(details);
        let _guard = self.registry.write_guard()?;
        self.ensure_code_unused(&details, None)?;

        let procedure = Procedure::create(details, Utc::now());
        self.registry.procedures.insert(&procedure)?;

        tracing::info!(
            "created procedure {} ({})",
            procedure.id,
            procedure.details.sigtap_code
        );
        Ok(procedure)
    }

    pub fn get(&self, id: RecordId) -> CapsResult<Procedure> {
        self.registry.procedures.require(id)
    }

    /// Procedures ordered by SIGTAP code; with `active_only`, inactive ones are left out.
    pub fn list(&self, active_only: bool) -> CapsResult<Vec<Procedure>> {
        let mut procedures: Vec<_> = self
            .registry
            .procedures
            .list()?
            .into_iter()
            .filter(|p| !active_only || p.details.active)
            .collect();
        procedures.sort_by(|a, b| a.details.sigtap_code.cmp(&b.details.sigtap_code));
        Ok(procedures)
    }

    pub fn update(&self, id: RecordId, details: ProcedureDetails) -> CapsResult<Procedure> {
        let details = normalise_procedure(details);
        let _guard = self.registry.write_guard()?;
        let mut procedure = self.registry.procedures.require(id)?;
        self.ensure_code_unused(&details, Some(id))?;

        procedure.apply(details, Utc::now());
        self.registry.procedures.update(&procedure)?;

        tracing::info!("updated procedure {}", id);
        Ok(procedure)
    }

    /// Deletes a procedure.
    ///
    /// # Errors
    ///
    /// Returns [`CapsError::Conflict`] while any attendance action references the procedure.
    pub fn delete(&self, id: RecordId) -> CapsResult<()> {
        let _guard = self.registry.write_guard()?;
        self.registry.procedures.require(id)?;

        let referenced = self
            .registry
            .actions
            .list()?
            .iter()
            .any(|a| a.details.procedure_id == id);
        if referenced {
            return Err(CapsError::Conflict(format!(
                "procedure {} is referenced by attendance actions",
                id
            )));
        }

        self.registry.procedures.delete(id)?;
        tracing::info!("deleted procedure {}", id);
        Ok(())
    }

    fn ensure_code_unused(
        &self,
        details: &ProcedureDetails,
        except: Option<RecordId>,
    ) -> CapsResult<()> {
        let taken = self
            .registry
            .procedures
            .list()?
            .iter()
            .any(|p| Some(p.id) != except && p.details.sigtap_code == details.sigtap_code);
        if taken {
            return Err(CapsError::Conflict(format!(
                "SIGTAP code {} is already registered",
                details.sigtap_code
            )));
        }
        Ok(())
    }
}
