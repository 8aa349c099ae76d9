use std::sync::Arc;

use shardplan_semantics::SemTable;

use crate::PlannerSettings;

/// Everything an operator may consult while rewriting itself. Shared by all
/// candidate plans of one compilation.
#[derive(Debug, Clone)]
pub struct PlanningContext {
    pub sem_table: Arc<SemTable>,
    pub settings: PlannerSettings,
}

impl PlanningContext {
    pub fn new(sem_table: Arc<SemTable>) -> Self {
        Self::with_settings(sem_table, PlannerSettings::default())
    }

    pub fn with_settings(sem_table: Arc<SemTable>, settings: PlannerSettings) -> Self {
        Self {
            sem_table,
            settings,
        }
    }
}
