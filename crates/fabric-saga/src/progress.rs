//! Saga Progress Log
//!
//! Execution records for assignment sagas. The caller of an assignment
//! only ever sees "accepted"; this log is how the outcome becomes
//! observable afterwards.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Saga overall status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SagaStatus {
    Pending,
    Running,
    Completed,
    /// Stopped early by design, e.g. no identity manager signature yet
    Stopped,
    Failed,
}

/// Per-step status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum StepStatus {
    Running,
    Completed,
    Failed,
}

/// One step of one application's sub-saga
#[derive(Clone, Debug, Serialize)]
pub struct StepRecord {
    pub application: String,
    pub step: String,
    pub status: StepStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// Execution record of one assignment saga
#[derive(Clone, Debug, Serialize)]
pub struct SagaExecution {
    pub id: String,
    pub tenant_identifier: String,
    pub status: SagaStatus,
    pub steps: Vec<StepRecord>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Why a saga stopped early, when it did
    pub note: Option<String>,
}

/// Concurrent registry of saga executions
#[derive(Clone, Default)]
pub struct SagaProgressLog {
    executions: Arc<DashMap<String, SagaExecution>>,
}

impl SagaProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new execution record; returns its id
    pub fn begin(&self, tenant_identifier: &str) -> String {
        let id = Uuid::new_v4().to_string();
        self.executions.insert(
            id.clone(),
            SagaExecution {
                id: id.clone(),
                tenant_identifier: tenant_identifier.to_string(),
                status: SagaStatus::Pending,
                steps: Vec::new(),
                started_at: Utc::now(),
                completed_at: None,
                note: None,
            },
        );
        id
    }

    pub fn mark_running(&self, execution_id: &str) {
        if let Some(mut execution) = self.executions.get_mut(execution_id) {
            execution.status = SagaStatus::Running;
        }
    }

    pub fn step_started(&self, execution_id: &str, application: &str, step: &str) {
        if let Some(mut execution) = self.executions.get_mut(execution_id) {
            execution.steps.push(StepRecord {
                application: application.to_string(),
                step: step.to_string(),
                status: StepStatus::Running,
                started_at: Utc::now(),
                completed_at: None,
                error: None,
            });
        }
    }

    pub fn step_completed(&self, execution_id: &str, application: &str, step: &str) {
        self.close_step(execution_id, application, step, StepStatus::Completed, None);
    }

    pub fn step_failed(&self, execution_id: &str, application: &str, step: &str, error: &str) {
        self.close_step(
            execution_id,
            application,
            step,
            StepStatus::Failed,
            Some(error.to_string()),
        );
    }

    fn close_step(
        &self,
        execution_id: &str,
        application: &str,
        step: &str,
        status: StepStatus,
        error: Option<String>,
    ) {
        if let Some(mut execution) = self.executions.get_mut(execution_id) {
            if let Some(record) = execution
                .steps
                .iter_mut()
                .rev()
                .find(|s| s.application == application && s.step == step)
            {
                record.status = status;
                record.completed_at = Some(Utc::now());
                record.error = error;
            }
        }
    }

    pub fn finish(&self, execution_id: &str, status: SagaStatus, note: Option<String>) {
        if let Some(mut execution) = self.executions.get_mut(execution_id) {
            execution.status = status;
            execution.completed_at = Some(Utc::now());
            execution.note = note;
        }
    }

    pub fn get(&self, execution_id: &str) -> Option<SagaExecution> {
        self.executions.get(execution_id).map(|e| e.value().clone())
    }

    pub fn for_tenant(&self, tenant_identifier: &str) -> Vec<SagaExecution> {
        self.executions
            .iter()
            .filter(|e| e.tenant_identifier == tenant_identifier)
            .map(|e| e.value().clone())
            .collect()
    }
}
