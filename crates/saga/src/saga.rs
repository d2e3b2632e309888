//! In-process record of one billing saga run.

use domain::ReservationId;

use crate::error::BillingError;
use crate::invoice_billing;
use crate::state::SagaState;

/// An undo action for a step that has already taken effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// Give reserved stock back to inventory.
    ReleaseReservation(ReservationId),
}

impl Compensation {
    pub fn name(&self) -> &'static str {
        match self {
            Compensation::ReleaseReservation(_) => invoice_billing::COMPENSATE_RELEASE_RESERVATION,
        }
    }
}

/// Tracks state, completed steps and registered compensations.
///
/// A compensation is registered by the step it undoes, only after that step
/// succeeded, and can be discarded once a later step makes it unnecessary.
#[derive(Debug, Clone, Default)]
pub struct BillingSaga {
    state: SagaState,
    completed_steps: Vec<&'static str>,
    compensations: Vec<(&'static str, Compensation)>,
    failed_step: Option<&'static str>,
    failure_reason: Option<String>,
}

impl BillingSaga {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SagaState {
        self.state
    }

    pub fn completed_steps(&self) -> &[&'static str] {
        &self.completed_steps
    }

    /// Compensations that would run if the saga failed now, oldest first.
    pub fn pending_compensations(&self) -> impl Iterator<Item = &Compensation> {
        self.compensations.iter().map(|(_, c)| c)
    }

    pub fn failed_step(&self) -> Option<&'static str> {
        self.failed_step
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn start(&mut self) -> Result<(), BillingError> {
        self.transition(SagaState::Running)
    }

    pub fn complete_step(&mut self, step: &'static str) {
        tracing::debug!(step, "saga step completed");
        self.completed_steps.push(step);
    }

    pub fn register_compensation(&mut self, step: &'static str, compensation: Compensation) {
        tracing::debug!(step, compensation = compensation.name(), "compensation registered");
        self.compensations.push((step, compensation));
    }

    /// Drops every compensation registered by `step`.
    pub fn discard_compensations(&mut self, step: &'static str) {
        self.compensations.retain(|(owner, _)| *owner != step);
    }

    /// Marks `step` as failed, moves to `Compensating` and hands back the
    /// registered compensations in reverse registration order.
    pub fn begin_compensation(
        &mut self,
        step: &'static str,
        reason: impl Into<String>,
    ) -> Result<Vec<Compensation>, BillingError> {
        self.transition(SagaState::Compensating)?;
        self.failed_step = Some(step);
        self.failure_reason = Some(reason.into());
        Ok(self
            .compensations
            .drain(..)
            .rev()
            .map(|(_, compensation)| compensation)
            .collect())
    }

    pub fn fail(&mut self) -> Result<(), BillingError> {
        self.transition(SagaState::Failed)
    }

    pub fn complete(&mut self) -> Result<(), BillingError> {
        self.transition(SagaState::Completed)
    }

    fn transition(&mut self, next: SagaState) -> Result<(), BillingError> {
        if !self.state.can_transition_to(next) {
            return Err(BillingError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(from = %self.state, to = %next, "saga transition");
        self.state = next;
        Ok(())
    }
}
