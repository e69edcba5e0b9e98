use opex_store::{KvStore, WriteBatch};
use opex_types::{ConfirmationState, Counterparty, Decimal, Entity, ProjectId};
use serde::Serialize;
use tracing::warn;

use crate::amount::AmountLedger;
use crate::error::{LedgerError, LedgerResult};
use crate::journal::Journal;
use crate::project::ProjectRegistry;

/// What a successful confirmation did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfirmOutcome {
    pub project_id: ProjectId,
    pub entity: Counterparty,
    pub amount: Decimal,
    pub state: ConfirmationState,
    pub fg_balance: Decimal,
    pub entity_balance: Decimal,
}

/// Quorum confirmation: each of BK, SC and TB confirms a project once, and
/// its allocation moves from FG at that moment.
///
/// The flag update and the balance transfer land in one batch, so a project
/// flag is never set without its transfer or the other way round.
pub struct ConfirmationWorkflow<'a> {
    store: &'a dyn KvStore,
}

impl<'a> ConfirmationWorkflow<'a> {
    pub fn new(store: &'a dyn KvStore) -> Self {
        Self { store }
    }

    pub fn confirm(
        &self,
        project_id: &ProjectId,
        entity: Counterparty,
    ) -> LedgerResult<ConfirmOutcome> {
        let registry = ProjectRegistry::new(self.store);
        let mut project = registry.get(project_id.as_str())?;

        if !project.mark_confirmed(entity) {
            warn!(project_id = %project_id, entity = %entity, "repeat confirmation rejected");
            return Err(LedgerError::AlreadyConfirmed {
                project_id: project_id.to_string(),
                entity,
            });
        }

        let amount = project.allocation(entity).amount;
        let mut batch = WriteBatch::new();
        let (fg, dest) = AmountLedger::new(self.store).stage_transfer(
            &mut batch,
            Entity::Fg,
            entity.entity(),
            amount,
        )?;
        registry.stage(&mut batch, &project)?;
        Journal::new(self.store).apply(&format!("confirm/{project_id}/{entity}"), batch)?;

        Ok(ConfirmOutcome {
            project_id: project_id.clone(),
            entity,
            amount,
            state: project.confirmation_state(),
            fg_balance: fg.balance,
            entity_balance: dest.balance,
        })
    }
}
