use opex_store::KvStore;
use opex_types::{Amount, Decimal, Distribution, Entity, Issue, Project, Receivable};
use serde::Serialize;

use crate::amount::AmountLedger;
use crate::error::{LedgerError, LedgerResult};
use crate::project::ProjectRegistry;
use crate::record_log::{RecordLog, Scan};

/// Read-only access to every record kind.
pub struct QueryService<'a> {
    store: &'a dyn KvStore,
}

impl<'a> QueryService<'a> {
    pub fn new(store: &'a dyn KvStore) -> Self {
        Self { store }
    }

    pub fn get_current_amount(&self, entity: Entity) -> LedgerResult<Amount> {
        AmountLedger::new(self.store).get_balance(entity)
    }

    pub fn get_project(&self, project_id: &str) -> LedgerResult<Project> {
        ProjectRegistry::new(self.store).get(project_id)
    }

    pub fn get_issue(&self, project_id: &str) -> LedgerResult<Issue> {
        RecordLog::new(self.store).get(project_id)
    }

    pub fn get_distribution(&self, project_id: &str) -> LedgerResult<Distribution> {
        RecordLog::new(self.store).get(project_id)
    }

    pub fn get_receivable(&self, project_id: &str) -> LedgerResult<Receivable> {
        RecordLog::new(self.store).get(project_id)
    }

    pub fn get_all_project(&self) -> Scan<'a, Project> {
        ProjectRegistry::new(self.store).list_all()
    }

    pub fn get_all_issue(&self) -> Scan<'a, Issue> {
        RecordLog::new(self.store).list_all()
    }

    pub fn get_all_distribution(&self) -> Scan<'a, Distribution> {
        RecordLog::new(self.store).list_all()
    }

    pub fn get_all_receivable(&self) -> Scan<'a, Receivable> {
        RecordLog::new(self.store).list_all()
    }

    /// Compare the balance total against everything ever issued.
    pub fn conservation(&self) -> LedgerResult<ConservationReport> {
        let amounts = AmountLedger::new(self.store);
        let balances = amounts.balances()?;
        let balance_total = amounts.total()?;

        let mut issued_total = Decimal::ZERO;
        for issue in self.get_all_issue().iter()? {
            issued_total = issued_total
                .checked_add(issue?.issue_amount)
                .ok_or_else(|| LedgerError::InvalidArgument("issued total out of range".into()))?;
        }

        Ok(ConservationReport {
            balanced: balances.len() == Entity::ALL.len() && balance_total == issued_total,
            balances,
            balance_total,
            issued_total,
        })
    }
}

/// Result of a conservation check.
///
/// `balanced` is false when an account is missing or when the balances do
/// not add up to the issued total. Balances are measured from the last
/// `init`, so a ledger re-initialised after issuing reports unbalanced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConservationReport {
    pub balances: Vec<Amount>,
    pub balance_total: Decimal,
    pub issued_total: Decimal,
    pub balanced: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use opex_store::{InMemoryKvStore, WriteBatch};
    use opex_types::ProjectId;
    use rust_decimal_macros::dec;

    fn issue(store: &dyn KvStore, id: &str, amount: Decimal) {
        let amounts = AmountLedger::new(store);
        let mut batch = WriteBatch::new();
        amounts.stage_credit(&mut batch, Entity::Fg, amount).unwrap();
        RecordLog::new(store)
            .stage(
                &mut batch,
                &Issue::new(ProjectId::parse(id).unwrap(), amount, dec!(1), 2024),
            )
            .unwrap();
        store.commit(batch).unwrap();
    }

    #[test]
    fn point_reads_are_not_found_when_absent() {
        let store = InMemoryKvStore::new();
        let query = QueryService::new(&store);
        assert!(matches!(
            query.get_project("unknown"),
            Err(LedgerError::NotFound { kind: "project", .. })
        ));
        assert!(matches!(
            query.get_receivable("unknown"),
            Err(LedgerError::NotFound { kind: "receivable", .. })
        ));
        assert!(matches!(
            query.get_distribution("unknown"),
            Err(LedgerError::NotFound { kind: "distribution", .. })
        ));
        assert!(matches!(
            query.get_current_amount(Entity::Fg),
            Err(LedgerError::NotFound { kind: "amount", .. })
        ));
    }

    #[test]
    fn listings_are_ordered_and_separate() {
        let store = InMemoryKvStore::new();
        AmountLedger::new(&store).init().unwrap();
        issue(&store, "P2", dec!(5));
        issue(&store, "P1", dec!(7));
        let query = QueryService::new(&store);
        let ids: Vec<String> = query
            .get_all_issue()
            .collect_all()
            .unwrap()
            .into_iter()
            .map(|i| i.project_id.to_string())
            .collect();
        assert_eq!(ids, vec!["P1", "P2"]);
        assert!(query.get_all_project().collect_all().unwrap().is_empty());
        assert_eq!(query.get_issue("P1").unwrap().issue_amount, dec!(7));
    }

    // -----------------------------------------------------------------------
    // Conservation
    // -----------------------------------------------------------------------

    #[test]
    fn balanced_after_issue_and_transfer() {
        let store = InMemoryKvStore::new();
        AmountLedger::new(&store).init().unwrap();
        issue(&store, "P1", dec!(1000));
        AmountLedger::new(&store)
            .transfer(Entity::Fg, Entity::Tb, dec!(250))
            .unwrap();
        let report = QueryService::new(&store).conservation().unwrap();
        assert!(report.balanced);
        assert_eq!(report.balance_total, dec!(1000));
        assert_eq!(report.issued_total, dec!(1000));
        assert_eq!(report.balances.len(), 4);
    }

    #[test]
    fn reinit_after_issue_is_unbalanced() {
        let store = InMemoryKvStore::new();
        AmountLedger::new(&store).init().unwrap();
        issue(&store, "P1", dec!(10));
        AmountLedger::new(&store).init().unwrap();
        let report = QueryService::new(&store).conservation().unwrap();
        assert!(!report.balanced);
        assert_eq!(report.balance_total, Decimal::ZERO);
        assert_eq!(report.issued_total, dec!(10));
    }

    #[test]
    fn uninitialised_ledger_is_unbalanced() {
        let store = InMemoryKvStore::new();
        let report = QueryService::new(&store).conservation().unwrap();
        assert!(!report.balanced);
        assert!(report.balances.is_empty());
    }
}
