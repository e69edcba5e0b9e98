use opex_store::{KvStore, WriteBatch};
use opex_types::{Amount, Decimal, Entity};

use crate::error::{LedgerError, LedgerResult};
use crate::journal::Journal;
use crate::record_log::RecordLog;

/// The four account balances.
///
/// Transfers move value between accounts and never create or destroy it;
/// only an issue credit adds to the total.
pub struct AmountLedger<'a> {
    store: &'a dyn KvStore,
    accounts: RecordLog<'a, Amount>,
}

impl<'a> AmountLedger<'a> {
    pub fn new(store: &'a dyn KvStore) -> Self {
        Self {
            store,
            accounts: RecordLog::new(store),
        }
    }

    /// Reset all four balances to zero. Safe to repeat.
    pub fn init(&self) -> LedgerResult<()> {
        let mut batch = WriteBatch::new();
        for entity in Entity::ALL {
            self.accounts.stage(&mut batch, &Amount::zero(entity))?;
        }
        Journal::new(self.store).apply("init", batch)
    }

    pub fn get_balance(&self, entity: Entity) -> LedgerResult<Amount> {
        self.accounts.get(entity.code())
    }

    /// Every initialised account, FG first.
    pub fn balances(&self) -> LedgerResult<Vec<Amount>> {
        Entity::ALL
            .into_iter()
            .filter_map(|entity| self.accounts.find(entity.code()).transpose())
            .collect()
    }

    /// Sum of every initialised balance.
    pub fn total(&self) -> LedgerResult<Decimal> {
        let mut total = Decimal::ZERO;
        for amount in self.balances()? {
            total = checked(total.checked_add(amount.balance))?;
        }
        Ok(total)
    }

    /// Move `amount` from one account to another as a single unit.
    ///
    /// Returns the updated source and destination rows.
    pub fn transfer(
        &self,
        from: Entity,
        to: Entity,
        amount: Decimal,
    ) -> LedgerResult<(Amount, Amount)> {
        let mut batch = WriteBatch::new();
        let moved = self.stage_transfer(&mut batch, from, to, amount)?;
        Journal::new(self.store).apply(&format!("transfer/{from}/{to}"), batch)?;
        Ok(moved)
    }

    /// Validate a transfer and add its two balance writes to `batch`.
    pub fn stage_transfer(
        &self,
        batch: &mut WriteBatch,
        from: Entity,
        to: Entity,
        amount: Decimal,
    ) -> LedgerResult<(Amount, Amount)> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::InvalidArgument(format!(
                "transfer amount must not be negative, got {amount}"
            )));
        }
        if from == to {
            return Err(LedgerError::InvalidArgument(format!(
                "cannot transfer from {from} to itself"
            )));
        }

        let mut source = self.get_balance(from)?;
        let mut dest = self.get_balance(to)?;
        if source.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                entity: from,
                balance: source.balance,
                requested: amount,
            });
        }

        source.balance = checked(source.balance.checked_sub(amount))?;
        dest.balance = checked(dest.balance.checked_add(amount))?;
        self.accounts.stage(batch, &source)?;
        self.accounts.stage(batch, &dest)?;
        Ok((source, dest))
    }

    /// Add `amount` to one account's balance in `batch`.
    pub fn stage_credit(
        &self,
        batch: &mut WriteBatch,
        entity: Entity,
        amount: Decimal,
    ) -> LedgerResult<Amount> {
        let mut account = self.get_balance(entity)?;
        account.balance = checked(account.balance.checked_add(amount))?;
        self.accounts.stage(batch, &account)?;
        Ok(account)
    }
}

fn checked(value: Option<Decimal>) -> LedgerResult<Decimal> {
    value.ok_or_else(|| LedgerError::InvalidArgument("amount out of range".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use opex_store::InMemoryKvStore;
    use rust_decimal_macros::dec;

    fn funded(store: &InMemoryKvStore, fg: Decimal) -> AmountLedger<'_> {
        let ledger = AmountLedger::new(store);
        ledger.init().unwrap();
        let mut batch = WriteBatch::new();
        ledger.stage_credit(&mut batch, Entity::Fg, fg).unwrap();
        store.commit(batch).unwrap();
        ledger
    }

    // -----------------------------------------------------------------------
    // init
    // -----------------------------------------------------------------------

    #[test]
    fn init_zeroes_all_four() {
        let store = InMemoryKvStore::new();
        let ledger = AmountLedger::new(&store);
        ledger.init().unwrap();
        for entity in Entity::ALL {
            assert_eq!(ledger.get_balance(entity).unwrap().balance, Decimal::ZERO);
        }
    }

    #[test]
    fn init_twice_resets() {
        let store = InMemoryKvStore::new();
        let ledger = funded(&store, dec!(500));
        ledger.init().unwrap();
        ledger.init().unwrap();
        assert_eq!(ledger.total().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn uninitialised_account_is_not_found() {
        let store = InMemoryKvStore::new();
        let ledger = AmountLedger::new(&store);
        assert!(matches!(
            ledger.get_balance(Entity::Tb),
            Err(LedgerError::NotFound { kind: "amount", .. })
        ));
        assert!(ledger.balances().unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // transfer
    // -----------------------------------------------------------------------

    #[test]
    fn transfer_moves_value() {
        let store = InMemoryKvStore::new();
        let ledger = funded(&store, dec!(1000));
        let (fg, bk) = ledger.transfer(Entity::Fg, Entity::Bk, dec!(300)).unwrap();
        assert_eq!(fg.balance, dec!(700));
        assert_eq!(bk.balance, dec!(300));
        assert_eq!(ledger.total().unwrap(), dec!(1000));
    }

    #[test]
    fn zero_transfer_is_allowed() {
        let store = InMemoryKvStore::new();
        let ledger = funded(&store, dec!(1));
        ledger.transfer(Entity::Fg, Entity::Sc, Decimal::ZERO).unwrap();
        assert_eq!(ledger.get_balance(Entity::Fg).unwrap().balance, dec!(1));
    }

    #[test]
    fn negative_transfer_rejected() {
        let store = InMemoryKvStore::new();
        let ledger = funded(&store, dec!(100));
        let err = ledger.transfer(Entity::Fg, Entity::Bk, dec!(-5)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument(_)));
        assert_eq!(ledger.get_balance(Entity::Fg).unwrap().balance, dec!(100));
    }

    #[test]
    fn self_transfer_rejected() {
        let store = InMemoryKvStore::new();
        let ledger = funded(&store, dec!(100));
        assert!(matches!(
            ledger.transfer(Entity::Fg, Entity::Fg, dec!(1)),
            Err(LedgerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn overdraft_rejected_without_change() {
        let store = InMemoryKvStore::new();
        let ledger = funded(&store, dec!(100));
        let err = ledger.transfer(Entity::Fg, Entity::Tb, dec!(100.01)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                entity: Entity::Fg,
                balance: dec!(100),
                requested: dec!(100.01),
            }
        );
        assert_eq!(ledger.get_balance(Entity::Tb).unwrap().balance, Decimal::ZERO);
    }

    #[test]
    fn transfer_before_init_is_not_found() {
        let store = InMemoryKvStore::new();
        let ledger = AmountLedger::new(&store);
        assert!(matches!(
            ledger.transfer(Entity::Fg, Entity::Bk, dec!(1)),
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[test]
    fn read_only_store_is_unavailable() {
        let store = InMemoryKvStore::new();
        let ledger = funded(&store, dec!(10));
        store.set_read_only(true);
        let err = ledger.transfer(Entity::Fg, Entity::Bk, dec!(1)).unwrap_err();
        assert!(matches!(err, LedgerError::Unavailable(_)));
        assert_eq!(ledger.get_balance(Entity::Fg).unwrap().balance, dec!(10));
    }
}
