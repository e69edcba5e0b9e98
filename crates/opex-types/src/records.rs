//! Records persisted by the ledger.
//!
//! Every record serializes as a flat set of named fields. Issue, Project,
//! Distribution and Receivable for one project share its [`ProjectId`] but
//! live under different key namespaces.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::{Counterparty, Entity};
use crate::project_id::ProjectId;
use crate::request::{DistributionRequest, ProjectRequest, ReceivableRequest};

/// Currency of every monetary field.
pub const CURRENCY: &str = "JPY";

/// Balance of one ledger account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub entity: Entity,
    pub balance: Decimal,
}

impl Amount {
    pub fn zero(entity: Entity) -> Self {
        Self {
            entity,
            balance: Decimal::ZERO,
        }
    }
}

/// Funds issued into the FG pool for a project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub project_id: ProjectId,
    pub currency: String,
    pub issue_rate: Decimal,
    pub issue_amount: Decimal,
    pub issuer: Entity,
    pub issue_year: i32,
}

impl Issue {
    pub fn new(
        project_id: ProjectId,
        issue_amount: Decimal,
        issue_rate: Decimal,
        issue_year: i32,
    ) -> Self {
        Self {
            project_id,
            currency: CURRENCY.to_string(),
            issue_rate,
            issue_amount,
            issuer: Entity::Fg,
            issue_year,
        }
    }
}

/// Where a project sits in the BK/SC/TB confirmation quorum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConfirmationState {
    /// No counterparty has confirmed.
    Pending,
    /// One or two counterparties have confirmed.
    PartiallyConfirmed { confirmed: usize },
    /// All three have confirmed. Terminal.
    FullyConfirmed,
}

/// Read-only view of one counterparty's slice of a project.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Allocation<'a> {
    pub counterparty: Counterparty,
    pub dept: &'a str,
    pub team: &'a str,
    pub person: &'a str,
    pub amount: Decimal,
    pub confirmed: bool,
}

/// A registered project with its per-counterparty allocations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: ProjectId,
    pub project_name: String,
    pub invest_type: String,
    pub invest_amount: Decimal,
    pub confirmed: bool,
    pub amc_percent: Decimal,
    pub gcc_percent: Decimal,
    pub gmc_percent: Decimal,
    pub rbbc_percent: Decimal,
    pub cic_percent: Decimal,
    pub bk_dept: String,
    pub bk_team: String,
    pub bk_person: String,
    pub bk_amount: Decimal,
    pub bk_confirmed: bool,
    pub sc_dept: String,
    pub sc_team: String,
    pub sc_person: String,
    pub sc_amount: Decimal,
    pub sc_confirmed: bool,
    pub tb_dept: String,
    pub tb_team: String,
    pub tb_person: String,
    pub tb_amount: Decimal,
    pub tb_confirmed: bool,
}

impl Project {
    /// The slice of this project allocated to `cp`.
    pub fn allocation(&self, cp: Counterparty) -> Allocation<'_> {
        let (dept, team, person, amount, confirmed) = match cp {
            Counterparty::Bk => (
                &self.bk_dept,
                &self.bk_team,
                &self.bk_person,
                self.bk_amount,
                self.bk_confirmed,
            ),
            Counterparty::Sc => (
                &self.sc_dept,
                &self.sc_team,
                &self.sc_person,
                self.sc_amount,
                self.sc_confirmed,
            ),
            Counterparty::Tb => (
                &self.tb_dept,
                &self.tb_team,
                &self.tb_person,
                self.tb_amount,
                self.tb_confirmed,
            ),
        };
        Allocation {
            counterparty: cp,
            dept,
            team,
            person,
            amount,
            confirmed,
        }
    }

    pub fn is_confirmed_by(&self, cp: Counterparty) -> bool {
        self.allocation(cp).confirmed
    }

    /// Counterparties that have confirmed, in BK, SC, TB order.
    pub fn confirmed_by(&self) -> Vec<Counterparty> {
        Counterparty::ALL
            .into_iter()
            .filter(|cp| self.is_confirmed_by(*cp))
            .collect()
    }

    pub fn confirmation_state(&self) -> ConfirmationState {
        match self.confirmed_by().len() {
            0 => ConfirmationState::Pending,
            3 => ConfirmationState::FullyConfirmed,
            n => ConfirmationState::PartiallyConfirmed { confirmed: n },
        }
    }

    /// Set `cp`'s flag and refresh the aggregate `confirmed` marker.
    ///
    /// Returns `false` without changing anything if `cp` had already
    /// confirmed.
    pub fn mark_confirmed(&mut self, cp: Counterparty) -> bool {
        let flag = match cp {
            Counterparty::Bk => &mut self.bk_confirmed,
            Counterparty::Sc => &mut self.sc_confirmed,
            Counterparty::Tb => &mut self.tb_confirmed,
        };
        if *flag {
            return false;
        }
        *flag = true;
        self.confirmed = self.confirmation_state() == ConfirmationState::FullyConfirmed;
        true
    }

    /// Carry confirmation flags over from a previous version of the record.
    pub fn with_confirmations_of(mut self, previous: &Project) -> Self {
        self.bk_confirmed = previous.bk_confirmed;
        self.sc_confirmed = previous.sc_confirmed;
        self.tb_confirmed = previous.tb_confirmed;
        self.confirmed = previous.confirmed;
        self
    }
}

impl From<ProjectRequest> for Project {
    fn from(req: ProjectRequest) -> Self {
        let ProjectRequest {
            project_id,
            project_name,
            invest_type,
            invest_amount,
            fees,
            bk,
            sc,
            tb,
        } = req;
        Self {
            project_id,
            project_name,
            invest_type,
            invest_amount,
            confirmed: false,
            amc_percent: fees.amc,
            gcc_percent: fees.gcc,
            gmc_percent: fees.gmc,
            rbbc_percent: fees.rbbc,
            cic_percent: fees.cic,
            bk_dept: bk.dept,
            bk_team: bk.team,
            bk_person: bk.person,
            bk_amount: bk.amount,
            bk_confirmed: false,
            sc_dept: sc.dept,
            sc_team: sc.team,
            sc_person: sc.person,
            sc_amount: sc.amount,
            sc_confirmed: false,
            tb_dept: tb.dept,
            tb_team: tb.team,
            tb_person: tb.person,
            tb_amount: tb.amount,
            tb_confirmed: false,
        }
    }
}

/// Reporting record: how issued funds split across counterparty org units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub project_id: ProjectId,
    pub currency: String,
    pub issue_rate: Decimal,
    pub issue_amount: Decimal,
    pub issuer: Entity,
    pub bk_dept: String,
    pub bk_team: String,
    pub bk_person: String,
    pub bk_amount: Decimal,
    pub sc_dept: String,
    pub sc_team: String,
    pub sc_person: String,
    pub sc_amount: Decimal,
    pub tb_dept: String,
    pub tb_team: String,
    pub tb_person: String,
    pub tb_amount: Decimal,
}

impl Distribution {
    pub fn from_request(req: DistributionRequest, issue_rate: Decimal) -> Self {
        let DistributionRequest {
            project_id,
            issue_amount,
            bk,
            sc,
            tb,
        } = req;
        Self {
            project_id,
            currency: CURRENCY.to_string(),
            issue_rate,
            issue_amount,
            issuer: Entity::Fg,
            bk_dept: bk.dept,
            bk_team: bk.team,
            bk_person: bk.person,
            bk_amount: bk.amount,
            sc_dept: sc.dept,
            sc_team: sc.team,
            sc_person: sc.person,
            sc_amount: sc.amount,
            tb_dept: tb.dept,
            tb_team: tb.team,
            tb_person: tb.person,
            tb_amount: tb.amount,
        }
    }
}

/// Reporting record: fee and commission breakdown for a project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receivable {
    pub project_id: ProjectId,
    pub currency: String,
    pub amc_percent: Decimal,
    pub amc_amount: Decimal,
    pub gcc_percent: Decimal,
    pub gcc_amount: Decimal,
    pub gmc_percent: Decimal,
    pub gmc_amount: Decimal,
    pub rbbc_percent: Decimal,
    pub rbbc_amount: Decimal,
    pub cic_percent: Decimal,
    pub cic_amount: Decimal,
}

impl From<ReceivableRequest> for Receivable {
    fn from(req: ReceivableRequest) -> Self {
        Self {
            project_id: req.project_id,
            currency: CURRENCY.to_string(),
            amc_percent: req.amc.percent,
            amc_amount: req.amc.amount,
            gcc_percent: req.gcc.percent,
            gcc_amount: req.gcc.amount,
            gmc_percent: req.gmc.percent,
            gmc_amount: req.gmc.amount,
            rbbc_percent: req.rbbc.percent,
            rbbc_amount: req.rbbc.amount,
            cic_percent: req.cic.percent,
            cic_amount: req.cic.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Assignment, FeePercents};
    use rust_decimal_macros::dec;

    fn assignment(prefix: &str, amount: Decimal) -> Assignment {
        Assignment {
            dept: format!("{prefix}-dept"),
            team: format!("{prefix}-team"),
            person: format!("{prefix}-person"),
            amount,
        }
    }

    fn project() -> Project {
        Project::from(ProjectRequest {
            project_id: ProjectId::parse("P1").unwrap(),
            project_name: "Harbor".into(),
            invest_type: "equity".into(),
            invest_amount: dec!(600),
            fees: FeePercents {
                amc: dec!(1),
                gcc: dec!(2),
                gmc: dec!(3),
                rbbc: dec!(4),
                cic: dec!(5),
            },
            bk: assignment("bk", dec!(300)),
            sc: assignment("sc", dec!(200)),
            tb: assignment("tb", dec!(100)),
        })
    }

    // -----------------------------------------------------------------------
    // Project confirmation flags
    // -----------------------------------------------------------------------

    #[test]
    fn new_project_is_pending() {
        let p = project();
        assert!(!p.confirmed);
        assert_eq!(p.confirmation_state(), ConfirmationState::Pending);
        assert!(p.confirmed_by().is_empty());
    }

    #[test]
    fn allocation_view_matches_fields() {
        let p = project();
        let sc = p.allocation(Counterparty::Sc);
        assert_eq!(sc.dept, "sc-dept");
        assert_eq!(sc.amount, dec!(200));
        assert!(!sc.confirmed);
    }

    #[test]
    fn mark_confirmed_walks_the_quorum() {
        let mut p = project();
        assert!(p.mark_confirmed(Counterparty::Tb));
        assert_eq!(
            p.confirmation_state(),
            ConfirmationState::PartiallyConfirmed { confirmed: 1 }
        );
        assert!(!p.confirmed);

        assert!(p.mark_confirmed(Counterparty::Bk));
        assert!(!p.confirmed);

        assert!(p.mark_confirmed(Counterparty::Sc));
        assert!(p.confirmed);
        assert_eq!(p.confirmation_state(), ConfirmationState::FullyConfirmed);
    }

    #[test]
    fn mark_confirmed_twice_is_refused() {
        let mut p = project();
        assert!(p.mark_confirmed(Counterparty::Bk));
        let before = p.clone();
        assert!(!p.mark_confirmed(Counterparty::Bk));
        assert_eq!(p, before);
    }

    #[test]
    fn confirmations_carry_over() {
        let mut old = project();
        old.mark_confirmed(Counterparty::Sc);
        let mut fresh = project();
        fresh.project_name = "Renamed".into();
        let merged = fresh.with_confirmations_of(&old);
        assert_eq!(merged.project_name, "Renamed");
        assert_eq!(merged.confirmed_by(), vec![Counterparty::Sc]);
    }

    // -----------------------------------------------------------------------
    // Serialized shape
    // -----------------------------------------------------------------------

    #[test]
    fn project_serializes_flat() {
        let json = serde_json::to_value(project()).unwrap();
        assert_eq!(json["project_id"], "P1");
        assert_eq!(json["bk_amount"], "300");
        assert_eq!(json["tb_confirmed"], false);
        assert!(json.get("bk").is_none());
    }

    #[test]
    fn issue_defaults() {
        let issue = Issue::new(ProjectId::parse("P1").unwrap(), dec!(1000), dec!(1), 2025);
        assert_eq!(issue.currency, "JPY");
        assert_eq!(issue.issuer, Entity::Fg);
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["issuer"], "FG");
        assert_eq!(json["issue_year"], 2025);
    }

    #[test]
    fn distribution_from_request() {
        let d = Distribution::from_request(
            DistributionRequest {
                project_id: ProjectId::parse("P2").unwrap(),
                issue_amount: dec!(600),
                bk: assignment("bk", dec!(300)),
                sc: assignment("sc", dec!(200)),
                tb: assignment("tb", dec!(100)),
            },
            dec!(1.5),
        );
        assert_eq!(d.issue_rate, dec!(1.5));
        assert_eq!(d.sc_team, "sc-team");
        assert_eq!(d.currency, CURRENCY);
    }

    #[test]
    fn confirmation_state_serializes_tagged() {
        let json =
            serde_json::to_value(ConfirmationState::PartiallyConfirmed { confirmed: 2 }).unwrap();
        assert_eq!(json["state"], "partially_confirmed");
        assert_eq!(json["confirmed"], 2);
    }
}
