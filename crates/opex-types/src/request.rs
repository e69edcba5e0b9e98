//! Typed, validated arguments for the mutating operations.
//!
//! Each request declares its positional field names in wire order
//! (`FIELDS`) and builds itself from raw strings in one named pass, so the
//! arity check and every numeric conversion happen before any state is
//! touched.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::money::parse_amount;
use crate::project_id::ProjectId;

/// Org unit and amount assigned to one counterparty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub dept: String,
    pub team: String,
    pub person: String,
    pub amount: Decimal,
}

/// Percentages for the five fee categories.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePercents {
    pub amc: Decimal,
    pub gcc: Decimal,
    pub gmc: Decimal,
    pub rbbc: Decimal,
    pub cic: Decimal,
}

/// Percent and amount for one fee category of a receivable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeShare {
    pub percent: Decimal,
    pub amount: Decimal,
}

/// `issue`: credit the issuer pool for a project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueRequest {
    pub project_id: ProjectId,
    pub amount: Decimal,
}

impl IssueRequest {
    pub const FIELDS: &'static [&'static str] = &["project_id", "amount"];

    pub fn from_args(args: &[String]) -> Result<Self, TypeError> {
        let mut f = FieldReader::new(Self::FIELDS, args)?;
        Ok(Self {
            project_id: f.project_id()?,
            amount: f.amount()?,
        })
    }
}

/// `project` / `updateproject`: the 21-field project registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectRequest {
    pub project_id: ProjectId,
    pub project_name: String,
    pub invest_type: String,
    pub invest_amount: Decimal,
    pub fees: FeePercents,
    pub bk: Assignment,
    pub sc: Assignment,
    pub tb: Assignment,
}

impl ProjectRequest {
    pub const FIELDS: &'static [&'static str] = &[
        "project_id",
        "project_name",
        "invest_type",
        "invest_amount",
        "amc_percent",
        "gcc_percent",
        "gmc_percent",
        "rbbc_percent",
        "cic_percent",
        "bk_dept",
        "bk_team",
        "bk_person",
        "bk_amount",
        "sc_dept",
        "sc_team",
        "sc_person",
        "sc_amount",
        "tb_dept",
        "tb_team",
        "tb_person",
        "tb_amount",
    ];

    pub fn from_args(args: &[String]) -> Result<Self, TypeError> {
        let mut f = FieldReader::new(Self::FIELDS, args)?;
        Ok(Self {
            project_id: f.project_id()?,
            project_name: f.text(),
            invest_type: f.text(),
            invest_amount: f.amount()?,
            fees: FeePercents {
                amc: f.amount()?,
                gcc: f.amount()?,
                gmc: f.amount()?,
                rbbc: f.amount()?,
                cic: f.amount()?,
            },
            bk: f.assignment()?,
            sc: f.assignment()?,
            tb: f.assignment()?,
        })
    }
}

/// `distribution`: how issued funds are apportioned across org units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistributionRequest {
    pub project_id: ProjectId,
    pub issue_amount: Decimal,
    pub bk: Assignment,
    pub sc: Assignment,
    pub tb: Assignment,
}

impl DistributionRequest {
    pub const FIELDS: &'static [&'static str] = &[
        "project_id",
        "issue_amount",
        "bk_dept",
        "bk_team",
        "bk_person",
        "bk_amount",
        "sc_dept",
        "sc_team",
        "sc_person",
        "sc_amount",
        "tb_dept",
        "tb_team",
        "tb_person",
        "tb_amount",
    ];

    pub fn from_args(args: &[String]) -> Result<Self, TypeError> {
        let mut f = FieldReader::new(Self::FIELDS, args)?;
        Ok(Self {
            project_id: f.project_id()?,
            issue_amount: f.amount()?,
            bk: f.assignment()?,
            sc: f.assignment()?,
            tb: f.assignment()?,
        })
    }
}

/// `receivable`: fee breakdown for a project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivableRequest {
    pub project_id: ProjectId,
    pub amc: FeeShare,
    pub gcc: FeeShare,
    pub gmc: FeeShare,
    pub rbbc: FeeShare,
    pub cic: FeeShare,
}

impl ReceivableRequest {
    pub const FIELDS: &'static [&'static str] = &[
        "project_id",
        "amc_percent",
        "amc_amount",
        "gcc_percent",
        "gcc_amount",
        "gmc_percent",
        "gmc_amount",
        "rbbc_percent",
        "rbbc_amount",
        "cic_percent",
        "cic_amount",
    ];

    pub fn from_args(args: &[String]) -> Result<Self, TypeError> {
        let mut f = FieldReader::new(Self::FIELDS, args)?;
        Ok(Self {
            project_id: f.project_id()?,
            amc: f.fee_share()?,
            gcc: f.fee_share()?,
            gmc: f.fee_share()?,
            rbbc: f.fee_share()?,
            cic: f.fee_share()?,
        })
    }
}

/// Walks a positional argument list alongside its field names.
struct FieldReader<'a> {
    names: &'static [&'static str],
    args: &'a [String],
    next: usize,
}

impl<'a> FieldReader<'a> {
    fn new(names: &'static [&'static str], args: &'a [String]) -> Result<Self, TypeError> {
        if args.len() != names.len() {
            return Err(TypeError::Arity {
                expected: names.len(),
                actual: args.len(),
            });
        }
        Ok(Self {
            names,
            args,
            next: 0,
        })
    }

    fn take(&mut self) -> (&'static str, &'a str) {
        let index = self.next;
        self.next += 1;
        (self.names[index], self.args[index].as_str())
    }

    fn text(&mut self) -> String {
        self.take().1.to_string()
    }

    fn project_id(&mut self) -> Result<ProjectId, TypeError> {
        ProjectId::parse(self.take().1)
    }

    fn amount(&mut self) -> Result<Decimal, TypeError> {
        let (field, raw) = self.take();
        parse_amount(field, raw)
    }

    fn assignment(&mut self) -> Result<Assignment, TypeError> {
        Ok(Assignment {
            dept: self.text(),
            team: self.text(),
            person: self.text(),
            amount: self.amount()?,
        })
    }

    fn fee_share(&mut self) -> Result<FeeShare, TypeError> {
        Ok(FeeShare {
            percent: self.amount()?,
            amount: self.amount()?,
        })
    }
}
