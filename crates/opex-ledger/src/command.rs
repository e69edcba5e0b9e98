//! Typed commands and the operation table.
//!
//! Each catalog operation has exactly one [`Command`] variant and one parser
//! in [`OPERATIONS`]. Callers that receive an operation name and positional
//! string arguments go through [`Command::parse`]; everything after that is
//! typed.

use opex_types::{
    Amount, Counterparty, Distribution, DistributionRequest, Entity, Issue, IssueRequest, Project,
    ProjectId, ProjectRequest, Receivable, ReceivableRequest, TypeError,
};
use serde::Serialize;

use crate::confirm::ConfirmOutcome;
use crate::error::{LedgerError, LedgerResult};
use crate::query::ConservationReport;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Init,
    Issue(IssueRequest),
    Project(ProjectRequest),
    UpdateProject(ProjectRequest),
    Receivable(ReceivableRequest),
    Distribution(DistributionRequest),
    Confirm {
        project_id: ProjectId,
        entity: Counterparty,
    },
    GetCurrentAmount(Entity),
    GetProject(ProjectId),
    GetIssue(ProjectId),
    GetDistribution(ProjectId),
    GetReceivable(ProjectId),
    GetAllProject,
    GetAllIssue,
    GetAllDistribution,
    GetAllReceivable,
    Verify,
}

/// One row of the operation catalog.
pub struct Operation {
    pub name: &'static str,
    /// Positional argument names, in order.
    pub fields: &'static [&'static str],
    pub mutates: bool,
    parse: fn(&[String]) -> Result<Command, TypeError>,
}

impl Operation {
    pub fn parse(&self, args: &[String]) -> LedgerResult<Command> {
        (self.parse)(args)
            .map_err(|e| LedgerError::InvalidArgument(format!("{}: {e}", self.name)))
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("mutates", &self.mutates)
            .finish()
    }
}

const PROJECT_ID: &[&str] = &["project_id"];
const ENTITY: &[&str] = &["entity"];
const CONFIRM: &[&str] = &["project_id", "entity"];

pub static OPERATIONS: &[Operation] = &[
    Operation {
        name: "init",
        fields: &[],
        mutates: true,
        parse: parse_init,
    },
    Operation {
        name: "issue",
        fields: IssueRequest::FIELDS,
        mutates: true,
        parse: parse_issue,
    },
    Operation {
        name: "project",
        fields: ProjectRequest::FIELDS,
        mutates: true,
        parse: parse_project,
    },
    Operation {
        name: "updateproject",
        fields: ProjectRequest::FIELDS,
        mutates: true,
        parse: parse_update_project,
    },
    Operation {
        name: "receivable",
        fields: ReceivableRequest::FIELDS,
        mutates: true,
        parse: parse_receivable,
    },
    Operation {
        name: "distribution",
        fields: DistributionRequest::FIELDS,
        mutates: true,
        parse: parse_distribution,
    },
    Operation {
        name: "confirm",
        fields: CONFIRM,
        mutates: true,
        parse: parse_confirm,
    },
    Operation {
        name: "get_current_amount",
        fields: ENTITY,
        mutates: false,
        parse: parse_get_current_amount,
    },
    Operation {
        name: "get_project",
        fields: PROJECT_ID,
        mutates: false,
        parse: parse_get_project,
    },
    Operation {
        name: "get_issue",
        fields: PROJECT_ID,
        mutates: false,
        parse: parse_get_issue,
    },
    Operation {
        name: "get_distribution",
        fields: PROJECT_ID,
        mutates: false,
        parse: parse_get_distribution,
    },
    Operation {
        name: "get_receivable",
        fields: PROJECT_ID,
        mutates: false,
        parse: parse_get_receivable,
    },
    Operation {
        name: "get_all_project",
        fields: &[],
        mutates: false,
        parse: parse_get_all_project,
    },
    Operation {
        name: "get_all_issue",
        fields: &[],
        mutates: false,
        parse: parse_get_all_issue,
    },
    Operation {
        name: "get_all_distribution",
        fields: &[],
        mutates: false,
        parse: parse_get_all_distribution,
    },
    Operation {
        name: "get_all_receivable",
        fields: &[],
        mutates: false,
        parse: parse_get_all_receivable,
    },
    Operation {
        name: "verify",
        fields: &[],
        mutates: false,
        parse: parse_verify,
    },
];

impl Command {
    /// Look up `name` in the operation table and parse `args` for it.
    pub fn parse(name: &str, args: &[String]) -> LedgerResult<Command> {
        Self::operation(name)
            .ok_or_else(|| LedgerError::InvalidArgument(format!("unknown operation: {name}")))?
            .parse(args)
    }

    pub fn operation(name: &str) -> Option<&'static Operation> {
        OPERATIONS.iter().find(|op| op.name == name)
    }

    /// The catalog name of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Init => "init",
            Command::Issue(_) => "issue",
            Command::Project(_) => "project",
            Command::UpdateProject(_) => "updateproject",
            Command::Receivable(_) => "receivable",
            Command::Distribution(_) => "distribution",
            Command::Confirm { .. } => "confirm",
            Command::GetCurrentAmount(_) => "get_current_amount",
            Command::GetProject(_) => "get_project",
            Command::GetIssue(_) => "get_issue",
            Command::GetDistribution(_) => "get_distribution",
            Command::GetReceivable(_) => "get_receivable",
            Command::GetAllProject => "get_all_project",
            Command::GetAllIssue => "get_all_issue",
            Command::GetAllDistribution => "get_all_distribution",
            Command::GetAllReceivable => "get_all_receivable",
            Command::Verify => "verify",
        }
    }

    /// Plain reads that go straight to the query service.
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            Command::GetCurrentAmount(_)
                | Command::GetProject(_)
                | Command::GetIssue(_)
                | Command::GetDistribution(_)
                | Command::GetReceivable(_)
                | Command::GetAllProject
                | Command::GetAllIssue
                | Command::GetAllDistribution
                | Command::GetAllReceivable
        )
    }
}

fn arity(expected: usize, args: &[String]) -> Result<(), TypeError> {
    if args.len() != expected {
        return Err(TypeError::Arity {
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}

fn single_project_id(args: &[String]) -> Result<ProjectId, TypeError> {
    arity(1, args)?;
    ProjectId::parse(&args[0])
}

fn parse_init(args: &[String]) -> Result<Command, TypeError> {
    arity(0, args).map(|_| Command::Init)
}

fn parse_issue(args: &[String]) -> Result<Command, TypeError> {
    IssueRequest::from_args(args).map(Command::Issue)
}

fn parse_project(args: &[String]) -> Result<Command, TypeError> {
    ProjectRequest::from_args(args).map(Command::Project)
}

fn parse_update_project(args: &[String]) -> Result<Command, TypeError> {
    ProjectRequest::from_args(args).map(Command::UpdateProject)
}

fn parse_receivable(args: &[String]) -> Result<Command, TypeError> {
    ReceivableRequest::from_args(args).map(Command::Receivable)
}

fn parse_distribution(args: &[String]) -> Result<Command, TypeError> {
    DistributionRequest::from_args(args).map(Command::Distribution)
}

fn parse_confirm(args: &[String]) -> Result<Command, TypeError> {
    arity(2, args)?;
    Ok(Command::Confirm {
        project_id: ProjectId::parse(&args[0])?,
        entity: args[1].parse()?,
    })
}

fn parse_get_current_amount(args: &[String]) -> Result<Command, TypeError> {
    arity(1, args)?;
    Ok(Command::GetCurrentAmount(args[0].parse()?))
}

fn parse_get_project(args: &[String]) -> Result<Command, TypeError> {
    single_project_id(args).map(Command::GetProject)
}

fn parse_get_issue(args: &[String]) -> Result<Command, TypeError> {
    single_project_id(args).map(Command::GetIssue)
}

fn parse_get_distribution(args: &[String]) -> Result<Command, TypeError> {
    single_project_id(args).map(Command::GetDistribution)
}

fn parse_get_receivable(args: &[String]) -> Result<Command, TypeError> {
    single_project_id(args).map(Command::GetReceivable)
}

fn parse_get_all_project(args: &[String]) -> Result<Command, TypeError> {
    arity(0, args).map(|_| Command::GetAllProject)
}

fn parse_get_all_issue(args: &[String]) -> Result<Command, TypeError> {
    arity(0, args).map(|_| Command::GetAllIssue)
}

fn parse_get_all_distribution(args: &[String]) -> Result<Command, TypeError> {
    arity(0, args).map(|_| Command::GetAllDistribution)
}

fn parse_get_all_receivable(args: &[String]) -> Result<Command, TypeError> {
    arity(0, args).map(|_| Command::GetAllReceivable)
}

fn parse_verify(args: &[String]) -> Result<Command, TypeError> {
    arity(0, args).map(|_| Command::Verify)
}

/// Payload of a successful command.
///
/// Serializes as the bare record, list or report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Balances(Vec<Amount>),
    Amount(Amount),
    Issue(Issue),
    Project(Project),
    Distribution(Distribution),
    Receivable(Receivable),
    Confirmed(ConfirmOutcome),
    Issues(Vec<Issue>),
    Projects(Vec<Project>),
    Distributions(Vec<Distribution>),
    Receivables(Vec<Receivable>),
    Conservation(ConservationReport),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // -----------------------------------------------------------------------
    // Table
    // -----------------------------------------------------------------------

    #[test]
    fn table_names_are_unique() {
        let mut names: Vec<&str> = OPERATIONS.iter().map(|op| op.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), OPERATIONS.len());
    }

    #[test]
    fn every_entry_parses_to_its_own_name() {
        // Any valid argument set works; the name must round back.
        for op in OPERATIONS {
            let sample: Vec<String> = op
                .fields
                .iter()
                .map(|f| match *f {
                    "entity" => "BK".to_string(),
                    f if f.ends_with("amount") || f.ends_with("percent") => "1".to_string(),
                    _ => "x".to_string(),
                })
                .collect();
            let command = op.parse(&sample).unwrap();
            assert_eq!(command.name(), op.name);
        }
    }

    #[test]
    fn project_takes_21_fields() {
        let op = Command::operation("project").unwrap();
        assert_eq!(op.fields.len(), 21);
        assert_eq!(Command::operation("receivable").unwrap().fields.len(), 11);
        assert_eq!(Command::operation("distribution").unwrap().fields.len(), 14);
    }

    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    #[test]
    fn parse_issue_command() {
        let command = Command::parse("issue", &args(&["P1", "1000"])).unwrap();
        match command {
            Command::Issue(req) => {
                assert_eq!(req.project_id.as_str(), "P1");
                assert_eq!(req.amount, dec!(1000));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_confirm_command() {
        let command = Command::parse("confirm", &args(&["P1", "sc"])).unwrap();
        assert_eq!(
            command,
            Command::Confirm {
                project_id: ProjectId::parse("P1").unwrap(),
                entity: Counterparty::Sc,
            }
        );
    }

    #[test]
    fn confirm_rejects_issuer() {
        let err = Command::parse("confirm", &args(&["P1", "FG"])).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument(ref m) if m.starts_with("confirm:")));
    }

    #[test]
    fn unknown_operation() {
        let err = Command::parse("transfer", &[]).unwrap_err();
        assert_eq!(err, LedgerError::InvalidArgument("unknown operation: transfer".into()));
    }

    #[test]
    fn wrong_arity() {
        assert!(matches!(
            Command::parse("init", &args(&["extra"])),
            Err(LedgerError::InvalidArgument(_))
        ));
        assert!(matches!(
            Command::parse("get_project", &[]),
            Err(LedgerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn non_numeric_amount() {
        let err = Command::parse("issue", &args(&["P1", "lots"])).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument(ref m) if m.contains("amount")));
    }

    #[test]
    fn get_current_amount_accepts_fg() {
        assert_eq!(
            Command::parse("get_current_amount", &args(&["FG"])).unwrap(),
            Command::GetCurrentAmount(Entity::Fg)
        );
    }

    // -----------------------------------------------------------------------
    // Response shape
    // -----------------------------------------------------------------------

    #[test]
    fn response_serializes_bare() {
        let json = serde_json::to_value(Response::Amount(Amount::zero(Entity::Tb))).unwrap();
        assert_eq!(json["entity"], "TB");
        assert_eq!(json["balance"], "0");
    }
}
