use opex_store::{KvStore, WriteBatch};
use opex_types::{
    fiscal_year, Amount, CallerIdentity, Clock, Counterparty, Distribution, DistributionRequest,
    Entity, Issue, IssueRequest, Project, ProjectId, ProjectRequest, Receivable,
    ReceivableRequest, SystemClock,
};
use tracing::{info, info_span, warn};

use crate::amount::AmountLedger;
use crate::command::{Command, Response};
use crate::config::LedgerConfig;
use crate::confirm::{ConfirmOutcome, ConfirmationWorkflow};
use crate::error::LedgerResult;
use crate::journal::Journal;
use crate::project::ProjectRegistry;
use crate::query::{ConservationReport, QueryService};
use crate::record_log::RecordLog;

/// The funds-allocation ledger over one store.
///
/// Every public operation is one unit of work: it validates, then applies
/// all of its writes together, or fails and changes nothing.
pub struct Ledger<S> {
    store: S,
    config: LedgerConfig,
    clock: Box<dyn Clock>,
}

impl<S: KvStore> Ledger<S> {
    /// Wrap a store without touching it.
    pub fn new(store: S, config: LedgerConfig) -> Self {
        Self {
            store,
            config,
            clock: Box::new(SystemClock),
        }
    }

    /// Wrap a store and roll back any operation a previous process left
    /// half-applied.
    pub fn open(store: S, config: LedgerConfig) -> LedgerResult<Self> {
        let ledger = Self::new(store, config);
        let repaired = ledger.recover()?;
        if repaired > 0 {
            warn!(repaired, "recovered interrupted operations");
        }
        Ok(ledger)
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn kv(&self) -> &dyn KvStore {
        &self.store
    }

    pub fn query(&self) -> QueryService<'_> {
        QueryService::new(self.kv())
    }

    /// Roll back anything a failed operation left half-applied, so new work
    /// and reads never see or build on it.
    fn settle(&self) -> LedgerResult<()> {
        if self.store.atomic_batches() {
            return Ok(());
        }
        let repaired = self.recover()?;
        if repaired > 0 {
            warn!(repaired, "rolled back interrupted operations before continuing");
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Mutating operations
    // -----------------------------------------------------------------------

    /// Zero all four balances.
    pub fn init(&self) -> LedgerResult<Vec<Amount>> {
        self.settle()?;
        let amounts = AmountLedger::new(self.kv());
        amounts.init()?;
        info!("balances reset");
        amounts.balances()
    }

    /// Record an Issue and credit FG with its amount.
    pub fn issue(&self, request: IssueRequest) -> LedgerResult<Issue> {
        self.settle()?;
        let issues = RecordLog::<Issue>::new(self.kv());
        issues.ensure_absent(request.project_id.as_str())?;

        let issue = Issue::new(
            request.project_id,
            request.amount,
            self.config.issue_rate,
            fiscal_year(self.clock.today()),
        );
        let mut batch = WriteBatch::new();
        let fg = AmountLedger::new(self.kv()).stage_credit(
            &mut batch,
            Entity::Fg,
            issue.issue_amount,
        )?;
        issues.stage(&mut batch, &issue)?;
        Journal::new(self.kv()).apply(&format!("issue/{}", issue.project_id), batch)?;

        info!(
            project_id = %issue.project_id,
            amount = %issue.issue_amount,
            issue_year = issue.issue_year,
            fg_balance = %fg.balance,
            "funds issued"
        );
        Ok(issue)
    }

    pub fn register_project(&self, request: ProjectRequest) -> LedgerResult<Project> {
        self.settle()?;
        let project = ProjectRegistry::new(self.kv()).create(request)?;
        info!(project_id = %project.project_id, "project registered");
        Ok(project)
    }

    /// Overwrite a project record. Recorded confirmations are kept.
    pub fn force_update_project(&self, request: ProjectRequest) -> LedgerResult<Project> {
        self.settle()?;
        let project = ProjectRegistry::new(self.kv()).force_update(request)?;
        info!(project_id = %project.project_id, "project force-updated");
        Ok(project)
    }

    pub fn record_receivable(&self, request: ReceivableRequest) -> LedgerResult<Receivable> {
        self.settle()?;
        let receivable = Receivable::from(request);
        RecordLog::new(self.kv()).create(&receivable)?;
        info!(project_id = %receivable.project_id, "receivable recorded");
        Ok(receivable)
    }

    pub fn record_distribution(&self, request: DistributionRequest) -> LedgerResult<Distribution> {
        self.settle()?;
        let distribution = Distribution::from_request(request, self.config.issue_rate);
        RecordLog::new(self.kv()).create(&distribution)?;
        info!(project_id = %distribution.project_id, "distribution recorded");
        Ok(distribution)
    }

    /// Confirm `entity`'s allocation of a project and move it out of FG.
    pub fn confirm(
        &self,
        project_id: &ProjectId,
        entity: Counterparty,
    ) -> LedgerResult<ConfirmOutcome> {
        self.settle()?;
        let outcome = ConfirmationWorkflow::new(self.kv()).confirm(project_id, entity)?;
        info!(
            project_id = %outcome.project_id,
            entity = %outcome.entity,
            amount = %outcome.amount,
            state = ?outcome.state,
            "allocation confirmed"
        );
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Maintenance
    // -----------------------------------------------------------------------

    pub fn verify(&self) -> LedgerResult<ConservationReport> {
        self.settle()?;
        let report = self.query().conservation()?;
        if !report.balanced {
            warn!(
                balance_total = %report.balance_total,
                issued_total = %report.issued_total,
                "balances do not match issued total"
            );
        }
        Ok(report)
    }

    /// Roll back interrupted operations. Returns how many were found.
    pub fn recover(&self) -> LedgerResult<usize> {
        Journal::new(self.kv()).recover()
    }

    pub fn pending_intents(&self) -> LedgerResult<Vec<String>> {
        Journal::new(self.kv()).pending()
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Run one command on behalf of `caller`.
    pub fn execute(
        &self,
        command: Command,
        caller: &dyn CallerIdentity,
    ) -> LedgerResult<Response> {
        let span = info_span!(
            "ledger",
            operation = command.name(),
            caller = %caller.current_caller()
        );
        let _enter = span.enter();

        if command.is_query() {
            self.settle()?;
        }
        let query = self.query();
        let response = match command {
            Command::Init => Response::Balances(self.init()?),
            Command::Issue(req) => Response::Issue(self.issue(req)?),
            Command::Project(req) => Response::Project(self.register_project(req)?),
            Command::UpdateProject(req) => Response::Project(self.force_update_project(req)?),
            Command::Receivable(req) => Response::Receivable(self.record_receivable(req)?),
            Command::Distribution(req) => Response::Distribution(self.record_distribution(req)?),
            Command::Confirm { project_id, entity } => {
                Response::Confirmed(self.confirm(&project_id, entity)?)
            }
            Command::GetCurrentAmount(entity) => {
                Response::Amount(query.get_current_amount(entity)?)
            }
            Command::GetProject(id) => Response::Project(query.get_project(id.as_str())?),
            Command::GetIssue(id) => Response::Issue(query.get_issue(id.as_str())?),
            Command::GetDistribution(id) => {
                Response::Distribution(query.get_distribution(id.as_str())?)
            }
            Command::GetReceivable(id) => {
                Response::Receivable(query.get_receivable(id.as_str())?)
            }
            Command::GetAllProject => Response::Projects(query.get_all_project().collect_all()?),
            Command::GetAllIssue => Response::Issues(query.get_all_issue().collect_all()?),
            Command::GetAllDistribution => {
                Response::Distributions(query.get_all_distribution().collect_all()?)
            }
            Command::GetAllReceivable => {
                Response::Receivables(query.get_all_receivable().collect_all()?)
            }
            Command::Verify => Response::Conservation(self.verify()?),
        };
        Ok(response)
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for Ledger<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("store", &self.store)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
