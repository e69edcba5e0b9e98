use opex_store::{KvStore, WriteBatch};
use opex_types::{Project, ProjectRequest};
use tracing::warn;

use crate::error::LedgerResult;
use crate::record_log::{RecordLog, Scan};

/// Project records and their confirmation flags.
pub struct ProjectRegistry<'a> {
    projects: RecordLog<'a, Project>,
}

impl<'a> ProjectRegistry<'a> {
    pub fn new(store: &'a dyn KvStore) -> Self {
        Self {
            projects: RecordLog::new(store),
        }
    }

    /// Register a new project with all confirmation flags clear.
    pub fn create(&self, request: ProjectRequest) -> LedgerResult<Project> {
        let project = Project::from(request);
        self.projects.create(&project)?;
        Ok(project)
    }

    /// Overwrite a project's descriptive fields and allocations.
    ///
    /// Skips the existence check. Confirmation flags already recorded are
    /// kept, so funds that have moved are never moved again.
    pub fn force_update(&self, request: ProjectRequest) -> LedgerResult<Project> {
        let fresh = Project::from(request);
        let project = match self.projects.find(fresh.project_id.as_str())? {
            Some(previous) => {
                warn!(
                    project_id = %previous.project_id,
                    confirmed_by = ?previous.confirmed_by(),
                    "overwriting project record"
                );
                fresh.with_confirmations_of(&previous)
            }
            None => fresh,
        };
        self.projects.overwrite(&project)?;
        Ok(project)
    }

    pub fn get(&self, project_id: &str) -> LedgerResult<Project> {
        self.projects.get(project_id)
    }

    pub fn list_all(&self) -> Scan<'a, Project> {
        self.projects.list_all()
    }

    pub fn stage(&self, batch: &mut WriteBatch, project: &Project) -> LedgerResult<()> {
        self.projects.stage(batch, project)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::LedgerError;
    use opex_store::InMemoryKvStore;
    use opex_types::{Counterparty, Decimal};

    /// Positional arguments for a `project` call with the given allocations.
    pub(crate) fn project_args(id: &str, bk: &str, sc: &str, tb: &str) -> Vec<String> {
        [
            id, "Harbor", "equity", "600", "1", "2", "3", "4", "5", "bk-d", "bk-t", "bk-p", bk,
            "sc-d", "sc-t", "sc-p", sc, "tb-d", "tb-t", "tb-p", tb,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    pub(crate) fn request(id: &str, bk: &str, sc: &str, tb: &str) -> ProjectRequest {
        ProjectRequest::from_args(&project_args(id, bk, sc, tb)).unwrap()
    }

    #[test]
    fn create_starts_pending() {
        let store = InMemoryKvStore::new();
        let registry = ProjectRegistry::new(&store);
        let project = registry.create(request("P1", "300", "200", "100")).unwrap();
        assert!(!project.confirmed);
        assert!(project.confirmed_by().is_empty());
        assert_eq!(registry.get("P1").unwrap(), project);
    }

    #[test]
    fn create_twice_conflicts() {
        let store = InMemoryKvStore::new();
        let registry = ProjectRegistry::new(&store);
        registry.create(request("P1", "300", "200", "100")).unwrap();
        assert!(matches!(
            registry.create(request("P1", "1", "1", "1")),
            Err(LedgerError::Conflict { kind: "project", .. })
        ));
        assert_eq!(registry.get("P1").unwrap().bk_amount, Decimal::from(300));
    }

    #[test]
    fn force_update_creates_when_missing() {
        let store = InMemoryKvStore::new();
        let registry = ProjectRegistry::new(&store);
        registry.force_update(request("P9", "1", "2", "3")).unwrap();
        assert_eq!(registry.get("P9").unwrap().tb_amount, Decimal::from(3));
    }

    #[test]
    fn force_update_keeps_confirmations() {
        let store = InMemoryKvStore::new();
        let registry = ProjectRegistry::new(&store);
        let mut project = registry.create(request("P1", "300", "200", "100")).unwrap();
        project.mark_confirmed(Counterparty::Bk);
        registry.projects.overwrite(&project).unwrap();

        let updated = registry.force_update(request("P1", "999", "200", "100")).unwrap();
        assert_eq!(updated.bk_amount, Decimal::from(999));
        assert!(updated.is_confirmed_by(Counterparty::Bk));
        assert_eq!(registry.get("P1").unwrap(), updated);
    }

    #[test]
    fn list_all_sorted() {
        let store = InMemoryKvStore::new();
        let registry = ProjectRegistry::new(&store);
        for id in ["b", "a", "c"] {
            registry.create(request(id, "1", "1", "1")).unwrap();
        }
        let ids: Vec<String> = registry
            .list_all()
            .collect_all()
            .unwrap()
            .iter()
            .map(|p| p.project_id.to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
