//! The task board service.
//!
//! Wires a [`TaskStore`], the document grammar and a [`Clock`] into the
//! operations front ends call: listing, detail, create, patch, transitions,
//! archive and restore, and the job side file.
//!
//! Every write is a full read, an in-memory edit and a full write, done under
//! the record's advisory lock.

pub mod policy;
pub mod view;

pub use policy::{group_by_status, Groupable, StatusGroup};
pub use view::{preview, ArchivedTask, BoardView, PhasePreview, TaskDetail, TaskSummary};

use chrono::NaiveDateTime;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::archive::{self, ArchiveHeader};
use crate::config::BoardConfig;
use crate::document::{
    current_phase, extract_phases, Clock, DocumentDraft, ExecutionRecord, Grammar, Mutator, Parser,
    Phase, PhaseItem, Status, SystemClock, TaskPatch, TaskRecord, TransitionTarget,
    validate_owner,
};
use crate::document::vocab::{DEFAULT_OWNER, DEFAULT_SORT_ORDER};
use crate::error::{Result, TaskboardError};
use crate::store::{
    normalize_id, FsTaskStore, JobRecord, JobStore, NewJob, Shelf, TaskStore,
};

/// Execution record written into every new document.
pub const CREATED_ACTION: &str = "创建任务";

/// Phase of a new document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPhase {
    pub name: String,
    #[serde(default)]
    pub items: Vec<String>,
}

/// Input for [`TaskBoard::create`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewTask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i64>,
    #[serde(default)]
    pub status: Option<TransitionTarget>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub phases: Vec<NewPhase>,
}

impl NewTask {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            owner: None,
            agent: None,
            sort_order: None,
            status: None,
            description: None,
            phases: Vec::new(),
        }
    }
}

/// Task board over a store and a clock.
pub struct TaskBoard<S: TaskStore, C: Clock> {
    store: S,
    jobs: JobStore,
    grammar: Grammar,
    clock: C,
    template_prefix: String,
    preview_chars: usize,
    log_limit: usize,
}

impl TaskBoard<FsTaskStore, SystemClock> {
    /// Open the file-backed board described by `config`.
    pub fn open(config: &BoardConfig, root: &Path) -> Result<Self> {
        let paths = config.paths(root);
        debug!(
            tasks_dir = %paths.tasks_dir.display(),
            archive_dir = %paths.archive_dir.display(),
            "opening board"
        );
        let store = FsTaskStore::new(&paths.tasks_dir, &paths.archive_dir)
            .with_template_prefix(config.template_prefix.clone());
        Ok(TaskBoard::new(store, JobStore::new(&paths.jobs_file), config.grammar()?, SystemClock)
            .with_template_prefix(config.template_prefix.clone())
            .with_limits(config.preview_chars, config.summary_log_limit))
    }
}

impl<S: TaskStore, C: Clock> TaskBoard<S, C> {
    pub fn new(store: S, jobs: JobStore, grammar: Grammar, clock: C) -> Self {
        let defaults = BoardConfig::default();
        Self {
            store,
            jobs,
            grammar,
            clock,
            template_prefix: defaults.template_prefix,
            preview_chars: defaults.preview_chars,
            log_limit: defaults.summary_log_limit,
        }
    }

    #[must_use]
    pub fn with_limits(mut self, preview_chars: usize, log_limit: usize) -> Self {
        self.preview_chars = preview_chars;
        self.log_limit = log_limit;
        self
    }

    /// Ids starting with `prefix` are reserved for templates.
    #[must_use]
    pub fn with_template_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.template_prefix = prefix.into();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    fn parser(&self) -> Parser<'_> {
        Parser::new(&self.grammar, &self.clock)
    }

    fn mutator(&self) -> Mutator<'_> {
        Mutator::new(&self.grammar, &self.clock)
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Parse text that is not necessarily stored.
    #[must_use]
    pub fn parse(&self, text: &str, id_hint: &str) -> TaskRecord {
        self.parser().parse(text, id_hint)
    }

    /// Phases of arbitrary text, for previewing pasted checklists.
    #[must_use]
    pub fn preview_phases(&self, text: &str) -> PhasePreview {
        let phases = extract_phases(text);
        PhasePreview {
            current_phase: current_phase(&phases),
            phases,
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Every active record grouped by status.
    ///
    /// Records that cannot be read are logged and left out.
    pub fn list(&self) -> Result<BoardView> {
        let mut summaries = Vec::new();
        for id in self.store.list(Shelf::Active)? {
            match self.store.read(Shelf::Active, &id) {
                Ok(text) => {
                    let record = self.parse(&text, &id);
                    summaries.push(TaskSummary::new(
                        &record,
                        &text,
                        self.preview_chars,
                        self.log_limit,
                    ));
                }
                Err(e) => warn!(id = %id, error = %e, "skipping unreadable task"),
            }
        }

        let (planned, in_progress, completed) = group_by_status(summaries);
        Ok(BoardView {
            planned,
            in_progress,
            completed,
            timestamp: self.now(),
        })
    }

    pub fn detail(&self, id: &str) -> Result<TaskDetail> {
        let id = normalize_id(id)?;
        let text = self.store.read(Shelf::Active, &id)?;
        Ok(TaskDetail::new(self.parse(&text, &id), Shelf::Active, text))
    }

    /// Archived records, with their archive headers.
    pub fn archived(&self) -> Result<Vec<ArchivedTask>> {
        let mut tasks = Vec::new();
        for id in self.store.list(Shelf::Archive)? {
            let text = match self.store.read(Shelf::Archive, &id) {
                Ok(text) => text,
                Err(e) => {
                    warn!(id = %id, error = %e, "skipping unreadable archived task");
                    continue;
                }
            };
            let header = archive::read_header(&text);
            let body = archive::unwrap(&text).unwrap_or(text);
            let record = self.parse(&body, &id);
            tasks.push(ArchivedTask {
                id,
                title: record.title,
                status: record.status,
                header,
            });
        }
        Ok(tasks)
    }

    /// Detail of an archived record, header stripped.
    pub fn archived_detail(&self, id: &str) -> Result<TaskDetail> {
        let id = normalize_id(id)?;
        let text = self.store.read(Shelf::Archive, &id)?;
        let body = archive::unwrap(&text)?;
        Ok(TaskDetail::new(self.parse(&body, &id), Shelf::Archive, body))
    }

    // ========================================================================
    // Writes
    // ========================================================================

    fn check_new_id(&self, id: &str) -> Result<String> {
        let id = normalize_id(id)?;
        if !self.template_prefix.is_empty() && id.starts_with(&self.template_prefix) {
            return Err(TaskboardError::invalid_id(
                id,
                format!("ids starting with '{}' are reserved", self.template_prefix),
            ));
        }
        if self.store.exists(Shelf::Active, &id)? || self.store.exists(Shelf::Archive, &id)? {
            return Err(TaskboardError::AlreadyExists { id });
        }
        Ok(id)
    }

    /// Create a document in canonical layout.
    pub fn create(&mut self, task: NewTask) -> Result<TaskDetail> {
        let id = self.check_new_id(&task.id)?;
        let _guard = self.store.lock(&id)?;

        let title = task.title.trim();
        if title.is_empty() {
            return Err(TaskboardError::invalid_patch("title must not be empty"));
        }
        let agent = match task.agent.as_deref() {
            Some(name) => self
                .grammar
                .agents()
                .by_name(name)
                .ok_or_else(|| TaskboardError::invalid_patch(format!("unknown agent '{name}'")))?,
            None => self.grammar.agents().default_agent(),
        }
        .clone();
        let owner = task.owner.unwrap_or_else(|| DEFAULT_OWNER.to_string());
        validate_owner(&owner)?;

        let now = self.now();
        let draft = DocumentDraft {
            title: title.to_string(),
            status: task.status.map(Status::from).unwrap_or_default(),
            created_at: now,
            updated_at: now,
            owner,
            sort_order: task.sort_order.unwrap_or(DEFAULT_SORT_ORDER),
            agent,
            description: task.description,
            phases: task
                .phases
                .into_iter()
                .zip(1..)
                .map(|(phase, n)| Phase {
                    id: n,
                    name: phase.name.trim().to_string(),
                    items: phase
                        .items
                        .into_iter()
                        .map(|text| PhaseItem {
                            text: text.trim().to_string(),
                            checked: false,
                        })
                        .collect(),
                })
                .collect(),
            loose_items: Vec::new(),
            execution_records: vec![ExecutionRecord {
                at: now,
                action: CREATED_ACTION.to_string(),
            }],
            blocker: None,
        };

        let text = draft.render();
        self.store.write(Shelf::Active, &id, &text)?;
        info!(id = %id, "created task");
        Ok(TaskDetail::new(self.parse(&text, &id), Shelf::Active, text))
    }

    /// Locked read-edit-write of one active record.
    fn edit(&mut self, id: &str, f: impl FnOnce(&Mutator<'_>, &str) -> Result<String>) -> Result<TaskDetail> {
        let id = normalize_id(id)?;
        let _guard = self.store.lock(&id)?;
        let text = self.store.read(Shelf::Active, &id)?;
        let updated = f(&self.mutator(), &text)?;
        if updated != text {
            self.store.write(Shelf::Active, &id, &updated)?;
            debug!(id = %id, "updated task");
        }
        Ok(TaskDetail::new(self.parse(&updated, &id), Shelf::Active, updated))
    }

    /// Apply a patch of field assignments.
    pub fn update(&mut self, id: &str, patch: &TaskPatch) -> Result<TaskDetail> {
        self.edit(id, |m, text| m.apply_patch(text, patch))
    }

    pub fn transition(
        &mut self,
        id: &str,
        target: TransitionTarget,
        note: Option<&str>,
    ) -> Result<TaskDetail> {
        let detail = self.edit(id, |m, text| Ok(m.transition(text, target, note)))?;
        info!(id = %detail.record.id, status = %target, "transitioned task");
        Ok(detail)
    }

    /// Log a message to the record and move it back to in progress.
    pub fn send_message(&mut self, id: &str, message: &str) -> Result<TaskDetail> {
        if message.trim().is_empty() {
            return Err(TaskboardError::invalid_patch("message must not be empty"));
        }
        self.edit(id, |m, text| Ok(m.send_message(text, message)))
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        let id = normalize_id(id)?;
        let _guard = self.store.lock(&id)?;
        self.store.delete(Shelf::Active, &id)?;
        info!(id = %id, "deleted task");
        Ok(())
    }

    /// Move a record to the archive shelf behind an archive header.
    pub fn archive(&mut self, id: &str, reason: Option<&str>) -> Result<ArchivedTask> {
        let id = normalize_id(id)?;
        let _guard = self.store.lock(&id)?;
        if self.store.exists(Shelf::Archive, &id)? {
            return Err(TaskboardError::AlreadyExists { id });
        }
        let text = self.store.read(Shelf::Active, &id)?;
        let header = ArchiveHeader::new(self.now(), reason);

        self.store.relocate(&id, Shelf::Active, Shelf::Archive)?;
        self.store
            .write(Shelf::Archive, &id, &archive::wrap(&text, &header))?;
        info!(id = %id, "archived task");

        let record = self.parse(&text, &id);
        Ok(ArchivedTask {
            id,
            title: record.title,
            status: record.status,
            header: Some(header),
        })
    }

    /// Bring an archived record back, byte-identical to when it was archived.
    pub fn restore(&mut self, id: &str) -> Result<TaskDetail> {
        let id = normalize_id(id)?;
        let _guard = self.store.lock(&id)?;
        let text = self.store.read(Shelf::Archive, &id)?;
        let body = archive::unwrap(&text)?;
        if self.store.exists(Shelf::Active, &id)? {
            return Err(TaskboardError::AlreadyExists { id });
        }

        self.store.write(Shelf::Active, &id, &body)?;
        self.store.delete(Shelf::Archive, &id)?;
        info!(id = %id, "restored task");
        Ok(TaskDetail::new(self.parse(&body, &id), Shelf::Active, body))
    }

    // ========================================================================
    // Jobs
    // ========================================================================

    pub fn jobs(&self) -> Result<Vec<JobRecord>> {
        self.jobs.list()
    }

    pub fn job(&self, id: &str) -> Result<JobRecord> {
        self.jobs.get(id)
    }

    pub fn add_job(&self, job: NewJob) -> Result<JobRecord> {
        self.jobs.add(job)
    }

    pub fn set_job_enabled(&self, id: &str, enabled: bool) -> Result<JobRecord> {
        self.jobs.set_enabled(id, enabled)
    }

    pub fn remove_job(&self, id: &str) -> Result<()> {
        self.jobs.remove(id)
    }

    /// Record a manual "run now"; nothing is executed.
    pub fn run_job(&self, id: &str, output: Option<&str>) -> Result<JobRecord> {
        self.jobs.record_run(id, self.now(), output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FixedClock;
    use crate::testing::{fixtures, MockTaskStore};
    use tempfile::TempDir;

    fn board(store: MockTaskStore) -> (TaskBoard<MockTaskStore, FixedClock>, TempDir) {
        let temp = TempDir::new().unwrap();
        let clock = FixedClock::at("2024-06-01 10:30").unwrap();
        let board = TaskBoard::new(
            store,
            JobStore::new(temp.path().join("jobs.json")),
            Grammar::default(),
            clock,
        );
        (board, temp)
    }

    #[test]
    fn test_list_groups_and_sorts() {
        let store = MockTaskStore::new()
            .with_document("late", "# 任务清单: 后\n- 状态: 🔄 进行中\n")
            .with_document("first", "# 任务清单: 先\n- 状态: 🔄 进行中\n- 排序: 3\n")
            .with_document("other", "# 任务清单: 其他\n")
            .with_document("done", fixtures::COMPLETED_DOCUMENT)
            .with_document("plan", "- 状态: 📋 计划中\n");
        let (board, _temp) = board(store);

        let view = board.list().unwrap();
        let ids: Vec<_> = view.in_progress.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "late", "other"]);
        assert_eq!(view.planned.len(), 1);
        assert_eq!(view.completed.len(), 1);
        assert_eq!(view.len(), 5);
        assert_eq!(crate::document::format_timestamp(view.timestamp), "2024-06-01 10:30");
    }

    #[test]
    fn test_list_skips_unreadable() {
        let store = MockTaskStore::new()
            .with_document("ok", "# 任务清单: ok\n")
            .with_document("bad", "x")
            .with_read_failure("bad");
        let (board, _temp) = board(store);
        let view = board.list().unwrap();
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_summary_preview_and_recent_records() {
        let mut text = String::from("# 任务清单: 长\n");
        text.push_str(&"字".repeat(600));
        text.push_str("\n## 执行记录\n");
        for i in 0..8 {
            text.push_str(&format!("2024-01-01 0{i}:00: step {i}\n"));
        }
        let (board, _temp) = board(MockTaskStore::new().with_document("long", &text));

        let view = board.list().unwrap();
        let card = &view.in_progress[0];
        assert!(card.content.ends_with("..."));
        assert_eq!(card.content.chars().count(), 503);
        let actions: Vec<_> = card.recent_records.iter().map(|r| r.action.as_str()).collect();
        assert_eq!(actions, vec!["step 3", "step 4", "step 5", "step 6", "step 7"]);
    }

    #[test]
    fn test_create_renders_canonical_document() {
        let (mut board, _temp) = board(MockTaskStore::new());
        let mut task = NewTask::new("gateway", "网关迁移");
        task.agent = Some("丑牛".into());
        task.sort_order = Some(2);
        task.phases = vec![NewPhase {
            name: "准备".into(),
            items: vec!["盘点路由".into()],
        }];

        let detail = board.create(task).unwrap();
        assert_eq!(detail.record.title, "网关迁移");
        assert_eq!(detail.record.agent_icon, "🟢");
        assert_eq!(detail.record.current_phase, "Phase 1: 准备");
        assert_eq!(detail.record.execution_records[0].action, CREATED_ACTION);
        assert!(detail.full_content.contains("- 创建时间: 2024-06-01 10:30\n"));
        assert!(board.store().contains(Shelf::Active, "gateway"));
    }

    #[test]
    fn test_create_rejects_duplicates_and_templates() {
        let store = MockTaskStore::new().with_document("taken", "");
        let (mut board, _temp) = board(store);
        assert!(matches!(
            board.create(NewTask::new("taken", "t")),
            Err(TaskboardError::AlreadyExists { .. })
        ));
        assert!(matches!(
            board.create(NewTask::new("TEMPLATE_x", "t")),
            Err(TaskboardError::InvalidId { .. })
        ));
        assert!(board.create(NewTask::new("ok", "  ")).is_err());
        let mut bad_agent = NewTask::new("ok", "t");
        bad_agent.agent = Some("无名".into());
        assert!(board.create(bad_agent).is_err());
    }

    #[test]
    fn test_update_and_transition() {
        let store = MockTaskStore::new().with_document("t", fixtures::COMPLETED_DOCUMENT);
        let (mut board, _temp) = board(store);

        let patch = TaskPatch::from_assignments(["owner=bob"]).unwrap();
        let detail = board.update("t", &patch).unwrap();
        assert_eq!(detail.record.owner, "bob");

        let detail = board
            .transition("t", TransitionTarget::Planned, Some("重新规划"))
            .unwrap();
        assert_eq!(detail.record.status, Status::Planned);
        assert_eq!(detail.record.execution_records.last().unwrap().action, "重新规划");
        assert!(board.store().lock_count("t") >= 2);
    }

    #[test]
    fn test_send_message_reopens() {
        let store = MockTaskStore::new().with_document("t", fixtures::COMPLETED_DOCUMENT);
        let (mut board, _temp) = board(store);
        let detail = board.send_message("t", "resume work").unwrap();
        assert_eq!(detail.record.status, Status::InProgress);
        assert!(detail.full_content.contains("状态: 🔄 进行中"));
        assert!(board.send_message("t", " ").is_err());
    }

    #[test]
    fn test_missing_record_is_not_found() {
        let (mut board, _temp) = board(MockTaskStore::new());
        assert!(board.detail("ghost").unwrap_err().is_not_found());
        assert!(board.delete("ghost").unwrap_err().is_not_found());
        assert!(board
            .update("ghost", &TaskPatch::default())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_archive_restore_round_trip() {
        let original = fixtures::COMPLETED_DOCUMENT;
        let store = MockTaskStore::new().with_document("t", original);
        let (mut board, _temp) = board(store);

        let archived = board.archive("t", Some("季度结束")).unwrap();
        assert_eq!(archived.header.unwrap().reason.as_deref(), Some("季度结束"));
        assert!(board.detail("t").unwrap_err().is_not_found());
        assert_eq!(board.archived().unwrap()[0].id, "t");
        assert_eq!(board.archived_detail("t").unwrap().full_content, original);

        let restored = board.restore("t").unwrap();
        assert_eq!(restored.full_content, original);
        assert!(board.archived().unwrap().is_empty());
        assert!(board.restore("t").unwrap_err().is_not_found());
    }

    #[test]
    fn test_archive_conflicts() {
        let store = MockTaskStore::new()
            .with_document("t", "active")
            .with_archived("t", "<!-- ARCHIVED: 2024-01-01 00:00 -->\n\nold");
        let (mut board, _temp) = board(store);
        assert!(matches!(
            board.archive("t", None),
            Err(TaskboardError::AlreadyExists { .. })
        ));
        assert!(matches!(
            board.restore("t"),
            Err(TaskboardError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn test_restore_rejects_headerless_archive() {
        let store = MockTaskStore::new().with_archived("t", "no header");
        let (mut board, _temp) = board(store);
        assert!(matches!(board.restore("t"), Err(TaskboardError::Archive { .. })));
        assert!(board.store().contains(Shelf::Archive, "t"));
    }

    #[test]
    fn test_update_write_failure_leaves_record_untouched() {
        let store = MockTaskStore::new()
            .with_document("t", fixtures::COMPLETED_DOCUMENT)
            .with_write_error("disk full");
        let (mut board, _temp) = board(store);
        let patch = TaskPatch {
            owner: Some("carol".into()),
            ..TaskPatch::default()
        };

        let err = board.update("t", &patch).unwrap_err();
        assert!(matches!(err, TaskboardError::Io(_)));
        assert_eq!(
            board.store().text(Shelf::Active, "t"),
            Some(fixtures::COMPLETED_DOCUMENT)
        );
        assert_eq!(board.store().write_count(), 0);
    }

    #[test]
    fn test_restore_write_failure_keeps_archived_copy() {
        let archived = "<!-- ARCHIVED: 2024-01-01 00:00 -->\n\n# 任务清单: 旧任务\n";
        let store = MockTaskStore::new()
            .with_archived("t", archived)
            .with_write_error("disk full");
        let (mut board, _temp) = board(store);

        let err = board.restore("t").unwrap_err();
        assert!(matches!(err, TaskboardError::Io(_)));
        assert_eq!(board.store().text(Shelf::Archive, "t"), Some(archived));
        assert!(!board.store().contains(Shelf::Active, "t"));
    }

    #[test]
    fn test_create_rejects_emphasised_owner() {
        let (mut board, _temp) = board(MockTaskStore::new());
        let mut task = NewTask::new("t", "标题");
        task.owner = Some("a*b".into());
        let err = board.create(task).unwrap_err();
        assert!(matches!(err, TaskboardError::InvalidPatch { .. }));
        assert!(!board.store().contains(Shelf::Active, "t"));
    }

    #[test]
    fn test_preview_phases() {
        let (board, _temp) = board(MockTaskStore::new());
        let preview = board.preview_phases("Phase 1: Setup\n- [x] a\n- [ ] b\nPhase 2: Build\n- [x] c");
        assert_eq!(preview.phases.len(), 2);
        assert_eq!(preview.phases[0].percent(), 50);
        assert_eq!(preview.phases[1].percent(), 100);
        assert_eq!(preview.current_phase, "Phase 1: Setup");
    }

    #[test]
    fn test_job_operations() {
        let (board, _temp) = board(MockTaskStore::new());
        let job = board
            .add_job(NewJob {
                name: "日报".into(),
                command: "report".into(),
                schedule: "0 18 * * *".into(),
                enabled: true,
            })
            .unwrap();
        let run = board.run_job(&job.id, Some("done")).unwrap();
        assert_eq!(run.history.len(), 1);
        assert_eq!(board.jobs().unwrap().len(), 1);
        board.remove_job(&job.id).unwrap();
        assert!(board.job(&job.id).unwrap_err().is_not_found());
    }
}
