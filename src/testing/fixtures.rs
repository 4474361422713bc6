//! Sample documents and a throwaway file-backed board.

use std::path::Path;
use tempfile::TempDir;

use crate::board::TaskBoard;
use crate::document::{FixedClock, Grammar};
use crate::store::{FsTaskStore, JobStore, Shelf, TaskStore};

/// A finished task in canonical layout.
pub const COMPLETED_DOCUMENT: &str = "# 任务清单: 周报整理

- 状态: ✅ 已完成
- 创建时间: 2024-03-01 09:00
- 更新时间: 2024-03-04 18:30
- 负责人: alice
- 排序: 2
- [🟢 丑牛]

## 描述
汇总本周进展。

## Phase 1: 收集
- [x] 拉取数据
- [x] 整理表格

## 执行记录
2024-03-01 09:00: 创建任务
2024-03-04 18:30: 完成
";

/// A hand-written task that uses every loose layout the grammar accepts.
pub const LOOSE_DOCUMENT: &str = "## 排查告警

**状态**： ❌ 已暂停
负责人：bob
Created: 2024-02-01T08:00
[🔴钮码]

**Phase 1**: 定位
* [X] 查日志
Phase 2 修复
- [ ] 打补丁

阻塞点: 等待供应商回复
";

/// A file-backed board in a temporary directory with a frozen clock.
///
/// Cleaned up when dropped.
pub struct TestBoard {
    temp_dir: TempDir,
    pub board: TaskBoard<FsTaskStore, FixedClock>,
}

impl TestBoard {
    /// Empty board at `2024-06-01 10:30`.
    ///
    /// # Panics
    ///
    /// Panics if temporary directory creation fails.
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FsTaskStore::new(temp_dir.path().join("tasks"), temp_dir.path().join("archive"));
        let board = TaskBoard::new(
            store,
            JobStore::new(temp_dir.path().join("jobs.json")),
            Grammar::default(),
            FixedClock::at("2024-06-01 10:30").expect("valid fixture timestamp"),
        );
        Self { temp_dir, board }
    }

    /// Board seeded with active documents.
    ///
    /// # Panics
    ///
    /// Panics if a document cannot be written.
    #[must_use]
    pub fn with_documents(documents: &[(&str, &str)]) -> Self {
        let fixture = Self::new();
        let mut store = fixture.board.store().clone();
        for (id, text) in documents {
            store
                .write(Shelf::Active, id, text)
                .expect("Failed to write fixture document");
        }
        fixture
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Raw file contents of a stored document.
    ///
    /// # Panics
    ///
    /// Panics if the document does not exist.
    #[must_use]
    pub fn raw(&self, shelf: Shelf, id: &str) -> String {
        self.board
            .store()
            .read(shelf, id)
            .expect("Failed to read fixture document")
    }
}

impl Default for TestBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Field, Status, TaskPatch, TransitionTarget};
    use crate::testing::{assert_field_defaulted, assert_field_found, assert_insertion_only};

    #[test]
    fn test_loose_document_parses() {
        let fixture = TestBoard::with_documents(&[("alert", LOOSE_DOCUMENT)]);
        let record = fixture.board.detail("alert").unwrap().record;

        assert_eq!(record.title, "排查告警");
        assert_eq!(record.status, Status::Paused);
        assert_eq!(record.owner, "bob");
        assert_eq!(record.agent_name, "钮码");
        assert_eq!(record.phases.len(), 2);
        assert_eq!(record.progress.to_string(), "1/2");
        assert_eq!(record.blocker.as_deref(), Some("等待供应商回复"));
        assert_field_found(&record, Field::CreatedAt);
        assert_field_defaulted(&record, Field::UpdatedAt);
        assert_field_defaulted(&record, Field::SortOrder);
    }

    #[test]
    fn test_file_backed_lifecycle() {
        let mut fixture = TestBoard::with_documents(&[("weekly", COMPLETED_DOCUMENT)]);

        let detail = fixture.board.send_message("weekly", "resume work").unwrap();
        assert_eq!(detail.record.status, Status::InProgress);
        let raw = fixture.raw(Shelf::Active, "weekly");
        assert!(raw.contains("2024-06-01 10:30: resume work\n"));

        fixture.board.archive("weekly", Some("done")).unwrap();
        assert!(fixture.path().join("archive/weekly.md").exists());
        assert!(!fixture.path().join("tasks/weekly.md").exists());

        fixture.board.restore("weekly").unwrap();
        assert_eq!(fixture.raw(Shelf::Active, "weekly"), raw);
    }

    #[test]
    fn test_patch_keeps_unknown_text() {
        let mut fixture = TestBoard::with_documents(&[("alert", LOOSE_DOCUMENT)]);
        let before = fixture.raw(Shelf::Active, "alert");
        let patch = TaskPatch {
            note: Some("已联系供应商".into()),
            ..TaskPatch::default()
        };
        fixture.board.update("alert", &patch).unwrap();
        assert_insertion_only(&before, &fixture.raw(Shelf::Active, "alert"));

        fixture
            .board
            .transition("alert", TransitionTarget::Completed, None)
            .unwrap();
        let after = fixture.raw(Shelf::Active, "alert");
        assert!(after.contains("**状态**： ✅ 已完成"));
        assert!(after.contains("阻塞点: 等待供应商回复"));
    }
}
