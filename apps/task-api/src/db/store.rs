use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::error::ApiError;
use crate::models::comment::TaskComment;
use crate::models::filter::{page_offset, TaskQuery, TaskStats};
use crate::models::task::Task;

/// One page of a filtered task listing.
#[derive(Debug, Clone)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    /// Matches across all pages.
    pub total: usize,
}

/// Durable task and comment storage.
///
/// The document store itself is external; `MemoryStore` backs development
/// and tests.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: Task) -> Result<Task, ApiError>;
    async fn get_task(&self, task_id: &str) -> Result<Option<Task>, ApiError>;
    /// Replace an existing task. Fails with not-found if it is gone.
    async fn save_task(&self, task: Task) -> Result<Task, ApiError>;
    /// Delete a task and all of its comments. Returns `false` if absent.
    async fn delete_task(&self, task_id: &str) -> Result<bool, ApiError>;
    async fn list_tasks(&self, query: &TaskQuery, now: DateTime<Utc>) -> Result<TaskPage, ApiError>;
    /// Status counts over every stored task, ignoring filters.
    async fn status_counts(&self) -> Result<TaskStats, ApiError>;
    async fn distinct_tags(&self) -> Result<Vec<String>, ApiError>;
    /// Tasks that are neither completed nor cancelled.
    async fn open_tasks(&self) -> Result<Vec<Task>, ApiError>;

    async fn insert_comment(&self, comment: TaskComment) -> Result<TaskComment, ApiError>;
    async fn get_comment(&self, comment_id: &str) -> Result<Option<TaskComment>, ApiError>;
    async fn save_comment(&self, comment: TaskComment) -> Result<TaskComment, ApiError>;
    async fn delete_comment(&self, comment_id: &str) -> Result<bool, ApiError>;
    /// Newest first. Returns the page and the total comment count for the task.
    async fn list_comments(
        &self,
        task_id: &str,
        page: usize,
        limit: usize,
    ) -> Result<(Vec<TaskComment>, usize), ApiError>;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tables {
    tasks: HashMap<String, Task>,
    comments: HashMap<String, TaskComment>,
}

#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: Task) -> Result<Task, ApiError> {
        self.data.write().tasks.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<Task>, ApiError> {
        Ok(self.data.read().tasks.get(task_id).cloned())
    }

    async fn save_task(&self, task: Task) -> Result<Task, ApiError> {
        let mut data = self.data.write();
        match data.tasks.get_mut(&task.id) {
            Some(slot) => {
                *slot = task.clone();
                Ok(task)
            }
            None => Err(ApiError::not_found("Task not found")),
        }
    }

    async fn delete_task(&self, task_id: &str) -> Result<bool, ApiError> {
        let mut data = self.data.write();
        if data.tasks.remove(task_id).is_none() {
            return Ok(false);
        }
        data.comments.retain(|_, c| c.task_id != task_id);
        Ok(true)
    }

    async fn list_tasks(&self, query: &TaskQuery, now: DateTime<Utc>) -> Result<TaskPage, ApiError> {
        let data = self.data.read();
        let mut matched: Vec<&Task> = data
            .tasks
            .values()
            .filter(|t| query.matches(t, now))
            .collect();
        matched.sort_by(|a, b| query.compare(a, b));

        let total = matched.len();
        let tasks = matched
            .into_iter()
            .skip(query.offset())
            .take(query.limit)
            .cloned()
            .collect();
        Ok(TaskPage { tasks, total })
    }

    async fn status_counts(&self) -> Result<TaskStats, ApiError> {
        let data = self.data.read();
        let mut stats = TaskStats::default();
        for task in data.tasks.values() {
            stats.record(task.status);
        }
        stats.total = data.tasks.len();
        Ok(stats)
    }

    async fn distinct_tags(&self) -> Result<Vec<String>, ApiError> {
        let data = self.data.read();
        let tags: BTreeSet<String> = data
            .tasks
            .values()
            .flat_map(|t| t.tags.iter())
            .filter(|tag| !tag.trim().is_empty())
            .cloned()
            .collect();
        Ok(tags.into_iter().collect())
    }

    async fn open_tasks(&self) -> Result<Vec<Task>, ApiError> {
        Ok(self
            .data
            .read()
            .tasks
            .values()
            .filter(|t| !t.status.is_closed())
            .cloned()
            .collect())
    }

    async fn insert_comment(&self, comment: TaskComment) -> Result<TaskComment, ApiError> {
        self.data
            .write()
            .comments
            .insert(comment.id.clone(), comment.clone());
        Ok(comment)
    }

    async fn get_comment(&self, comment_id: &str) -> Result<Option<TaskComment>, ApiError> {
        Ok(self.data.read().comments.get(comment_id).cloned())
    }

    async fn save_comment(&self, comment: TaskComment) -> Result<TaskComment, ApiError> {
        let mut data = self.data.write();
        match data.comments.get_mut(&comment.id) {
            Some(slot) => {
                *slot = comment.clone();
                Ok(comment)
            }
            None => Err(ApiError::not_found("Comment not found")),
        }
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<bool, ApiError> {
        Ok(self.data.write().comments.remove(comment_id).is_some())
    }

    async fn list_comments(
        &self,
        task_id: &str,
        page: usize,
        limit: usize,
    ) -> Result<(Vec<TaskComment>, usize), ApiError> {
        let data = self.data.read();
        let mut comments: Vec<&TaskComment> = data
            .comments
            .values()
            .filter(|c| c.task_id == task_id)
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        let total = comments.len();
        let page = comments
            .into_iter()
            .skip(page_offset(page, limit))
            .take(limit)
            .cloned()
            .collect();
        Ok((page, total))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::models::filter::{SortKey, SortOrder, StatusFilter};
    use crate::models::task::{NewTask, Priority, TaskStatus};

    fn new_task(title: &str, creator: &str, tags: &[&str], now: DateTime<Utc>) -> Task {
        Task::new(
            NewTask {
                title: title.to_string(),
                description: "something to do".to_string(),
                assigned_by: creator.to_string(),
                assigned_to: vec!["usr_b".to_string()],
                priority: Priority::Medium,
                due_date: now + Duration::days(2),
                tags: tags.iter().map(|s| s.to_string()).collect(),
                estimated_hours: None,
            },
            now,
        )
    }

    #[tokio::test]
    async fn insert_get_save_roundtrip() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let mut task = store.insert_task(new_task("a", "usr_a", &[], now)).await.unwrap();

        task.set_status(TaskStatus::Completed, now);
        store.save_task(task.clone()).await.unwrap();

        let loaded = store.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, TaskStatus::Completed);
        assert!(loaded.completed_at.is_some());
    }

    #[tokio::test]
    async fn save_missing_task_is_not_found() {
        let store = MemoryStore::new();
        let task = new_task("ghost", "usr_a", &[], Utc::now());
        let err = store.save_task(task).await.unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_task_cascades_comments() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let task = store.insert_task(new_task("a", "usr_a", &[], now)).await.unwrap();
        let other = store.insert_task(new_task("b", "usr_a", &[], now)).await.unwrap();
        store
            .insert_comment(TaskComment::new(&task.id, "usr_a", "hi", now))
            .await
            .unwrap();
        let kept = store
            .insert_comment(TaskComment::new(&other.id, "usr_a", "keep", now))
            .await
            .unwrap();

        assert!(store.delete_task(&task.id).await.unwrap());
        assert!(!store.delete_task(&task.id).await.unwrap());
        assert_eq!(store.list_comments(&task.id, 1, 20).await.unwrap().1, 0);
        assert!(store.get_comment(&kept.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn list_filters_sorts_and_pages() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for (i, title) in ["c", "a", "b"].iter().enumerate() {
            let t = new_task(title, "usr_a", &[], now + Duration::seconds(i as i64));
            store.insert_task(t).await.unwrap();
        }
        store
            .insert_task(new_task("z", "usr_other", &[], now))
            .await
            .unwrap();

        let query = TaskQuery {
            assigned_by: Some("usr_a".to_string()),
            sort: SortKey::Title,
            order: SortOrder::Asc,
            limit: 2,
            ..TaskQuery::default()
        };
        let page = store.list_tasks(&query, now).await.unwrap();
        assert_eq!(page.total, 3);
        let titles: Vec<&str> = page.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);

        let query = TaskQuery { page: 2, ..query };
        let page = store.list_tasks(&query, now).await.unwrap();
        assert_eq!(page.tasks.len(), 1);
        assert_eq!(page.tasks[0].title, "c");
    }

    #[tokio::test]
    async fn status_counts_ignore_filters() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let mut done = new_task("done", "usr_a", &[], now);
        done.set_status(TaskStatus::Completed, now);
        store.insert_task(done).await.unwrap();
        store.insert_task(new_task("open", "usr_a", &[], now)).await.unwrap();

        let stats = store.status_counts().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 1);

        let query = TaskQuery {
            status: StatusFilter::Is(TaskStatus::Completed),
            ..TaskQuery::default()
        };
        assert_eq!(store.list_tasks(&query, now).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn distinct_tags_skip_blanks() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.insert_task(new_task("a", "usr_a", &["ops", " "], now)).await.unwrap();
        store.insert_task(new_task("b", "usr_a", &["ops", "dev"], now)).await.unwrap();

        assert_eq!(store.distinct_tags().await.unwrap(), vec!["dev", "ops"]);
    }

    #[tokio::test]
    async fn open_tasks_excludes_closed() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let mut cancelled = new_task("x", "usr_a", &[], now);
        cancelled.set_status(TaskStatus::Cancelled, now);
        store.insert_task(cancelled).await.unwrap();
        store.insert_task(new_task("y", "usr_a", &[], now)).await.unwrap();

        let open = store.open_tasks().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].title, "y");
    }

    #[tokio::test]
    async fn comments_are_newest_first() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for i in 0..3 {
            let c = TaskComment::new("task_1", "usr_a", &format!("c{i}"), now + Duration::seconds(i));
            store.insert_comment(c).await.unwrap();
        }
        let (page, total) = store.list_comments("task_1", 1, 2).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page[0].comment, "c2");
        assert_eq!(page[1].comment, "c1");

        let (page, total) = store.list_comments("task_1", usize::MAX, 100).await.unwrap();
        assert_eq!(total, 3);
        assert!(page.is_empty());
    }
}
