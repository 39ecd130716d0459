use super::task_item::{DeleteOutcome, TaskItem};
use crate::actions::{ActionResult, DeletedTask};
use crate::db::models::Task;

/// Ordered task rows, rebuilt from fresh server data.
#[derive(Debug, Clone, Default)]
pub struct TaskList {
    items: Vec<TaskItem>,
}

impl TaskList {
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self {
            items: tasks.into_iter().map(TaskItem::new).collect(),
        }
    }

    pub fn items(&self) -> &[TaskItem] {
        &self.items
    }

    pub fn get_mut(&mut self, task_id: &str) -> Option<&mut TaskItem> {
        self.items.iter_mut().find(|item| item.id() == task_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_checked()).count()
    }

    /// Re-render from fresh data. Rows with a request in flight keep their local state.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        let mut previous = std::mem::take(&mut self.items);
        self.items = tasks
            .into_iter()
            .map(|task| match previous.iter().position(|item| item.id() == task.id) {
                Some(index) => {
                    let mut item = previous.swap_remove(index);
                    item.refresh(task);
                    item
                },
                None => TaskItem::new(task),
            })
            .collect();
    }

    /// Show a newly created task at the top.
    pub fn prepend(&mut self, task: Task) {
        self.items.insert(0, TaskItem::new(task));
    }

    pub fn remove(&mut self, task_id: &str) -> Option<TaskItem> {
        let index = self.items.iter().position(|item| item.id() == task_id)?;
        Some(self.items.remove(index))
    }

    /// Feed a delete result to the row, dropping it on success.
    pub fn finish_delete(&mut self, task_id: &str, result: ActionResult<DeletedTask>) {
        let outcome = match self.get_mut(task_id) {
            Some(item) => item.finish_delete(result),
            None => return,
        };
        if outcome == DeleteOutcome::Removed {
            self.remove(task_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionError;
    use crate::error::AppError;
    use chrono::Utc;

    fn task(id: &str, completed: bool) -> Task {
        let now = Utc::now();
        Task {
            id: id.to_string(),
            title: format!("task {}", id),
            description: None,
            completed,
            user_id: "u".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_counts() {
        let list = TaskList::from_tasks(vec![task("a", true), task("b", false), task("c", true)]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.completed_count(), 2);
        assert!(!list.is_empty());
        assert!(TaskList::default().is_empty());
    }

    #[test]
    fn test_replace_all_keeps_in_flight_rows() {
        let mut list = TaskList::from_tasks(vec![task("a", false), task("b", false)]);
        list.get_mut("a").unwrap().begin_toggle().unwrap();

        // Fresh data arrives before the toggle result; "b" was completed elsewhere
        list.replace_all(vec![task("c", false), task("a", false), task("b", true)]);

        let ids: Vec<&str> = list.items().iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert!(list.items()[1].is_checked());
        assert!(list.items()[1].is_busy());
        assert!(list.items()[2].is_checked());
    }

    #[test]
    fn test_delete_flow() {
        let mut list = TaskList::from_tasks(vec![task("a", false), task("b", false)]);

        list.get_mut("a").unwrap().begin_delete().unwrap();
        list.finish_delete(
            "a",
            ActionResult::Failure(ActionError::from(&AppError::Gateway(
                "Failed to delete task".to_string(),
            ))),
        );
        assert_eq!(list.len(), 2);
        assert_eq!(
            list.get_mut("a").unwrap().error(),
            Some("Failed to delete task")
        );

        list.get_mut("a").unwrap().begin_delete().unwrap();
        list.finish_delete(
            "a",
            ActionResult::Success(DeletedTask {
                id: "a".to_string(),
            }),
        );
        assert_eq!(list.len(), 1);
        assert_eq!(list.items()[0].id(), "b");
    }

    #[test]
    fn test_prepend() {
        let mut list = TaskList::from_tasks(vec![task("old", false)]);
        list.prepend(task("new", false));
        assert_eq!(list.items()[0].id(), "new");
    }
}
