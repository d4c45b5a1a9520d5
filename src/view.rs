//! Derived, read-only projections of the task sequence.

use crate::model::Task;
use serde::{Deserialize, Serialize};

/// Completion-state filter applied before sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Filter {
    #[default]
    All,
    Completed,
    Uncompleted,
}

impl Filter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Completed => task.completed,
            Filter::Uncompleted => !task.completed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortMode {
    None,
    #[default]
    ByPriority,
}

/// Filter, then (optionally) sort by priority rank.
///
/// The sort is stable: equal priorities keep their filtered order.
pub fn view(tasks: &[Task], filter: Filter, sort: SortMode) -> Vec<&Task> {
    let mut out: Vec<&Task> = tasks.iter().filter(|t| filter.matches(t)).collect();
    if sort == SortMode::ByPriority {
        // slice::sort_by_key is stable
        out.sort_by_key(|t| t.priority.rank());
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;
    use chrono::Utc;

    fn task(text: &str, priority: Priority, completed: bool) -> Task {
        let mut t = Task::new(text.into(), priority, Utc::now());
        t.completed = completed;
        t
    }

    fn texts(view: &[&Task]) -> Vec<String> {
        view.iter().map(|t| t.text.clone()).collect()
    }

    #[test]
    fn by_priority_is_stable() {
        let tasks = vec![
            task("1", Priority::Low, false),
            task("2", Priority::High, false),
            task("3", Priority::Medium, false),
            task("4", Priority::High, false),
        ];

        let v = view(&tasks, Filter::All, SortMode::ByPriority);
        assert_eq!(texts(&v), ["2", "4", "3", "1"]);
    }

    #[test]
    fn completed_filter_keeps_relative_order() {
        let tasks = vec![
            task("a", Priority::Low, true),
            task("b", Priority::High, false),
            task("c", Priority::High, true),
            task("d", Priority::Medium, true),
        ];

        let v = view(&tasks, Filter::Completed, SortMode::None);
        assert_eq!(texts(&v), ["a", "c", "d"]);

        let v = view(&tasks, Filter::Uncompleted, SortMode::None);
        assert_eq!(texts(&v), ["b"]);
    }

    #[test]
    fn filter_then_sort() {
        let tasks = vec![
            task("a", Priority::Low, true),
            task("b", Priority::High, false),
            task("c", Priority::High, true),
            task("d", Priority::Medium, true),
        ];

        let v = view(&tasks, Filter::Completed, SortMode::ByPriority);
        assert_eq!(texts(&v), ["c", "d", "a"]);
    }

    #[test]
    fn no_sort_preserves_order() {
        let tasks = vec![
            task("x", Priority::Low, false),
            task("y", Priority::High, false),
        ];
        let v = view(&tasks, Filter::All, SortMode::None);
        assert_eq!(texts(&v), ["x", "y"]);
    }

    #[test]
    fn empty_sequence() {
        assert!(view(&[], Filter::All, SortMode::ByPriority).is_empty());
    }
}
