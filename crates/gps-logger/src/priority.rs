//! Priority hand-off between two cooperating tasks
//!
//! Task 1 raises task 2 one level above its own priority; task 2 then runs
//! and drops itself two levels below the priority it started with. Neither
//! task blocks, so execution alternates purely through priority changes.
//! The scheduler decision is modelled as state so it can be stepped and
//! checked without a real kernel.

use serde::Serialize;
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TaskId {
    Task1,
    Task2,
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Task1 => f.write_str("Task 1"),
            TaskId::Task2 => f.write_str("Task 2"),
        }
    }
}

/// One scheduling decision and the priority change it made
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandoffEvent {
    /// Task that ran
    pub task: TaskId,
    pub message: &'static str,
    /// Task 2 priority after the step
    pub new_priority: u8,
}

#[derive(Debug, Clone)]
pub struct PriorityHandoff {
    task1_priority: u8,
    task2_priority: u8,
    /// Priority each task saw the first time it ran
    task1_base: Option<u8>,
    task2_base: Option<u8>,
}

impl PriorityHandoff {
    pub fn new(task1_priority: u8, task2_priority: u8) -> Self {
        Self {
            task1_priority,
            task2_priority,
            task1_base: None,
            task2_base: None,
        }
    }

    /// The task the scheduler would run next (ties go to task 1)
    pub fn ready(&self) -> TaskId {
        if self.task2_priority > self.task1_priority {
            TaskId::Task2
        } else {
            TaskId::Task1
        }
    }

    pub fn priorities(&self) -> (u8, u8) {
        (self.task1_priority, self.task2_priority)
    }

    /// Run the ready task for one loop iteration
    pub fn step(&mut self) -> HandoffEvent {
        let task = self.ready();
        let message = match task {
            TaskId::Task1 => {
                let base = *self.task1_base.get_or_insert(self.task1_priority);
                self.task2_priority = base.saturating_add(1);
                "About to raise the Task 2 priority"
            }
            TaskId::Task2 => {
                let base = *self.task2_base.get_or_insert(self.task2_priority);
                self.task2_priority = base.saturating_sub(2);
                "About to lower the Task 2 priority"
            }
        };

        info!("{} is running: {}", task, message);
        HandoffEvent {
            task,
            message,
            new_priority: self.task2_priority,
        }
    }
}

impl Default for PriorityHandoff {
    /// Task 1 created at priority 2, task 2 at priority 1
    fn default() -> Self {
        Self::new(2, 1)
    }
}

impl Iterator for PriorityHandoff {
    type Item = HandoffEvent;

    fn next(&mut self) -> Option<HandoffEvent> {
        Some(self.step())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_alternate() {
        let order: Vec<TaskId> = PriorityHandoff::default().take(6).map(|e| e.task).collect();
        assert_eq!(
            order,
            vec![
                TaskId::Task1,
                TaskId::Task2,
                TaskId::Task1,
                TaskId::Task2,
                TaskId::Task1,
                TaskId::Task2
            ]
        );
    }

    #[test]
    fn test_priority_changes() {
        let mut handoff = PriorityHandoff::default();
        assert_eq!(handoff.step().new_priority, 3);
        assert_eq!(handoff.priorities(), (2, 3));
        let lowered = handoff.step();
        assert_eq!(lowered.task, TaskId::Task2);
        assert_eq!(lowered.new_priority, 1);
        assert_eq!(handoff.ready(), TaskId::Task1);
    }

    #[test]
    fn test_higher_task2_runs_first() {
        let mut handoff = PriorityHandoff::new(1, 4);
        let first = handoff.step();
        assert_eq!(first.task, TaskId::Task2);
        assert_eq!(first.new_priority, 2);
        assert_eq!(handoff.step().task, TaskId::Task1);
    }
}
