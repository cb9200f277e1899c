//! Tool-call dispatcher: applies a chat turn's tool calls to the task API.
//!
//! Calls run one at a time in the order the backend listed them. A failing
//! call is recorded and the rest still run; earlier effects are not undone.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::TaskApi;
use crate::error::DispatchError;
use crate::todos::Task;
use crate::tools::call::ToolCall;

/// Identity used for task calls when nobody is signed in (demo mode).
pub const DEMO_USER_ID: &str = "00000000-0000-4000-8000-000000000001";

/// What a single tool call did.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEffect {
    Created(Task),
    Updated(Task),
    Deleted { task_id: String },
    /// Unrecognized tool; nothing was called.
    Skipped,
}

#[derive(Debug)]
pub struct ToolOutcome {
    pub tool: String,
    pub result: Result<ToolEffect, DispatchError>,
}

impl ToolOutcome {
    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }
}

/// Per-call outcomes of one dispatch, in call order.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub user_id: String,
    pub outcomes: Vec<ToolOutcome>,
}

impl DispatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &ToolOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Effects the backend confirmed.
    pub fn effects(&self) -> impl Iterator<Item = &ToolEffect> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }
}

pub struct ToolDispatcher {
    tasks: Arc<dyn TaskApi>,
    allow_demo_user: bool,
}

impl ToolDispatcher {
    pub fn new(tasks: Arc<dyn TaskApi>) -> Self {
        Self {
            tasks,
            allow_demo_user: true,
        }
    }

    /// Builder: whether to fall back to [`DEMO_USER_ID`] without a session.
    pub fn with_demo_user(mut self, allow: bool) -> Self {
        self.allow_demo_user = allow;
        self
    }

    /// Resolve the identity tool calls act as.
    pub fn acting_user(&self, session_user: Option<&str>) -> Result<String, DispatchError> {
        match session_user.filter(|id| !id.trim().is_empty()) {
            Some(id) => Ok(id.to_string()),
            None if self.allow_demo_user => {
                debug!("No session user; acting as demo user");
                Ok(DEMO_USER_ID.to_string())
            }
            None => Err(DispatchError::Unauthenticated),
        }
    }

    /// Execute every call sequentially as `user_id`.
    pub async fn dispatch(&self, user_id: &str, calls: &[ToolCall]) -> DispatchReport {
        let mut report = DispatchReport {
            user_id: user_id.to_string(),
            outcomes: Vec::with_capacity(calls.len()),
        };

        for (index, call) in calls.iter().enumerate() {
            let result = self.execute(user_id, call).await;
            match &result {
                Ok(ToolEffect::Skipped) => {
                    debug!(index, tool = call.name(), "Skipping unrecognized tool call");
                }
                Ok(_) => info!(index, tool = call.name(), user_id, "Tool call applied"),
                Err(e) => warn!(index, tool = call.name(), error = %e, "Tool call failed"),
            }
            report.outcomes.push(ToolOutcome {
                tool: call.name().to_string(),
                result,
            });
        }

        report
    }

    async fn execute(&self, user_id: &str, call: &ToolCall) -> Result<ToolEffect, DispatchError> {
        let api_err = |source| DispatchError::Api {
            name: call.name().to_string(),
            source,
        };

        match call {
            ToolCall::AddTask(task) => self
                .tasks
                .create_task(user_id, task)
                .await
                .map(ToolEffect::Created)
                .map_err(api_err),
            ToolCall::UpdateTask { task_id, changes }
            | ToolCall::CompleteTask { task_id, changes } => self
                .tasks
                .update_task(user_id, task_id, changes)
                .await
                .map(ToolEffect::Updated)
                .map_err(api_err),
            ToolCall::DeleteTask { task_id } => self
                .tasks
                .delete_task(user_id, task_id)
                .await
                .map(|()| ToolEffect::Deleted {
                    task_id: task_id.clone(),
                })
                .map_err(api_err),
            ToolCall::Unrecognized { .. } => Ok(ToolEffect::Skipped),
            ToolCall::Malformed { name, reason } => Err(DispatchError::InvalidArguments {
                name: name.clone(),
                reason: reason.clone(),
            }),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{RecordingTaskApi, TaskCall};
    use super::*;
    use crate::todos::{NewTask, TaskPriority, TaskStatus, TaskUpdate};
    use crate::tools::call::RawToolCall;

    fn calls(raw: serde_json::Value) -> Vec<ToolCall> {
        serde_json::from_value::<Vec<RawToolCall>>(raw)
            .unwrap()
            .into_iter()
            .map(ToolCall::from)
            .collect()
    }

    #[tokio::test]
    async fn add_task_issues_one_create_with_defaults() {
        let api = Arc::new(RecordingTaskApi::new());
        let dispatcher = ToolDispatcher::new(api.clone());

        let report = dispatcher
            .dispatch(
                "u1",
                &calls(serde_json::json!([{"name": "add_task", "arguments": {"title": "Buy milk"}}])),
            )
            .await;

        assert_eq!(
            api.calls(),
            vec![TaskCall::Create {
                user_id: "u1".into(),
                task: NewTask {
                    title: "Buy milk".into(),
                    description: String::new(),
                    priority: TaskPriority::Medium,
                },
            }]
        );
        assert!(!report.has_failures());
        assert!(matches!(report.effects().next(), Some(ToolEffect::Created(_))));
    }

    #[tokio::test]
    async fn complete_task_sets_completed_regardless_of_supplied_status() {
        let api = Arc::new(RecordingTaskApi::new());
        let dispatcher = ToolDispatcher::new(api.clone());

        dispatcher
            .dispatch(
                "u1",
                &calls(serde_json::json!([
                    {"name": "complete_task", "arguments": {"task_id": "T1", "status": "pending"}}
                ])),
            )
            .await;

        match &api.calls()[..] {
            [TaskCall::Update { task_id, update, .. }] => {
                assert_eq!(task_id, "T1");
                assert_eq!(update.status, Some(TaskStatus::Completed));
            }
            other => panic!("Expected one update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unrecognized_tool_makes_no_calls() {
        let api = Arc::new(RecordingTaskApi::new());
        let dispatcher = ToolDispatcher::new(api.clone());

        let report = dispatcher
            .dispatch(
                "u1",
                &calls(serde_json::json!([{"name": "list_tasks", "arguments": {"status": "all"}}])),
            )
            .await;

        assert!(api.calls().is_empty());
        assert!(!report.has_failures());
        assert!(matches!(report.outcomes[0].result, Ok(ToolEffect::Skipped)));
    }

    #[tokio::test]
    async fn failure_in_the_middle_does_not_stop_later_calls() {
        let api = Arc::new(RecordingTaskApi::new().fail_for("T2"));
        let dispatcher = ToolDispatcher::new(api.clone());

        let report = dispatcher
            .dispatch(
                "u1",
                &calls(serde_json::json!([
                    {"name": "add_task", "arguments": {"title": "First"}},
                    {"name": "delete_task", "arguments": {"task_id": "T2"}},
                    {"name": "update_task", "parameters": {"task_id": "T3", "title": "Third"}}
                ])),
            )
            .await;

        let recorded = api.calls();
        assert_eq!(recorded.len(), 3);
        assert!(matches!(&recorded[0], TaskCall::Create { task, .. } if task.title == "First"));
        assert!(matches!(&recorded[1], TaskCall::Delete { task_id, .. } if task_id == "T2"));
        assert!(matches!(
            &recorded[2],
            TaskCall::Update { task_id, update, .. }
                if task_id == "T3" && *update == TaskUpdate { title: Some("Third".into()), ..Default::default() }
        ));

        assert!(report.outcomes[0].result.is_ok());
        assert!(report.outcomes[1].is_failure());
        assert!(report.outcomes[2].result.is_ok());
        assert_eq!(report.failures().count(), 1);
    }

    #[tokio::test]
    async fn malformed_call_is_reported_without_network_call() {
        let api = Arc::new(RecordingTaskApi::new());
        let dispatcher = ToolDispatcher::new(api.clone());

        let report = dispatcher
            .dispatch(
                "u1",
                &calls(serde_json::json!([{"name": "delete_task", "arguments": {}}])),
            )
            .await;

        assert!(api.calls().is_empty());
        assert!(matches!(
            report.outcomes[0].result,
            Err(DispatchError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn acting_user_prefers_session() {
        let dispatcher = ToolDispatcher::new(Arc::new(RecordingTaskApi::new()));
        assert_eq!(dispatcher.acting_user(Some("u1")).unwrap(), "u1");
        assert_eq!(dispatcher.acting_user(None).unwrap(), DEMO_USER_ID);
        assert_eq!(dispatcher.acting_user(Some("  ")).unwrap(), DEMO_USER_ID);
    }

    #[test]
    fn acting_user_rejects_anonymous_without_demo_mode() {
        let dispatcher =
            ToolDispatcher::new(Arc::new(RecordingTaskApi::new())).with_demo_user(false);
        assert!(matches!(
            dispatcher.acting_user(None),
            Err(DispatchError::Unauthenticated)
        ));
    }
}
