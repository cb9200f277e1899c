//! Tool calls emitted by the chat backend, normalized into one typed shape.
//!
//! The backend sends `{ name, arguments }`; older responses carry the same map
//! under `parameters`. Both are folded here so nothing downstream probes keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::todos::{NewTask, TaskPriority, TaskStatus, TaskUpdate};

pub const ADD_TASK: &str = "add_task";
pub const UPDATE_TASK: &str = "update_task";
pub const COMPLETE_TASK: &str = "complete_task";
pub const DELETE_TASK: &str = "delete_task";

/// Title used when an `add_task` call arrives without one.
pub const DEFAULT_TASK_TITLE: &str = "New Task";

/// A tool call exactly as it appears on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawToolCall {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// A normalized tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    AddTask(NewTask),
    UpdateTask { task_id: String, changes: TaskUpdate },
    /// Partial update with `status` already forced to completed.
    CompleteTask { task_id: String, changes: TaskUpdate },
    DeleteTask { task_id: String },
    /// A tool this client does not act on. Skipped without error.
    Unrecognized { name: String },
    /// A known tool whose arguments could not be interpreted.
    Malformed { name: String, reason: String },
}

impl ToolCall {
    pub fn name(&self) -> &str {
        match self {
            Self::AddTask(_) => ADD_TASK,
            Self::UpdateTask { .. } => UPDATE_TASK,
            Self::CompleteTask { .. } => COMPLETE_TASK,
            Self::DeleteTask { .. } => DELETE_TASK,
            Self::Unrecognized { name } | Self::Malformed { name, .. } => name,
        }
    }

    /// Whether dispatching this call touches a task endpoint.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::AddTask(_)
                | Self::UpdateTask { .. }
                | Self::CompleteTask { .. }
                | Self::DeleteTask { .. }
        )
    }
}

impl From<RawToolCall> for ToolCall {
    fn from(raw: RawToolCall) -> Self {
        let name = raw.name.trim().to_string();
        let known = matches!(
            name.as_str(),
            ADD_TASK | UPDATE_TASK | COMPLETE_TASK | DELETE_TASK
        );
        if !known {
            return Self::Unrecognized { name };
        }

        let parsed = argument_map(raw.arguments, raw.parameters).and_then(|args| {
            match name.as_str() {
                ADD_TASK => parse_add(args),
                UPDATE_TASK => parse_changes(args)
                    .map(|(task_id, changes)| Self::UpdateTask { task_id, changes }),
                COMPLETE_TASK => parse_changes(args).map(|(task_id, mut changes)| {
                    changes.status = Some(TaskStatus::Completed);
                    Self::CompleteTask { task_id, changes }
                }),
                _ => parse_changes(args).map(|(task_id, _)| Self::DeleteTask { task_id }),
            }
        });

        parsed.unwrap_or_else(|reason| Self::Malformed { name, reason })
    }
}

/// Pick `arguments`, else `parameters`, else an empty map. Stringified JSON
/// objects (as some model APIs emit) are decoded.
fn argument_map(arguments: Option<Value>, parameters: Option<Value>) -> Result<Map<String, Value>, String> {
    let value = arguments
        .filter(|v| !v.is_null())
        .or_else(|| parameters.filter(|v| !v.is_null()));

    match value {
        None => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err("arguments string is not a JSON object".to_string()),
        },
        Some(other) => Err(format!("arguments must be an object, got {other}")),
    }
}

#[derive(Debug, Default, Deserialize)]
struct AddArgs {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChangeArgs {
    #[serde(default)]
    task_id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    status: Option<TaskStatus>,
}

/// Read a priority case-insensitively. Unknown values are dropped with a
/// warning rather than failing the whole call.
fn lenient_priority(raw: Option<&str>) -> Option<TaskPriority> {
    let raw = raw?;
    match raw.parse::<TaskPriority>() {
        Ok(priority) => Some(priority),
        Err(e) => {
            warn!(priority = raw, error = %e, "Ignoring unknown task priority");
            None
        }
    }
}

fn parse_add(args: Map<String, Value>) -> Result<ToolCall, String> {
    let args: AddArgs = serde_json::from_value(Value::Object(args)).map_err(|e| e.to_string())?;
    let title = args
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TASK_TITLE.to_string());
    Ok(ToolCall::AddTask(NewTask {
        title,
        description: args.description.unwrap_or_default(),
        priority: lenient_priority(args.priority.as_deref()).unwrap_or_default(),
    }))
}

fn parse_changes(args: Map<String, Value>) -> Result<(String, TaskUpdate), String> {
    let args: ChangeArgs =
        serde_json::from_value(Value::Object(args)).map_err(|e| e.to_string())?;

    let task_id = match args.task_id {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) | None => return Err("missing task_id".to_string()),
    };

    if args.status == Some(TaskStatus::Unknown) {
        return Err("unsupported status value".to_string());
    }

    Ok((
        task_id,
        TaskUpdate {
            title: args.title,
            description: args.description,
            priority: lenient_priority(args.priority.as_deref()),
            status: args.status,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(name: &str, arguments: Value) -> RawToolCall {
        RawToolCall {
            name: name.into(),
            arguments: Some(arguments),
            parameters: None,
        }
    }

    #[test]
    fn add_task_applies_defaults() {
        let call = ToolCall::from(raw("add_task", json!({"title": "Buy milk"})));
        assert_eq!(
            call,
            ToolCall::AddTask(NewTask {
                title: "Buy milk".into(),
                description: String::new(),
                priority: TaskPriority::Medium,
            })
        );
    }

    #[test]
    fn add_task_without_title_uses_placeholder() {
        let call = ToolCall::from(RawToolCall {
            name: "add_task".into(),
            ..Default::default()
        });
        match call {
            ToolCall::AddTask(task) => assert_eq!(task.title, "New Task"),
            other => panic!("Expected AddTask, got {other:?}"),
        }
    }

    #[test]
    fn legacy_parameters_used_when_arguments_absent() {
        let call = ToolCall::from(RawToolCall {
            name: "add_task".into(),
            arguments: None,
            parameters: Some(json!({"title": "Legacy", "priority": "high"})),
        });
        match call {
            ToolCall::AddTask(task) => {
                assert_eq!(task.title, "Legacy");
                assert_eq!(task.priority, TaskPriority::High);
            }
            other => panic!("Expected AddTask, got {other:?}"),
        }
    }

    #[test]
    fn arguments_take_precedence_over_parameters() {
        let call = ToolCall::from(RawToolCall {
            name: "delete_task".into(),
            arguments: Some(json!({"task_id": "A"})),
            parameters: Some(json!({"task_id": "B"})),
        });
        assert_eq!(call, ToolCall::DeleteTask { task_id: "A".into() });
    }

    #[test]
    fn stringified_arguments_are_decoded() {
        let call = ToolCall::from(raw("delete_task", json!("{\"task_id\": \"T7\"}")));
        assert_eq!(call, ToolCall::DeleteTask { task_id: "T7".into() });
    }

    #[test]
    fn complete_task_forces_completed_status() {
        let call = ToolCall::from(raw(
            "complete_task",
            json!({"task_id": "T1", "status": "pending", "title": "Renamed"}),
        ));
        match call {
            ToolCall::CompleteTask { task_id, changes } => {
                assert_eq!(task_id, "T1");
                assert_eq!(changes.status, Some(TaskStatus::Completed));
                assert_eq!(changes.title.as_deref(), Some("Renamed"));
            }
            other => panic!("Expected CompleteTask, got {other:?}"),
        }
    }

    #[test]
    fn update_task_keeps_only_supplied_fields() {
        let call = ToolCall::from(raw("update_task", json!({"task_id": "T1", "priority": "low"})));
        match call {
            ToolCall::UpdateTask { changes, .. } => {
                assert_eq!(changes.priority, Some(TaskPriority::Low));
                assert!(changes.title.is_none());
                assert!(changes.status.is_none());
            }
            other => panic!("Expected UpdateTask, got {other:?}"),
        }
    }

    #[test]
    fn numeric_task_id_accepted() {
        let call = ToolCall::from(raw("delete_task", json!({"task_id": 42})));
        assert_eq!(call, ToolCall::DeleteTask { task_id: "42".into() });
    }

    #[test]
    fn missing_task_id_is_malformed() {
        let call = ToolCall::from(raw("update_task", json!({"title": "x"})));
        assert!(matches!(call, ToolCall::Malformed { ref name, .. } if name == "update_task"));
        assert!(!call.is_mutation());
    }

    #[test]
    fn priority_is_case_insensitive() {
        let call = ToolCall::from(raw("add_task", json!({"title": "Buy milk", "priority": "High"})));
        assert_eq!(
            call,
            ToolCall::AddTask(NewTask {
                title: "Buy milk".into(),
                description: String::new(),
                priority: TaskPriority::High,
            })
        );
        assert!(call.is_mutation());

        let call = ToolCall::from(raw("update_task", json!({"task_id": "T1", "priority": "LOW"})));
        match call {
            ToolCall::UpdateTask { changes, .. } => {
                assert_eq!(changes.priority, Some(TaskPriority::Low))
            }
            other => panic!("Expected UpdateTask, got {other:?}"),
        }
    }

    #[test]
    fn unknown_priority_falls_back_instead_of_dropping_the_call() {
        let call = ToolCall::from(raw("add_task", json!({"title": "x", "priority": "urgent"})));
        assert!(matches!(call, ToolCall::AddTask(ref t) if t.priority == TaskPriority::Medium));

        let call = ToolCall::from(raw(
            "update_task",
            json!({"task_id": "T1", "title": "y", "priority": "urgent"}),
        ));
        match call {
            ToolCall::UpdateTask { changes, .. } => {
                assert_eq!(changes.title.as_deref(), Some("y"));
                assert_eq!(changes.priority, None);
            }
            other => panic!("Expected UpdateTask, got {other:?}"),
        }
    }

    #[test]
    fn unknown_status_is_malformed() {
        let call = ToolCall::from(raw("update_task", json!({"task_id": "T1", "status": "archived"})));
        assert!(matches!(call, ToolCall::Malformed { .. }));
    }

    #[test]
    fn unknown_name_is_unrecognized() {
        let call = ToolCall::from(raw("list_tasks", json!({"status": "all"})));
        assert_eq!(
            call,
            ToolCall::Unrecognized {
                name: "list_tasks".into()
            }
        );
        assert_eq!(call.name(), "list_tasks");
    }

    #[test]
    fn raw_call_ignores_result_field() {
        let raw: RawToolCall = serde_json::from_value(json!({
            "name": "add_task",
            "arguments": {"title": "Buy milk"},
            "result": {"success": true}
        }))
        .unwrap();
        assert_eq!(raw.name, "add_task");
    }
}
