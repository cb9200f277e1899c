//! Task endpoints: `/api/{user}/tasks`.

use async_trait::async_trait;
use reqwest::Method;

use crate::api::client::ApiClient;
use crate::error::ApiError;
use crate::todos::{NewTask, Task, TaskList, TaskStatusFilter, TaskUpdate};

/// Backend task operations used by the dispatcher and the dashboard.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// List tasks for a user, optionally filtered by status.
    async fn list_tasks(&self, user_id: &str, filter: TaskStatusFilter)
        -> Result<Vec<Task>, ApiError>;

    /// Create a task and return the stored entity.
    async fn create_task(&self, user_id: &str, task: &NewTask) -> Result<Task, ApiError>;

    /// Apply a partial update and return the stored entity.
    async fn update_task(
        &self,
        user_id: &str,
        task_id: &str,
        update: &TaskUpdate,
    ) -> Result<Task, ApiError>;

    /// Remove a task.
    async fn delete_task(&self, user_id: &str, task_id: &str) -> Result<(), ApiError>;
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Request(e.to_string()))
}

#[async_trait]
impl TaskApi for ApiClient {
    async fn list_tasks(
        &self,
        user_id: &str,
        filter: TaskStatusFilter,
    ) -> Result<Vec<Task>, ApiError> {
        let list: TaskList = self
            .request(
                Method::GET,
                &["api", user_id, "tasks"],
                &[("status", filter.as_str().to_string())],
                None,
            )
            .await?;
        Ok(list.tasks)
    }

    async fn create_task(&self, user_id: &str, task: &NewTask) -> Result<Task, ApiError> {
        let body = to_body(task)?;
        self.request(Method::POST, &["api", user_id, "tasks"], &[], Some(&body))
            .await
    }

    async fn update_task(
        &self,
        user_id: &str,
        task_id: &str,
        update: &TaskUpdate,
    ) -> Result<Task, ApiError> {
        let body = to_body(update)?;
        self.request(
            Method::PUT,
            &["api", user_id, "tasks", task_id],
            &[],
            Some(&body),
        )
        .await
    }

    async fn delete_task(&self, user_id: &str, task_id: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .request(Method::DELETE, &["api", user_id, "tasks", task_id], &[], None)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todos::{TaskPriority, TaskStatus};
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn task_json(id: &str, title: &str, status: &str) -> serde_json::Value {
        serde_json::json!({
            "task_id": id,
            "title": title,
            "description": "",
            "status": status,
            "priority": "medium",
            "created_at": "2025-01-10T09:00:00Z",
            "updated_at": "2025-01-10T09:00:00Z",
            "completed_at": null
        })
    }

    #[tokio::test]
    async fn list_tasks_sends_status_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/u1/tasks"))
            .and(query_param("status", "pending"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tasks": [task_json("t1", "Buy milk", "pending")],
                "total": 1,
                "status_filter": "pending"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let tasks = client
            .list_tasks("u1", TaskStatusFilter::Pending)
            .await
            .unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task_id, "t1");
    }

    #[tokio::test]
    async fn create_task_posts_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/u1/tasks"))
            .and(body_json(serde_json::json!({
                "title": "Buy milk",
                "description": "",
                "priority": "medium"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(task_json("t9", "Buy milk", "pending")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let task = client
            .create_task("u1", &NewTask::new("Buy milk"))
            .await
            .unwrap();
        assert_eq!(task.task_id, "t9");
        assert_eq!(task.priority, TaskPriority::Medium);
    }

    #[tokio::test]
    async fn update_task_puts_partial_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/u1/tasks/t1"))
            .and(body_json(serde_json::json!({"status": "completed"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(task_json("t1", "Buy milk", "completed")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let update = TaskUpdate {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        let task = client.update_task("u1", "t1", &update).await.unwrap();
        assert!(task.is_completed());
    }

    #[tokio::test]
    async fn delete_missing_task_surfaces_404() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/u1/tasks/nope"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"detail": "Task not found"})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let err = client.delete_task("u1", "nope").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn delete_task_ok() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/u1/tasks/t1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"message": "Task deleted successfully"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        client.delete_task("u1", "t1").await.unwrap();
    }
}
