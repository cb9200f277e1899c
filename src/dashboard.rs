//! Dashboard: the signed-in user's task list and counts.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::api::{ChatApi, TaskApi};
use crate::chat::Conversation;
use crate::error::ApiError;
use crate::navigation::{Navigator, Route};
use crate::session::{SessionState, SessionStore};
use crate::todos::{Task, TaskStatusFilter, TaskSummary};
use crate::tools::{DispatchReport, ToolEffect};

/// What the dashboard should render.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    /// Session not resolved yet.
    Loading,
    /// Nobody is signed in; the user was sent to the login route.
    RedirectToLogin,
    Ready {
        tasks: Vec<Task>,
        summary: TaskSummary,
    },
}

pub struct Dashboard {
    session: Arc<SessionStore>,
    tasks: Arc<dyn TaskApi>,
    chat: Arc<dyn ChatApi>,
    navigator: Arc<dyn Navigator>,
    cache: RwLock<Vec<Task>>,
}

impl Dashboard {
    pub fn new(
        session: Arc<SessionStore>,
        tasks: Arc<dyn TaskApi>,
        chat: Arc<dyn ChatApi>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            session,
            tasks,
            chat,
            navigator,
            cache: RwLock::new(Vec::new()),
        }
    }

    /// Resolve the view for the current session, fetching tasks when signed in.
    pub async fn load(&self, filter: TaskStatusFilter) -> Result<DashboardView, ApiError> {
        let user = match self.session.session() {
            SessionState::Loading => return Ok(DashboardView::Loading),
            SessionState::Anonymous => {
                info!("Dashboard requires a session; redirecting to login");
                self.navigator.navigate(Route::Login);
                return Ok(DashboardView::RedirectToLogin);
            }
            SessionState::Authenticated(user) => user,
        };

        let tasks = self.tasks.list_tasks(&user.id, filter).await?;
        debug!(user_id = %user.id, filter = filter.as_str(), count = tasks.len(), "Loaded tasks");
        *self.cache.write().await = tasks.clone();

        Ok(DashboardView::Ready {
            summary: TaskSummary::from_tasks(&tasks),
            tasks,
        })
    }

    /// Tasks from the last load, with confirmed tool effects applied.
    pub async fn tasks(&self) -> Vec<Task> {
        self.cache.read().await.clone()
    }

    pub async fn summary(&self) -> TaskSummary {
        TaskSummary::from_tasks(&self.cache.read().await)
    }

    /// Merge the effects the backend confirmed during a dispatch into the
    /// cached list. Reports for another user are ignored.
    pub async fn apply_report(&self, report: &DispatchReport) -> TaskSummary {
        let mut cache = self.cache.write().await;
        if self.session.user_id().as_deref() != Some(report.user_id.as_str()) {
            debug!(user_id = %report.user_id, "Ignoring dispatch report for another user");
            return TaskSummary::from_tasks(&cache);
        }

        for effect in report.effects() {
            match effect {
                ToolEffect::Created(task) => cache.push(task.clone()),
                ToolEffect::Updated(task) => {
                    match cache.iter_mut().find(|t| t.task_id == task.task_id) {
                        Some(existing) => *existing = task.clone(),
                        None => cache.push(task.clone()),
                    }
                }
                ToolEffect::Deleted { task_id } => cache.retain(|t| &t.task_id != task_id),
                ToolEffect::Skipped => {}
            }
        }
        TaskSummary::from_tasks(&cache)
    }

    /// Most recently updated conversations for the signed-in user. Empty when
    /// nobody is signed in.
    pub async fn recent_conversations(&self, limit: u32) -> Result<Vec<Conversation>, ApiError> {
        match self.session.user_id() {
            Some(user_id) => self.chat.list_conversations(&user_id, limit, 0).await,
            None => Ok(Vec::new()),
        }
    }
}
