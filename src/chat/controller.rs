//! Chat controller: drives one chat turn at a time.
//!
//! Per turn: `Idle → Sending → ToolDispatch → Idle`, or `Idle → Sending → Idle`
//! when the reply carries no tool calls or the send fails. Submissions while a
//! turn is in flight are ignored. Errors never escape a turn; they become an
//! assistant message in the transcript.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};

use crate::api::ChatApi;
use crate::chat::model::{ChatMessage, ChatRequest};
use crate::config::DEFAULT_REFRESH_DELAY_MS;
use crate::error::ApiError;
use crate::session::SessionStore;
use crate::tools::{DispatchReport, ToolDispatcher};

/// Invoked after a turn that carried tool calls, once the refresh delay has
/// elapsed. Typically re-fetches the task list.
pub type RefreshCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Idle,
    Sending,
    ToolDispatch,
}

/// Result of [`ChatController::submit`].
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Empty input, or a turn was already in flight. Nothing was sent.
    Ignored,
    /// The backend replied; tool calls (if any) were dispatched.
    Replied {
        response: String,
        report: DispatchReport,
    },
    /// The turn failed; `message` was appended to the transcript.
    Failed { message: String },
    /// The controller was unmounted before the response arrived.
    Discarded,
}

pub struct ChatController {
    chat: Arc<dyn ChatApi>,
    dispatcher: Arc<ToolDispatcher>,
    session: Arc<SessionStore>,
    refresh_delay: Duration,
    on_refresh: Option<RefreshCallback>,
    phase: watch::Sender<ChatPhase>,
    transcript: RwLock<Vec<ChatMessage>>,
    conversation_id: RwLock<Option<String>>,
    mounted: Arc<AtomicBool>,
}

impl ChatController {
    pub fn new(
        chat: Arc<dyn ChatApi>,
        dispatcher: Arc<ToolDispatcher>,
        session: Arc<SessionStore>,
    ) -> Self {
        let (phase, _rx) = watch::channel(ChatPhase::Idle);
        Self {
            chat,
            dispatcher,
            session,
            refresh_delay: Duration::from_millis(DEFAULT_REFRESH_DELAY_MS),
            on_refresh: None,
            phase,
            transcript: RwLock::new(Vec::new()),
            conversation_id: RwLock::new(None),
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Builder: delay between the end of tool dispatch and the refresh callback.
    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    /// Builder: set the refresh callback.
    pub fn on_refresh(mut self, callback: RefreshCallback) -> Self {
        self.on_refresh = Some(callback);
        self
    }

    pub fn phase(&self) -> ChatPhase {
        *self.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<ChatPhase> {
        self.phase.subscribe()
    }

    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript.read().await.clone()
    }

    pub async fn conversation_id(&self) -> Option<String> {
        self.conversation_id.read().await.clone()
    }

    /// Detach from the view. Responses still in flight are dropped when they
    /// arrive, and pending refreshes do not fire.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Start a fresh conversation.
    pub async fn new_conversation(&self) {
        self.transcript.write().await.clear();
        *self.conversation_id.write().await = None;
    }

    /// Replace the transcript with a stored conversation.
    pub async fn load_conversation(&self, conversation_id: &str) -> Result<(), crate::Error> {
        let user_id = self
            .dispatcher
            .acting_user(self.session.user_id().as_deref())?;
        let detail = self.chat.get_conversation(&user_id, conversation_id).await?;

        let messages: Vec<ChatMessage> = detail
            .messages
            .into_iter()
            .map(|m| m.into_chat_message(&detail.conversation_id))
            .collect();
        debug!(conversation_id = %detail.conversation_id, count = messages.len(), "Loaded conversation");

        *self.transcript.write().await = messages;
        *self.conversation_id.write().await = Some(detail.conversation_id);
        Ok(())
    }

    /// Submit one user message.
    pub async fn submit(&self, input: &str) -> SubmitOutcome {
        let content = input.trim();
        if content.is_empty() {
            return SubmitOutcome::Ignored;
        }

        let started = self.phase.send_if_modified(|phase| {
            if *phase == ChatPhase::Idle {
                *phase = ChatPhase::Sending;
                true
            } else {
                false
            }
        });
        if !started {
            debug!("Submission ignored: a turn is already in flight");
            return SubmitOutcome::Ignored;
        }
        let _idle = ResetToIdle(&self.phase);

        let conversation_id = self.conversation_id().await;
        self.push(ChatMessage::user(content).in_conversation(conversation_id.clone()))
            .await;

        self.run_turn(content, conversation_id).await
    }

    async fn run_turn(&self, content: &str, conversation_id: Option<String>) -> SubmitOutcome {
        let user_id = match self
            .dispatcher
            .acting_user(self.session.user_id().as_deref())
        {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Cannot send chat message");
                return self
                    .fail("Please sign in before sending messages.".to_string())
                    .await;
            }
        };

        let request = ChatRequest {
            message: content.to_string(),
            conversation_id,
        };
        let result = self.chat.send_message(&user_id, &request).await;

        if !self.is_mounted() {
            debug!("Chat response arrived after unmount; discarding");
            return SubmitOutcome::Discarded;
        }

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                return self.fail(describe_api_error(&e)).await;
            }
        };

        info!(
            conversation_id = %reply.conversation_id,
            tool_calls = reply.tool_calls.len(),
            "Chat reply received"
        );
        *self.conversation_id.write().await = Some(reply.conversation_id.clone());
        self.push(
            ChatMessage::assistant(&reply.response)
                .in_conversation(Some(reply.conversation_id.clone())),
        )
        .await;

        if reply.tool_calls.is_empty() {
            return SubmitOutcome::Replied {
                response: reply.response,
                report: DispatchReport {
                    user_id,
                    outcomes: Vec::new(),
                },
            };
        }

        self.phase.send_replace(ChatPhase::ToolDispatch);
        let report = self.dispatcher.dispatch(&user_id, &reply.tool_calls).await;

        if report.has_failures() && self.is_mounted() {
            let failed: Vec<String> = report
                .failures()
                .filter_map(|o| o.result.as_ref().err().map(|e| format!("{} ({e})", o.tool)))
                .collect();
            self.push(
                ChatMessage::assistant(format!(
                    "Sorry, some actions could not be completed: {}",
                    failed.join("; ")
                ))
                .in_conversation(Some(reply.conversation_id.clone())),
            )
            .await;
        }

        self.schedule_refresh();

        SubmitOutcome::Replied {
            response: reply.response,
            report,
        }
    }

    async fn fail(&self, message: String) -> SubmitOutcome {
        let conversation_id = self.conversation_id().await;
        self.push(ChatMessage::assistant(&message).in_conversation(conversation_id))
            .await;
        SubmitOutcome::Failed { message }
    }

    async fn push(&self, message: ChatMessage) {
        self.transcript.write().await.push(message);
    }

    fn schedule_refresh(&self) {
        let Some(callback) = self.on_refresh.clone() else {
            return;
        };
        let delay = self.refresh_delay;
        let mounted = Arc::clone(&self.mounted);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if mounted.load(Ordering::SeqCst) {
                callback();
            }
        });
    }
}

/// Returns the controller to `Idle` when a turn ends, including when the
/// `submit` future is dropped mid-turn.
struct ResetToIdle<'a>(&'a watch::Sender<ChatPhase>);

impl Drop for ResetToIdle<'_> {
    fn drop(&mut self) {
        self.0.send_replace(ChatPhase::Idle);
    }
}

/// User-facing text for a failed chat request.
fn describe_api_error(err: &ApiError) -> String {
    match err {
        ApiError::Unreachable { base_url, .. } => format!(
            "I can't reach the server at {base_url}. Please check that the backend is running and try again."
        ),
        ApiError::Http { status, .. } => {
            format!("Sorry, the server returned an error ({status}). Please try again.")
        }
        other => format!("Sorry, I encountered an error: {other}"),
    }
}
