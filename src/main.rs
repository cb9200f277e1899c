use std::sync::Arc;

use anyhow::Context;
use futures::{StreamExt, stream};
use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, BufReader};

use todo_chat::api::ApiClient;
use todo_chat::chat::{ChatController, RefreshCallback, SubmitOutcome};
use todo_chat::config::ClientConfig;
use todo_chat::dashboard::{Dashboard, DashboardView};
use todo_chat::navigation::LogNavigator;
use todo_chat::session::{FileStore, LocalIdentityProvider, SessionState, SessionStore};
use todo_chat::todos::TaskStatusFilter;
use todo_chat::tools::ToolDispatcher;

/// A line typed at the prompt.
#[derive(Debug, PartialEq)]
enum Command {
    Login { email: String, password: String },
    Signup { email: String, password: String, name: String },
    Logout,
    Tasks(TaskStatusFilter),
    Conversations,
    Open(String),
    New,
    Health,
    Quit,
    Chat(String),
    Usage(&'static str),
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if !line.starts_with('/') {
            return Self::Chat(line.to_string());
        }

        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match (cmd, args.as_slice()) {
            ("/login", [email, password]) => Self::Login {
                email: email.to_string(),
                password: password.to_string(),
            },
            ("/login", _) => Self::Usage("/login <email> <password>"),
            ("/signup", [email, password, name @ ..]) if !name.is_empty() => Self::Signup {
                email: email.to_string(),
                password: password.to_string(),
                name: name.join(" "),
            },
            ("/signup", _) => Self::Usage("/signup <email> <password> <name>"),
            ("/logout", _) => Self::Logout,
            ("/tasks", []) => Self::Tasks(TaskStatusFilter::All),
            ("/tasks", [filter]) => match filter.parse() {
                Ok(filter) => Self::Tasks(filter),
                Err(_) => Self::Usage("/tasks [all|pending|completed]"),
            },
            ("/tasks", _) => Self::Usage("/tasks [all|pending|completed]"),
            ("/conversations", _) => Self::Conversations,
            ("/open", [id]) => Self::Open(id.to_string()),
            ("/open", _) => Self::Usage("/open <conversation-id>"),
            ("/new", _) => Self::New,
            ("/health", _) => Self::Health,
            ("/quit" | "/exit", _) => Self::Quit,
            _ => Self::Usage(
                "/login, /signup, /logout, /tasks, /conversations, /open, /new, /health, /quit",
            ),
        }
    }
}

async fn render_dashboard(dashboard: &Dashboard, filter: TaskStatusFilter) {
    match dashboard.load(filter).await {
        Ok(DashboardView::Ready { tasks, summary }) => {
            println!(
                "\n📋 Total: {}  Pending: {}  Completed: {}",
                summary.total, summary.pending, summary.completed
            );
            for task in tasks {
                let mark = if task.is_completed() { "x" } else { " " };
                println!("  [{mark}] {} ({}) · {}", task.title, task.priority, task.task_id);
            }
            println!();
        }
        Ok(DashboardView::RedirectToLogin) => {
            eprintln!("ℹ️  Sign in with /login <email> <password> to see your tasks");
        }
        Ok(DashboardView::Loading) => eprintln!("⏳ Loading session..."),
        Err(e) => eprintln!("❌ Could not load tasks: {e}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ClientConfig::from_env();
    config.validate()?;

    eprintln!("✅ Todo Chat v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.api_base_url);
    eprintln!("   Data dir: {}", config.data_dir.display());
    eprintln!("   Type a message and press Enter. /quit to exit.\n");

    // ── Wiring ───────────────────────────────────────────────────────────
    let client = Arc::new(ApiClient::from_config(&config).context("building HTTP client")?);
    let navigator = Arc::new(LogNavigator);

    let session = Arc::new(
        SessionStore::new(
            Arc::new(FileStore::new(&config.data_dir)),
            Arc::new(LocalIdentityProvider::new()),
            navigator.clone(),
        )
        .with_redirect_after_auth(config.redirect_after_auth),
    );
    if let SessionState::Authenticated(user) = session.load().await {
        eprintln!("   Signed in as {} <{}>", user.name, user.email);
    }

    let dispatcher =
        Arc::new(ToolDispatcher::new(client.clone()).with_demo_user(config.allow_demo_user));
    let dashboard = Arc::new(Dashboard::new(
        session.clone(),
        client.clone(),
        client.clone(),
        navigator,
    ));

    let refresh: RefreshCallback = {
        let dashboard = Arc::clone(&dashboard);
        let session = Arc::clone(&session);
        Arc::new(move || {
            if !session.session().is_authenticated() {
                return;
            }
            let dashboard = Arc::clone(&dashboard);
            tokio::spawn(async move {
                render_dashboard(&dashboard, TaskStatusFilter::All).await;
                eprint!("> ");
            });
        })
    };

    let controller = ChatController::new(client.clone(), dispatcher, session.clone())
        .with_refresh_delay(config.refresh_delay)
        .on_refresh(refresh);

    // ── REPL ─────────────────────────────────────────────────────────────
    let lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input = Box::pin(stream::unfold(lines, |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(line)) => Some((line, lines)),
            Ok(None) => None,
            Err(e) => {
                tracing::error!("Error reading stdin: {}", e);
                None
            }
        }
    }));

    eprint!("> ");
    while let Some(line) = input.next().await {
        if line.trim().is_empty() {
            eprint!("> ");
            continue;
        }

        match Command::parse(&line) {
            Command::Quit => break,
            Command::Usage(usage) => eprintln!("Usage: {usage}"),
            Command::Login { email, password } => {
                match session.sign_in(&email, SecretString::from(password)).await {
                    Ok(user) => {
                        eprintln!("✅ Signed in as {}", user.name);
                        controller.new_conversation().await;
                        render_dashboard(&dashboard, TaskStatusFilter::All).await;
                    }
                    Err(e) => eprintln!("❌ {e}"),
                }
            }
            Command::Signup {
                email,
                password,
                name,
            } => match session
                .sign_up(&email, SecretString::from(password), &name)
                .await
            {
                Ok(user) => {
                    eprintln!("✅ Welcome, {}", user.name);
                    controller.new_conversation().await;
                    render_dashboard(&dashboard, TaskStatusFilter::All).await;
                }
                Err(e) => eprintln!("❌ {e}"),
            },
            Command::Logout => {
                if let Err(e) = session.sign_out().await {
                    eprintln!("⚠️  Signed out, but the stored session could not be removed: {e}");
                } else {
                    eprintln!("👋 Signed out");
                }
                controller.new_conversation().await;
            }
            Command::Tasks(filter) => render_dashboard(&dashboard, filter).await,
            Command::Conversations => match dashboard.recent_conversations(10).await {
                Ok(conversations) if conversations.is_empty() => {
                    eprintln!("ℹ️  No conversations yet")
                }
                Ok(conversations) => {
                    for c in conversations {
                        println!(
                            "  {} · {} · updated {}",
                            c.conversation_id,
                            c.title.as_deref().unwrap_or("(untitled)"),
                            c.updated_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
                Err(e) => eprintln!("❌ Could not list conversations: {e}"),
            },
            Command::Open(id) => match controller.load_conversation(&id).await {
                Ok(()) => {
                    for msg in controller.transcript().await {
                        println!("{:?}: {}", msg.role, msg.content);
                    }
                }
                Err(e) => eprintln!("❌ {e}"),
            },
            Command::New => {
                controller.new_conversation().await;
                eprintln!("ℹ️  Started a new conversation");
            }
            Command::Health => match client.health().await {
                Ok(body) => eprintln!("✅ Backend healthy: {body}"),
                Err(e) => eprintln!("❌ {e}"),
            },
            Command::Chat(message) => match controller.submit(&message).await {
                SubmitOutcome::Replied { response, report } => {
                    println!("\n{response}\n");
                    for outcome in &report.outcomes {
                        match &outcome.result {
                            Ok(_) => eprintln!("✅ {} done", outcome.tool),
                            Err(e) => eprintln!("❌ {} failed: {e}", outcome.tool),
                        }
                    }
                    dashboard.apply_report(&report).await;
                }
                SubmitOutcome::Failed { message } => println!("\n{message}\n"),
                SubmitOutcome::Ignored | SubmitOutcome::Discarded => {}
            },
        }
        eprint!("> ");
    }

    controller.unmount();
    Ok(())
}
