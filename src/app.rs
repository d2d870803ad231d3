use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;

use crate::{
    backend::{
        self,
        realtime::{RealtimeClient, RealtimeEvent},
    },
    cli::{Cli, Command, DocsCommand},
    domain::{message::Message, sync::ChatState},
    infra,
    usecases::{self, auth::AuthService, bootstrap, context::AppContext, sync::ChatSync},
};

pub async fn run(cli: Cli) -> Result<()> {
    let context = bootstrap::bootstrap(cli.config.as_deref())?;

    tracing::debug!(
        backend = backend::module_name(),
        domain = crate::domain::module_name(),
        usecases = usecases::module_name(),
        infra = infra::module_name(),
        "module boundaries loaded"
    );

    match cli.command {
        Command::Login { email } => {
            let password = rpassword::prompt_password("Password: ")?;
            let user = auth_service(&context).login(&email, &password).await?;
            println!("Logged in as {} <{}>", user.name, user.email);
        }
        Command::Signup {
            first_name,
            last_name,
            email,
            phone,
        } => {
            let password = rpassword::prompt_password("Password: ")?;
            let user = auth_service(&context)
                .signup(&first_name, &last_name, &email, &password, &phone)
                .await?;
            println!("Account created; logged in as {} <{}>", user.name, user.email);
        }
        Command::Logout => {
            auth_service(&context).logout()?;
            println!("Logged out.");
        }
        Command::Whoami => {
            let user = auth_service(&context).me().await?;
            println!("{} <{}> (id {})", user.name, user.email, user.id);
            if let Some(company) = user.company {
                println!("Company: {} ({})", company.name, company.id);
            }
        }
        Command::Chats => {
            let mut sync = chat_sync(&context).await?;
            sync.load_initial().await;
            fail_on_sync_error(&sync)?;
            for channel in &sync.state().channels {
                println!(
                    "{}  {}  ({} participants)",
                    channel.id,
                    channel.display_name(),
                    channel.participant_ids.len()
                );
            }
        }
        Command::Contacts => {
            let mut sync = chat_sync(&context).await?;
            sync.load_initial().await;
            fail_on_sync_error(&sync)?;
            for contact in &sync.state().contacts {
                println!("{}  {}", contact.id, contact.username);
            }
        }
        Command::Send { channel, text } => {
            let mut sync = chat_sync(&context).await?;
            sync.select_channel(Some(channel)).await;
            let message = sync.send_message(&text).await?;
            println!("Sent message {} at {}", message.id, format_time(message.created_at));
        }
        Command::NewChat {
            name,
            description,
            participants,
        } => {
            let mut sync = chat_sync(&context).await?;
            let channel = sync
                .create_chat(usecases::create_chat::CreateChatRequest {
                    name,
                    description,
                    participant_ids: participants,
                })
                .await?;
            println!("Created channel {}  {}", channel.id, channel.display_name());
        }
        Command::Watch { channel, realtime } => {
            watch(&context, channel, realtime).await?;
        }
        Command::Stats { dashboard } => {
            let stats = context.backend.dashboard.stats(&dashboard).await?;
            println!("Total calls:             {}", stats.total_calls);
            println!("Tokens:                  {}", stats.tokens);
            println!("Customer feedback calls: {}", stats.customer_feedback_calls);
            println!("Knowledge base items:    {}", stats.knowledge_base_items);
            println!("Agent call time:         {}", stats.agent_call_time);
            println!("Reschedules handled:     {}", stats.reschedules_handled);
        }
        Command::Docs(DocsCommand::List) => {
            for document in context.backend.documents.list().await? {
                println!("{}  {}", document.id, document.name);
            }
        }
        Command::Docs(DocsCommand::Show { doc_id }) => {
            let document = context.backend.documents.get(&doc_id).await?;
            println!("{}  {}", document.id, document.name);
            if let Some(created_at) = document.created_at {
                println!("Created: {}", format_time(created_at));
            }
        }
        Command::Docs(DocsCommand::Upload { path }) => {
            let document = context.backend.documents.upload(&path).await?;
            println!("Uploaded {} as document {}", path.display(), document.id);
        }
    }

    Ok(())
}

/// Follows one channel: immediate refresh, then the fixed-interval poll,
/// printing messages as they first appear. Ctrl-C stops the loop.
async fn watch(context: &AppContext, channel: String, realtime: bool) -> Result<()> {
    let auth = auth_service(context);
    if !auth.is_authenticated() {
        anyhow::bail!("not logged in; run `vh3 login` first");
    }
    let user = auth.me().await?;
    let mut sync = ChatSync::new(context.backend.chat.clone(), user.id);
    sync.load_initial().await;
    fail_on_sync_error(&sync)?;
    sync.select_channel(Some(channel)).await;
    fail_on_sync_error(&sync)?;
    tracing::debug!(
        channel = ?sync.selected_channel(),
        loading = sync.loading(),
        "watch loop starting"
    );

    let realtime_client = if realtime {
        Some(open_realtime(context, user.id).await)
    } else {
        None
    };

    let period = Duration::from_secs(context.config.sync.refresh_interval_secs);
    let mut seen: HashSet<i64> = HashSet::new();

    tokio::select! {
        _ = sync.run_poll(period, |state, error| {
            if let Some(error) = error {
                eprintln!("refresh failed: {error}");
                return true;
            }
            for message in &state.messages {
                if seen.insert(message.id) {
                    println!("{}", render_message(state, message, user.id));
                }
            }
            true
        }) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("watch interrupted");
        }
    }

    if let Some(client) = realtime_client {
        client.disconnect().await;
    }

    Ok(())
}

/// Opens the realtime socket and forwards its events to the log / stdout.
/// Connect failures are not fatal here; the client reconnects on its own
/// and the poll keeps the data fresh meanwhile.
async fn open_realtime(context: &AppContext, user_id: i64) -> RealtimeClient {
    let (client, mut events) = RealtimeClient::new(
        context.config.realtime.url_for_user(user_id),
        context.session.token(),
        &context.config.realtime,
    );

    if let Err(error) = client.connect().await {
        tracing::warn!(error = %error, "realtime connect failed, polling continues");
    }
    tracing::debug!(state = ?client.state().await, "realtime client state");

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                RealtimeEvent::Connected => tracing::info!("realtime channel connected"),
                RealtimeEvent::Disconnected => tracing::info!("realtime channel disconnected"),
                RealtimeEvent::Frame(value) => println!("realtime: {value}"),
                RealtimeEvent::Error(message) => tracing::warn!(%message, "realtime error"),
            }
        }
    });

    client
}

fn auth_service(context: &AppContext) -> AuthService<crate::backend::auth::AuthApi> {
    AuthService::new(context.backend.auth.clone(), context.session.clone())
}

/// Chat commands need the caller's user id, so each resolves the session
/// first and fails fast when not logged in.
async fn chat_sync(context: &AppContext) -> Result<ChatSync<crate::backend::chat::ChatApi>> {
    let auth = auth_service(context);
    if !auth.is_authenticated() {
        anyhow::bail!("not logged in; run `vh3 login` first");
    }
    let user = auth.me().await?;
    Ok(ChatSync::new(context.backend.chat.clone(), user.id))
}

fn fail_on_sync_error<S>(sync: &ChatSync<S>) -> Result<()> {
    match sync.error() {
        Some(error) => Err(anyhow::anyhow!("{error}")),
        None => Ok(()),
    }
}

fn render_message(state: &ChatState, message: &Message, user_id: i64) -> String {
    let sender = if message.is_outgoing(user_id) {
        "me".to_owned()
    } else {
        state
            .contact_username(message.sender_id)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("user {}", message.sender_id))
    };
    // incoming messages the caller has not read yet get a marker
    let unread = !message.is_outgoing(user_id) && !message.is_read_by(user_id);
    format!(
        "[{}] {}: {}{}",
        format_time(message.created_at),
        sender,
        message.text,
        if unread { " *" } else { "" }
    )
}

/// Timestamps come from the gateway as epoch milliseconds.
fn format_time(timestamp_ms: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(timestamp_ms) {
        Some(moment) => moment.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => timestamp_ms.to_string(),
    }
}
