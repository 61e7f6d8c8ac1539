use teloxide::types::{ChatId, ParseMode, Recipient};

use super::{
    menu,
    reply::{reply, ACCESS_DENIED, GENERIC_FAILURE},
};
use crate::{
    command::Command,
    error::HandlerResult,
    event::IncomingEvent,
    service::{ActivationOutcome, AdminCapability, AdminError, DialogState, Outgoing},
    state::AppState,
};

const RECENT_USERS_LIMIT: u32 = 20;

pub async fn handle_command(state: &AppState, event: &IncomingEvent, command: &Command) -> HandlerResult<()> {
    match command {
        Command::Start | Command::Menu => menu::show_main_menu(state, event).await,
        Command::Profile => menu::show_profile(state, event).await,
        Command::Buy => menu::show_payment(state, event).await,
        Command::Iqtest => menu::show_iq_test(state, event).await,
        Command::Admin => handle_admin_panel(state, event).await,
        Command::Broadcast => handle_broadcast(state, event).await,
        Command::Stats => handle_stats(state, event).await,
        Command::Users => handle_users(state, event).await,
        Command::Find(args) => handle_find(state, event, args).await,
        Command::Activate(args) => handle_activate(state, event, args).await,
    }
}

/// Replies with the denial message for anyone but the administrator.
async fn authorize(state: &AppState, event: &IncomingEvent) -> HandlerResult<Option<AdminCapability>> {
    match state.admin.authorize(event.user_id) {
        Ok(cap) => Ok(Some(cap)),
        Err(_) => {
            reply(state, event, Outgoing::text(ACCESS_DENIED)).await?;
            Ok(None)
        }
    }
}

/// Exactly one whitespace separated argument.
fn single_argument(args: &str) -> Option<&str> {
    let mut parts = args.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(arg), None) => Some(arg),
        _ => None,
    }
}

async fn handle_admin_panel(state: &AppState, event: &IncomingEvent) -> HandlerResult<()> {
    let Some(cap) = authorize(state, event).await? else {
        return Ok(());
    };

    let stats = match state.admin.stats(&cap).await {
        Ok(stats) => stats,
        Err(e) => {
            error!("Failed to load admin panel stats: {}", e);
            return reply(state, event, Outgoing::text(GENERIC_FAILURE)).await;
        }
    };

    let text = format!(
        "🛠 <b>Admin panel</b>\n\n\
        👥 Users: {}\n\
        🔄 Total uses left: {}\n\
        💸 Subscribers: {}\n\n\
        ✏️ To activate a subscription, send: /activate ID",
        stats.total_users, stats.total_uses_left, stats.subscribers
    );
    reply(state, event, Outgoing::html(text)).await?;
    info!("Admin {} opened the admin panel", cap.admin_id());
    Ok(())
}

async fn handle_broadcast(state: &AppState, event: &IncomingEvent) -> HandlerResult<()> {
    let Some(cap) = authorize(state, event).await? else {
        return Ok(());
    };

    state.dialogues.set(event.user_id, DialogState::AwaitingBroadcastText);
    reply(state, event, Outgoing::text("✏️ Enter the broadcast text:")).await?;
    info!("Admin {} started a broadcast", cap.admin_id());
    Ok(())
}

async fn handle_stats(state: &AppState, event: &IncomingEvent) -> HandlerResult<()> {
    let Some(cap) = authorize(state, event).await? else {
        return Ok(());
    };

    match state.admin.stats(&cap).await {
        Ok(stats) => {
            let text = format!(
                "📊 Statistics:\n👥 Total users: {}\n💸 Subscribed: {}\n📈 Active users: {}",
                stats.total_users, stats.subscribers, stats.active_users
            );
            reply(state, event, Outgoing::text(text)).await
        }
        Err(e) => {
            error!("Failed to load stats: {}", e);
            reply(state, event, Outgoing::text(GENERIC_FAILURE)).await
        }
    }
}

async fn handle_users(state: &AppState, event: &IncomingEvent) -> HandlerResult<()> {
    let Some(cap) = authorize(state, event).await? else {
        return Ok(());
    };

    let accounts = match state.admin.recent_users(&cap, RECENT_USERS_LIMIT).await {
        Ok(accounts) => accounts,
        Err(e) => {
            error!("Failed to list users: {}", e);
            return reply(state, event, Outgoing::text("❌ Failed to load the user list.")).await;
        }
    };

    if accounts.is_empty() {
        return reply(state, event, Outgoing::text("❌ No users yet.")).await;
    }

    let mut text = String::from("🧾 Recent users:\n\n");
    for account in &accounts {
        text.push_str(&format!(
            "🆔 {} · uses left: {} · active: {}\n",
            account.id, account.uses_left, account.last_active
        ));
    }
    reply(state, event, Outgoing::text(text)).await
}

async fn handle_find(state: &AppState, event: &IncomingEvent, args: &str) -> HandlerResult<()> {
    let Some(cap) = authorize(state, event).await? else {
        return Ok(());
    };
    let Some(raw_id) = single_argument(args) else {
        return reply(state, event, Outgoing::text("⚠️ Usage: /find ID")).await;
    };

    let text = match state.admin.find_user(&cap, raw_id).await {
        Ok(Some(account)) => format!("👤 User {} found. Uses left: {}", account.id, account.uses_left),
        Ok(None) => "❌ User not found.".to_string(),
        Err(e) => admin_error_text(&e, "❌ Failed to look up the user."),
    };
    reply(state, event, Outgoing::text(text)).await
}

async fn handle_activate(state: &AppState, event: &IncomingEvent, args: &str) -> HandlerResult<()> {
    let Some(cap) = authorize(state, event).await? else {
        return Ok(());
    };
    let Some(raw_id) = single_argument(args) else {
        return reply(state, event, Outgoing::text("⚠️ Usage: /activate ID")).await;
    };

    match state.admin.activate(&cap, raw_id).await {
        Ok(ActivationOutcome::Activated(user_id)) => {
            reply(
                state,
                event,
                Outgoing::text(format!("✅ Subscription activated for user {}.", user_id)),
            )
            .await?;
            state
                .notifier
                .notify_user(
                    Recipient::Id(ChatId::from(user_id)),
                    "🎉 Your subscription is active! You now have unlimited access.",
                )
                .await;
            Ok(())
        }
        Ok(ActivationOutcome::NotFound(user_id)) => {
            reply(
                state,
                event,
                Outgoing::text(format!("❌ User {} not found in the database.", user_id)),
            )
            .await
        }
        Err(e) => {
            let text = admin_error_text(&e, "❌ Failed to activate the subscription.");
            reply(state, event, Outgoing::text(text)).await
        }
    }
}

fn admin_error_text(error: &AdminError, storage_failure: &str) -> String {
    match error {
        AdminError::InvalidUserId(raw) => {
            warn!("Admin sent an invalid user id: {:?}", raw);
            "❌ User ID must be a number.".to_string()
        }
        AdminError::Unauthorized => ACCESS_DENIED.to_string(),
        AdminError::Storage(e) => {
            error!("Admin command failed: {}", e);
            storage_failure.to_string()
        }
    }
}
