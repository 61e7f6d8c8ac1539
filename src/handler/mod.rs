mod command;
mod keyboard;
mod menu;
mod message;
mod reply;

use keyboard::MenuButton;

use teloxide::{
    dispatching::{UpdateFilterExt, UpdateHandler},
    types::{Message, Update},
};

use crate::{
    error::HandlerResult,
    event::{EventKind, IncomingEvent},
    service::{DialogState, Outgoing},
    state::AppState,
};

pub fn get_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    Update::filter_message().endpoint(handle_message)
}

async fn handle_message(state: AppState, message: Message) -> HandlerResult<()> {
    let Some(event) = IncomingEvent::from_message(&message, &state.bot_username) else {
        return Ok(());
    };
    dispatch(&state, event).await
}

/// Single entry point for both transports. Commands win over dialog state;
/// everything else is routed by the user's current state.
pub async fn dispatch(state: &AppState, event: IncomingEvent) -> HandlerResult<()> {
    let privileged = matches!(&event.kind, EventKind::Command(command) if command.is_privileged());
    if !privileged {
        if let Err(e) = state.users.ensure_user(event.user_id).await {
            error!("Failed to register user {}: {}", event.user_id, e);
            // a pending prompt must not outlive the failed interaction
            state.dialogues.reset(event.user_id);
            return reply::reply(state, &event, Outgoing::text(reply::GENERIC_FAILURE)).await;
        }
    }

    if let EventKind::Command(command) = &event.kind {
        return command::handle_command(state, &event, command).await;
    }

    let current = state.dialogues.get(event.user_id);
    match (current, &event.kind) {
        (DialogState::AwaitingBroadcastText, _) => message::handle_broadcast_text(state, &event).await,
        (DialogState::AwaitingPhoto, EventKind::Photo { file_id }) => {
            message::handle_photo(state, &event, file_id).await
        }
        (_, EventKind::Text(text)) => match MenuButton::from_label(text) {
            Some(button) => menu::handle_button(state, &event, button).await,
            None => {
                debug!("Ignoring text from user {} in state {:?}", event.user_id, current);
                Ok(())
            }
        },
        (_, kind) => {
            debug!("Ignoring {:?} from user {} in state {:?}", kind, event.user_id, current);
            Ok(())
        }
    }
}
