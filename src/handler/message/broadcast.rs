use crate::{
    error::HandlerResult,
    event::{EventKind, IncomingEvent},
    handler::reply::reply,
    service::{BroadcastError, DialogState, Outgoing},
    state::AppState,
};

const EMPTY_TEXT: &str = "⚠️ The broadcast text cannot be empty. Send /broadcast to try again.";
const BROADCAST_FAILED: &str = "❌ The broadcast could not be carried out.";

/// The admin's reply to `/broadcast`. Anything but non-empty text is rejected;
/// the state is cleared either way.
pub async fn handle_broadcast_text(state: &AppState, event: &IncomingEvent) -> HandlerResult<()> {
    let Some(_step) = state.dialogues.acquire(event.user_id, DialogState::AwaitingBroadcastText) else {
        return Ok(());
    };
    if !state.admin.is_admin(event.user_id) {
        return Ok(());
    }

    let text = match &event.kind {
        EventKind::Text(text) => text.as_str(),
        _ => "",
    };

    match state.broadcast.run(text).await {
        Ok(report) => {
            info!("Admin {} broadcast to {} users", event.user_id, report.total());
            let summary = format!(
                "✅ Broadcast finished\nSent: {}\nFailed: {}",
                report.success, report.failure
            );
            reply(state, event, Outgoing::text(summary)).await
        }
        Err(BroadcastError::EmptyText) => {
            warn!("Admin {} sent an empty broadcast", event.user_id);
            reply(state, event, Outgoing::text(EMPTY_TEXT)).await
        }
        Err(e) => {
            error!("Broadcast failed: {}", e);
            reply(state, event, Outgoing::text(BROADCAST_FAILED)).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create_test_state, ADMIN, CHANNEL};
    use teloxide::types::{ChatId, UserId};

    fn admin_event(kind: EventKind) -> IncomingEvent {
        IncomingEvent {
            user_id: ADMIN,
            chat_id: ChatId::from(ADMIN),
            kind,
        }
    }

    #[tokio::test]
    async fn test_broadcast_reports_counts() {
        let (state, messenger, _) = create_test_state().await;
        for id in 1..=4 {
            state.users.ensure_user(UserId(id)).await.unwrap();
        }
        messenger.fail_for(ChatId(2));
        state.dialogues.set(ADMIN, DialogState::AwaitingBroadcastText);

        handle_broadcast_text(&state, &admin_event(EventKind::Text("Big news".to_string())))
            .await
            .unwrap();

        assert_eq!(state.dialogues.get(ADMIN), DialogState::Idle);
        assert_eq!(
            messenger.last_text_to(ChatId::from(ADMIN)).unwrap(),
            "✅ Broadcast finished\nSent: 3\nFailed: 1"
        );
        assert_eq!(messenger.texts_to(ChatId(1)), vec!["Big news".to_string()]);
        assert_eq!(
            messenger.texts_to(CHANNEL),
            vec!["📢 New broadcast: Big news".to_string()]
        );
    }

    #[tokio::test]
    async fn test_non_text_is_rejected() {
        let (state, messenger, _) = create_test_state().await;
        state.users.ensure_user(UserId(1)).await.unwrap();
        state.dialogues.set(ADMIN, DialogState::AwaitingBroadcastText);

        let photo = EventKind::Photo {
            file_id: "photo".to_string(),
        };
        handle_broadcast_text(&state, &admin_event(photo)).await.unwrap();

        assert_eq!(state.dialogues.get(ADMIN), DialogState::Idle);
        assert_eq!(messenger.last_text_to(ChatId::from(ADMIN)).unwrap(), EMPTY_TEXT);
        assert!(messenger.texts_to(ChatId(1)).is_empty());
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let (state, messenger, _) = create_test_state().await;
        state.dialogues.set(ADMIN, DialogState::AwaitingBroadcastText);

        handle_broadcast_text(&state, &admin_event(EventKind::Text("  ".to_string())))
            .await
            .unwrap();

        assert_eq!(state.dialogues.get(ADMIN), DialogState::Idle);
        assert_eq!(messenger.sent().len(), 1);
    }
}
