use crate::{
    error::{BotError, HandlerResult},
    event::IncomingEvent,
    handler::reply::{reply, GENERIC_FAILURE},
    service::{DialogState, Outgoing, QuotaDecision},
    state::AppState,
};

const QUOTA_EXHAUSTED: &str = "🔐 You have used up your free analyses. Get a subscription to continue.";
const PROCESSING: &str = "⏳ Processing your photo, please wait...";
const ANALYSIS_FAILED: &str = "❌ Failed to process the image. Please try again later.";

/// Quota-gated analysis of the photo a user sent after being prompted.
/// The user is back in `Idle` when this returns, whatever happened.
pub async fn handle_photo(state: &AppState, event: &IncomingEvent, file_id: &str) -> HandlerResult<()> {
    let Some(_step) = state.dialogues.acquire(event.user_id, DialogState::AwaitingPhoto) else {
        return Ok(());
    };

    let permit = match state.quota.try_consume(event.user_id).await {
        Ok(QuotaDecision::Allowed(permit)) => permit,
        Ok(QuotaDecision::Denied { uses_left }) => {
            debug!("Photo of user {} rejected, {} uses left", event.user_id, uses_left);
            return reply(state, event, Outgoing::text(QUOTA_EXHAUSTED)).await;
        }
        Err(e) => {
            error!("Failed to check the quota of user {}: {}", event.user_id, e);
            return reply(state, event, Outgoing::text(GENERIC_FAILURE)).await;
        }
    };

    let processing = match state.messenger.send_text(event.reply_to(), Outgoing::text(PROCESSING)).await {
        Ok(message_id) => Some(message_id),
        Err(e) => {
            warn!("Failed to send the processing notice to {}: {}", event.user_id, e);
            None
        }
    };

    let result = analyze(state, file_id).await;

    if let Some(message_id) = processing {
        if let Err(e) = state.messenger.delete_message(event.reply_to(), message_id).await {
            warn!("Failed to delete the processing notice for {}: {}", event.user_id, e);
        }
    }

    let answer = match result {
        Ok(answer) => answer,
        Err(e) => {
            // the permit is dropped unused, the attempt costs nothing
            error!("Analysis failed for user {}: {}", event.user_id, e);
            return reply(state, event, Outgoing::text(ANALYSIS_FAILED)).await;
        }
    };

    reply(state, event, Outgoing::text(format!("📊 Result:\n{}", answer))).await?;
    info!("User {} received an analysis", event.user_id);

    state
        .notifier
        .notify_channel("📷 A user uploaded a food photo. Calories and macros calculated.")
        .await;

    if let Err(e) = state.quota.commit(permit).await {
        error!("Failed to consume a use of user {}: {}", event.user_id, e);
    }

    Ok(())
}

async fn analyze(state: &AppState, file_id: &str) -> Result<String, BotError> {
    let image = state.messenger.download_photo(file_id).await?;
    let answer = state.analyzer.analyze(&image).await?;
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::EventKind,
        testing::{create_test_state, create_test_state_with, FakeAnalyzer, Sent, ANSWER, CHANNEL},
    };
    use teloxide::types::{ChatId, UserId};

    const USER: UserId = UserId(5);

    fn photo_event() -> IncomingEvent {
        IncomingEvent {
            user_id: USER,
            chat_id: ChatId(5),
            kind: EventKind::Photo {
                file_id: "photo-1".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_successful_analysis_consumes_one_use() {
        let (state, messenger, analyzer) = create_test_state().await;
        state.users.ensure_user(USER).await.unwrap();
        state.dialogues.set(USER, DialogState::AwaitingPhoto);

        handle_photo(&state, &photo_event(), "photo-1").await.unwrap();

        assert_eq!(analyzer.calls(), 1);
        assert_eq!(state.users.get_uses_left(USER).await.unwrap(), 9);
        assert_eq!(state.dialogues.get(USER), DialogState::Idle);
        assert_eq!(
            messenger.texts_to(ChatId(5)),
            vec![PROCESSING.to_string(), format!("📊 Result:\n{}", ANSWER)]
        );
        assert_eq!(messenger.deleted_count(), 1);
        assert_eq!(messenger.texts_to(CHANNEL).len(), 1);
        assert!(!messenger.texts_to(CHANNEL)[0].contains('5'));
    }

    #[tokio::test]
    async fn test_failed_analysis_keeps_quota() {
        let (state, messenger, _) = create_test_state_with(FakeAnalyzer::failing()).await;
        state.users.ensure_user(USER).await.unwrap();
        state.dialogues.set(USER, DialogState::AwaitingPhoto);

        handle_photo(&state, &photo_event(), "photo-1").await.unwrap();

        assert_eq!(state.users.get_uses_left(USER).await.unwrap(), 10);
        assert_eq!(state.dialogues.get(USER), DialogState::Idle);
        assert_eq!(messenger.last_text_to(ChatId(5)).unwrap(), ANALYSIS_FAILED);
        assert_eq!(messenger.deleted_count(), 1);
        assert!(messenger.texts_to(CHANNEL).is_empty());
    }

    #[tokio::test]
    async fn test_failed_download_keeps_quota() {
        let (state, messenger, analyzer) = create_test_state().await;
        messenger.fail_downloads();
        state.users.ensure_user(USER).await.unwrap();
        state.dialogues.set(USER, DialogState::AwaitingPhoto);

        handle_photo(&state, &photo_event(), "photo-1").await.unwrap();

        assert_eq!(analyzer.calls(), 0);
        assert_eq!(state.users.get_uses_left(USER).await.unwrap(), 10);
        assert_eq!(state.dialogues.get(USER), DialogState::Idle);
        assert_eq!(messenger.last_text_to(ChatId(5)).unwrap(), ANALYSIS_FAILED);
    }

    #[tokio::test]
    async fn test_exhausted_quota_is_denied() {
        let (state, messenger, analyzer) = create_test_state().await;
        state.users.ensure_user(USER).await.unwrap();
        for _ in 0..10 {
            state.users.decrement_use(USER).await.unwrap();
        }
        state.dialogues.set(USER, DialogState::AwaitingPhoto);

        handle_photo(&state, &photo_event(), "photo-1").await.unwrap();

        assert_eq!(analyzer.calls(), 0);
        assert_eq!(state.users.get_uses_left(USER).await.unwrap(), 0);
        assert_eq!(state.dialogues.get(USER), DialogState::Idle);
        assert!(matches!(
            messenger.sent().as_slice(),
            [Sent::Text { text, .. }] if text == QUOTA_EXHAUSTED
        ));
    }

    #[tokio::test]
    async fn test_photo_outside_awaiting_state_is_ignored() {
        let (state, messenger, analyzer) = create_test_state().await;
        state.users.ensure_user(USER).await.unwrap();

        handle_photo(&state, &photo_event(), "photo-1").await.unwrap();

        assert_eq!(analyzer.calls(), 0);
        assert!(messenger.sent().is_empty());
        assert_eq!(state.users.get_uses_left(USER).await.unwrap(), 10);
    }
}
