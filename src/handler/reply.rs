use teloxide::types::{ParseMode, Recipient};

use crate::{error::HandlerResult, event::IncomingEvent, service::Outgoing, state::AppState};

pub const GENERIC_FAILURE: &str = "❌ Something went wrong. Please try again later.";
pub const ACCESS_DENIED: &str = "🚫 You do not have access to this command.";

pub async fn reply(state: &AppState, event: &IncomingEvent, message: Outgoing) -> HandlerResult<()> {
    state.messenger.send_text(event.reply_to(), message).await?;
    Ok(())
}

/// Sends a picture from the assets directory with `caption`. A missing file or a
/// failed upload degrades to a text message with the same caption.
pub async fn send_card(
    state: &AppState,
    to: Recipient,
    asset: &str,
    caption: &str,
    parse_mode: Option<ParseMode>,
) -> HandlerResult<()> {
    let path = state.assets_dir.join(asset);

    let notice = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        match state.messenger.send_photo(to.clone(), &path, caption, parse_mode).await {
            Ok(_) => return Ok(()),
            Err(e) => {
                error!("Failed to send {} to {:?}: {}", asset, to, e);
                "🖼️ Image unavailable."
            }
        }
    } else {
        warn!("Asset {} not found, sending text only", path.display());
        "🖼️ Image not found."
    };

    let mut message = Outgoing::text(format!("{} {}", notice, caption));
    message.parse_mode = parse_mode;
    state.messenger.send_text(to, message).await?;
    Ok(())
}
