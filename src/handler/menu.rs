use teloxide::types::ParseMode;

use super::{
    keyboard::{get_main_menu_keyboard, MenuButton},
    reply::{reply, send_card, GENERIC_FAILURE},
};
use crate::{
    error::HandlerResult,
    event::IncomingEvent,
    service::{DialogState, Outgoing},
    state::AppState,
};

const PAYMENT_TEXT: &str = "💳 The subscription costs $2.5 via CryptoBot:\n\n\
<a href='https://t.me/send?start=IVncR7b5DNSe'>🔗 Pay</a>\n\n\
After payment the administrator activates the subscription manually.\n\
If you have paid, let us know in the <a href='https://t.me/calloritpay'>support channel</a>.";

const TRAINING_TEXT: &str = "🏋️‍♀️ <b>Useful programs:</b>\n\n\
- <a href='https://t.me/Itmarket1_bot?start=good_82171'>Nutrition programs</a>\n\
- <a href='https://t.me/Itmarket1_bot?start=good_82170'>Workouts without equipment (course)</a>";

const IQ_TEST_TEXT: &str = "🧠 Take our IQ test and find out your score!\n\n\
<a href='https://t.me/iqmanager1_bot'>🔗 Go to the IQ test</a>";

const PHOTO_PROMPT: &str = "📸 Please send a photo of your dish.";

pub async fn handle_button(state: &AppState, event: &IncomingEvent, button: MenuButton) -> HandlerResult<()> {
    match button {
        MenuButton::CaloriesFromPhoto => prompt_photo(state, event, "photocall.png").await,
        MenuButton::TakePhoto => prompt_photo(state, event, "sendphoto.png").await,
        MenuButton::TrainingPrograms => show_training(state, event).await,
        MenuButton::HowToUse => show_help(state, event).await,
        MenuButton::Subscription => show_payment(state, event).await,
        MenuButton::Profile => show_profile(state, event).await,
        MenuButton::IqTest => show_iq_test(state, event).await,
    }
}

/// `/start` and `/menu`: leaves whatever step the user was in.
pub async fn show_main_menu(state: &AppState, event: &IncomingEvent) -> HandlerResult<()> {
    state.dialogues.reset(event.user_id);
    reply(
        state,
        event,
        Outgoing::text("👋 Welcome! Choose an action:").with_keyboard(get_main_menu_keyboard()),
    )
    .await?;
    info!("User {} opened the menu", event.user_id);
    Ok(())
}

pub async fn show_profile(state: &AppState, event: &IncomingEvent) -> HandlerResult<()> {
    let uses_left = match state.users.get_uses_left(event.user_id).await {
        Ok(uses_left) => uses_left,
        Err(e) => {
            error!("Failed to load the profile of user {}: {}", event.user_id, e);
            return reply(state, event, Outgoing::text(GENERIC_FAILURE)).await;
        }
    };

    let caption = format!("👤 Profile:\nID: {}\nUses left: {}", event.user_id, uses_left);
    send_card(state, event.reply_to(), "profile.png", &caption, None).await
}

pub async fn show_payment(state: &AppState, event: &IncomingEvent) -> HandlerResult<()> {
    send_card(state, event.reply_to(), "pay.png", PAYMENT_TEXT, Some(ParseMode::Html)).await?;
    info!("User {} asked for payment details", event.user_id);
    Ok(())
}

pub async fn show_iq_test(state: &AppState, event: &IncomingEvent) -> HandlerResult<()> {
    send_card(state, event.reply_to(), "iq.png", IQ_TEST_TEXT, Some(ParseMode::Html)).await
}

async fn show_help(state: &AppState, event: &IncomingEvent) -> HandlerResult<()> {
    let caption = format!(
        "ℹ️ <b>How to use the bot</b>\n\n\
        1. Tap \"{}\"\n\
        2. Send a photo of your food\n\
        3. Get an approximate calorie count and macros.\n\n\
        🔁 {} uses are free. A subscription unlocks unlimited access.",
        MenuButton::CaloriesFromPhoto.label(),
        state.users.quota().free_uses_limit
    );
    send_card(state, event.reply_to(), "help.png", &caption, Some(ParseMode::Html)).await
}

async fn show_training(state: &AppState, event: &IncomingEvent) -> HandlerResult<()> {
    send_card(state, event.reply_to(), "programm.png", TRAINING_TEXT, Some(ParseMode::Html)).await
}

async fn prompt_photo(state: &AppState, event: &IncomingEvent, asset: &str) -> HandlerResult<()> {
    send_card(state, event.reply_to(), asset, PHOTO_PROMPT, None).await?;
    state.dialogues.set(event.user_id, DialogState::AwaitingPhoto);
    info!("User {} was asked for a photo", event.user_id);
    Ok(())
}
