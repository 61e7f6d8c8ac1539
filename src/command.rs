use teloxide::{
    macros::BotCommands,
    payloads::SetMyCommandsSetters,
    prelude::Requester,
    types::{BotCommand, BotCommandScope, ChatId, Recipient},
    utils::command::BotCommands as _,
};

use crate::error::HandlerResult;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Open the menu")]
    Menu,
    #[command(description = "Show your profile")]
    Profile,
    #[command(description = "Buy a subscription")]
    Buy,
    #[command(description = "Take the IQ test")]
    Iqtest,
    #[command(description = "Admin panel")]
    Admin,
    #[command(description = "Broadcast a message to all users")]
    Broadcast,
    #[command(description = "User statistics")]
    Stats,
    #[command(description = "Recently active users")]
    Users,
    #[command(description = "Find a user: /find <id>")]
    Find(String),
    #[command(description = "Activate a subscription: /activate <id>")]
    Activate(String),
}

impl Command {
    /// Parses `/cmd`, `/cmd@bot` and `/cmd args` with the derived parser. A command
    /// without parameters still matches when followed by a payload (`/start <payload>`
    /// deep links), so on a parse error the bare command is tried once more.
    pub fn parse_text(text: &str, bot_username: &str) -> Option<Self> {
        let text = text.trim();
        match Self::parse(text, bot_username) {
            Ok(command) => Some(command),
            Err(_) => {
                let head = text.split_whitespace().next()?;
                Self::parse(head, bot_username).ok()
            }
        }
    }

    pub fn is_privileged(&self) -> bool {
        matches!(
            self,
            Command::Admin
                | Command::Broadcast
                | Command::Stats
                | Command::Users
                | Command::Find(_)
                | Command::Activate(_)
        )
    }

    pub fn user_commands() -> Vec<BotCommand> {
        Self::bot_commands()
            .into_iter()
            .filter(|entry| {
                let name = format!("/{}", entry.command.trim_start_matches('/'));
                Self::parse(&name, "").is_ok_and(|command| !command.is_privileged())
            })
            .collect()
    }

    pub fn admin_commands() -> Vec<BotCommand> {
        Self::bot_commands()
    }
}

/// Registers the command menu: user commands for everyone, the full list in the admin chat.
pub async fn setup_commands<R>(bot: &R, admin_chat: ChatId) -> HandlerResult<()>
where
    R: Requester,
    R::Err: std::error::Error + Send + Sync + 'static,
{
    bot.set_my_commands(Command::user_commands()).await?;
    bot.set_my_commands(Command::admin_commands())
        .scope(BotCommandScope::Chat {
            chat_id: Recipient::Id(admin_chat),
        })
        .await?;
    info!("Bot commands registered");
    Ok(())
}
