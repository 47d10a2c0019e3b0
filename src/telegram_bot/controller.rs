use miette::{miette, Result};
use teloxide::prelude::*;
use teloxide::RequestError;
use tokio::sync::oneshot;

use TelegramControlCommand::*;
#[derive(Debug)]
pub enum TelegramControlCommand {
    /// Send `text` to `chat_id` and report the outcome back through
    /// `return_send`, so the fan-out can account per-recipient results.
    SendMessage {
        chat_id: ChatId,
        text: String,
        return_send: oneshot::Sender<Result<(), RequestError>>,
    },
}

pub async fn handle(command: TelegramControlCommand, bot: Bot) -> Result<()> {
    match command {
        SendMessage {
            chat_id,
            text,
            return_send,
        } => {
            let outcome = bot.send_message(chat_id, text).await.map(|_| ());
            return_send
                .send(outcome)
                .map_err(|_| miette!("Could not report send outcome for {:?}", chat_id))
        }
    }
}
