use crate::scheduler::MyScheduler;
use crate::telegram_bot::TelegramControlCommand;
use async_cron_scheduler::{Job, JobId};
use miette::{miette, IntoDiagnostic, Result};
use teloxide::types::ChatId;
use tokio::sync::{mpsc, oneshot};

pub(super) async fn register_to_schedule(
    cron_str: &str,
    scheduler: &mut MyScheduler,
    command: impl Fn(JobId) + Send + Sync + 'static,
) -> Result<JobId> {
    let job = Job::cron(cron_str).into_diagnostic()?;
    Ok(scheduler.insert(job, command))
}

/// Sends one message through the telegram subsystem and waits for the
/// outcome of the actual send.
pub(super) async fn send_message(
    chat_id: ChatId,
    text: String,
    telegram_send: &mpsc::UnboundedSender<TelegramControlCommand>,
) -> Result<()> {
    let (send, recv) = oneshot::channel();
    telegram_send
        .send(TelegramControlCommand::SendMessage {
            chat_id,
            text,
            return_send: send,
        })
        .map_err(|_| miette!("Could not queue message for {:?}", chat_id))?;
    recv.await.into_diagnostic()?.into_diagnostic()
}
