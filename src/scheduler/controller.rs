use crate::scheduler::{daily_push, MyScheduler, SchedulerStorage};
use crate::subscribers::SubscriberStore;
use crate::telegram_bot::TelegramControlCommand;
use crate::{leetcode, options};
use miette::*;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use SchedulerControlCommand::*;

#[derive(Debug, Clone)]
pub enum SchedulerControlCommand {
    StartDailyPush,
}

pub(super) async fn handle(
    command: SchedulerControlCommand,
    options: Arc<options::Options>,
    sched_storage_rw: Arc<RwLock<SchedulerStorage>>,
    scheduler_rw: Arc<RwLock<MyScheduler>>,
    telegram_send: Arc<mpsc::UnboundedSender<TelegramControlCommand>>,
    lc_client: Arc<leetcode::Client>,
    store: Arc<RwLock<SubscriberStore>>,
) -> Result<()> {
    match command {
        StartDailyPush => daily_push::ensure_started(
            options,
            sched_storage_rw,
            scheduler_rw,
            telegram_send,
            lc_client,
            store,
        )
        .await
        .map(|_newly_scheduled| ()),
    }
}
