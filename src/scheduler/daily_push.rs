use crate::scheduler::{fanout, util, MyScheduler, SchedulerStorage};
use crate::subscribers::SubscriberStore;
use crate::telegram_bot::TelegramControlCommand;
use crate::{leetcode, messages, options};
use miette::{IntoDiagnostic, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// One firing of the daily push: fetch once, then fan out to the current
/// subscriber snapshot. An error here is reported by the caller and
/// leaves the job registered for the next cycle.
async fn daily_push(
    lc_client: Arc<leetcode::Client>,
    store: Arc<RwLock<SubscriberStore>>,
    telegram_send: Arc<mpsc::UnboundedSender<TelegramControlCommand>>,
) -> Result<()> {
    log::info!("Preparing the daily problem push");
    let problem = lc_client.fetch_today().await.into_diagnostic()?;

    let subscribers = store.read().await.all();
    if subscribers.is_empty() {
        log::debug!("No subscribers, nothing to push");
        return Ok(());
    }

    let text = messages::daily_problem(&problem);
    let report = fanout::deliver_to_all(&text, &subscribers, |chat_id, text| {
        let telegram_send = telegram_send.clone();
        async move { util::send_message(chat_id, text, telegram_send.as_ref()).await }
    })
    .await;

    log::info!(
        "Daily push finished: {} delivered, {} failed",
        report.delivered,
        report.failed.len()
    );
    Ok(())
}

/// Registers the daily push job unless one is already registered.
/// Returns whether a job was newly scheduled.
pub(super) async fn ensure_started(
    options: Arc<options::Options>,
    sched_storage_rw: Arc<RwLock<SchedulerStorage>>,
    scheduler_rw: Arc<RwLock<MyScheduler>>,
    telegram_send: Arc<mpsc::UnboundedSender<TelegramControlCommand>>,
    lc_client: Arc<leetcode::Client>,
    store: Arc<RwLock<SubscriberStore>>,
) -> Result<bool> {
    // the storage lock is held across check and insert, so concurrent
    // activation requests collapse into a single registered job
    let mut sched_storage = sched_storage_rw.as_ref().write().await;
    if sched_storage.daily_push_job_id.is_some() {
        log::debug!("Daily push is already scheduled");
        return Ok(false);
    }

    let mut scheduler = scheduler_rw.as_ref().write().await;
    let job_id = util::register_to_schedule(&options.push_cron, &mut scheduler, move |_id| {
        let (lc_client, store, telegram_send) =
            (lc_client.clone(), store.clone(), telegram_send.clone());
        tokio::spawn(async move {
            if let Err(report) = daily_push(lc_client, store, telegram_send).await {
                log::error!("Daily push failed, job stays registered.\n{report:?}");
            }
        });
    })
    .await?;

    sched_storage.daily_push_job_id = Some(job_id);
    log::info!("Scheduled the daily push ({})", options.push_cron);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn test_options(dir: &tempfile::TempDir) -> Options {
        Options {
            verbose: 0,
            push_cron: "0 0 9 * * * *".to_owned(),
            data_file: dir.path().join("subscribers.json").display().to_string(),
        }
    }

    #[tokio::test]
    async fn activation_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let options = Arc::new(test_options(&dir));

        let (scheduler, sched_service) = MyScheduler::launch(tokio::time::sleep);
        tokio::spawn(sched_service);
        let scheduler_arc = Arc::new(RwLock::new(scheduler));
        let storage_arc = Arc::new(RwLock::new(SchedulerStorage::default()));
        let (telegram_send, _telegram_recv) = mpsc::unbounded_channel();
        let telegram_send_arc = Arc::new(telegram_send);
        let lc_client = Arc::new(leetcode::Client::new().expect("client"));
        let store = Arc::new(RwLock::new(SubscriberStore::load(
            dir.path().join("subscribers.json"),
        )));

        let first = ensure_started(
            options.clone(),
            storage_arc.clone(),
            scheduler_arc.clone(),
            telegram_send_arc.clone(),
            lc_client.clone(),
            store.clone(),
        )
        .await
        .expect("first activation");
        let second = ensure_started(
            options,
            storage_arc.clone(),
            scheduler_arc,
            telegram_send_arc,
            lc_client,
            store,
        )
        .await
        .expect("second activation");

        assert!(first);
        assert!(!second);
        assert!(storage_arc.read().await.daily_push_job_id.is_some());
    }
}
