use std::future::Future;
use teloxide::types::ChatId;
use tokio::time::{sleep, Duration};

/// Pause between consecutive sends, to respect transport rate limits.
const SEND_PACING: Duration = Duration::from_secs(1);

/// Outcome of one fan-out batch.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: Vec<ChatId>,
}

/// Delivers `text` to every subscriber, strictly sequentially in snapshot
/// order. A failed send is logged and recorded in the report; it never
/// aborts the rest of the batch.
pub async fn deliver_to_all<D, Fut, E>(
    text: &str,
    subscribers: &[ChatId],
    mut dispatch: D,
) -> DeliveryReport
where
    D: FnMut(ChatId, String) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    let mut report = DeliveryReport::default();
    for (index, &chat_id) in subscribers.iter().enumerate() {
        if index > 0 {
            sleep(SEND_PACING).await;
        }
        match dispatch(chat_id, text.to_owned()).await {
            Ok(()) => report.delivered += 1,
            Err(error) => {
                log::error!("Could not deliver to {chat_id}: {error}");
                report.failed.push(chat_id);
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::miette;
    use std::sync::{Arc, Mutex};

    #[tokio::test(start_paused = true)]
    async fn failing_recipients_do_not_abort_the_batch() {
        let subscribers: Vec<ChatId> = (1..=5).map(ChatId).collect();
        let attempted = Arc::new(Mutex::new(Vec::new()));

        let attempted_log = attempted.clone();
        let report = deliver_to_all("payload", &subscribers, move |chat_id, _text| {
            let attempted = attempted_log.clone();
            async move {
                attempted.lock().unwrap().push(chat_id);
                if chat_id.0 % 2 == 0 {
                    Err(miette!("dispatcher rejected the message"))
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert_eq!(report.delivered, 3);
        assert_eq!(report.failed, vec![ChatId(2), ChatId(4)]);
        // every subscriber was attempted, in snapshot order
        assert_eq!(*attempted.lock().unwrap(), subscribers);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_sends_are_paced() {
        let subscribers: Vec<ChatId> = (1..=3).map(ChatId).collect();
        let started = tokio::time::Instant::now();

        let report = deliver_to_all("payload", &subscribers, |_chat_id, _text| async {
            Ok::<(), miette::Report>(())
        })
        .await;

        assert_eq!(report.delivered, 3);
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_batch_reports_nothing() {
        let report = deliver_to_all("payload", &[], |_chat_id, _text| async {
            Ok::<(), miette::Report>(())
        })
        .await;

        assert_eq!(report, DeliveryReport::default());
    }
}
