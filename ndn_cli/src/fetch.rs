use crate::config::FetchCommand;
use anyhow::anyhow;
use libndn::{CallbackError, Data, EntryId, Interest, InterestFilter, Name};
use log::*;
use ndn_face::{FaceConfig, LoopbackTransport, Node, RegistrationOptions, ThreadsafeFace};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    pub expressed: usize,
    pub satisfied: usize,
    pub timed_out: usize,
    pub still_pending: usize,
}

impl Display for FetchSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} interests expressed. {} satisfied, {} timed out, {} still pending.",
            self.expressed, self.satisfied, self.timed_out, self.still_pending
        )
    }
}

/// Start a producer face for `cmd.prefix` on its own loop thread, then express `cmd.count` interests from a consumer
/// face and drive the consumer's loop until every interest has been answered or has timed out.
pub async fn run_fetch(cmd: FetchCommand, config: FaceConfig) -> Result<FetchSummary, anyhow::Error> {
    let (consumer_transport, producer_transport) = LoopbackTransport::pair();

    let (producer, producer_loop) = ThreadsafeFace::new(producer_transport, config.clone());
    let producer_thread = producer_loop.spawn_thread()?;
    let registration_failed = Arc::new(AtomicBool::new(false));
    let failed = Arc::clone(&registration_failed);
    producer.register_prefix(
        &cmd.prefix,
        Some(answer_interests(cmd.drop_every)),
        Box::new(move |prefix: &Name| {
            error!("Could not register {prefix}");
            failed.store(true, Ordering::SeqCst);
            Ok(())
        }),
        RegistrationOptions::default(),
    )?;
    // The registration must be in place before the first interest reaches the producer
    producer.flush().await?;
    if registration_failed.load(Ordering::SeqCst) {
        producer.shutdown();
        return Err(anyhow!("Prefix registration failed for {}", cmd.prefix));
    }
    info!("Producer registered {}", cmd.prefix);

    let (consumer, mut consumer_loop) = ThreadsafeFace::new(consumer_transport, config);
    let satisfied = Arc::new(AtomicUsize::new(0));
    let timed_out = Arc::new(AtomicUsize::new(0));
    let lifetime = Duration::from_millis(cmd.lifetime_ms);
    for n in 0..cmd.count {
        let name = cmd.prefix.clone().append(n.to_string().as_str());
        let interest = Interest::new(name).with_interest_lifetime(lifetime);
        let on_data_count = Arc::clone(&satisfied);
        let on_timeout_count = Arc::clone(&timed_out);
        let id = consumer.express_interest(
            &interest,
            Box::new(move |interest: &Interest, data: &Data| {
                println!("{} -> {}", interest.name(), String::from_utf8_lossy(data.content()));
                on_data_count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
            Some(Box::new(move |interest: &Interest| {
                println!("{} timed out", interest.name());
                on_timeout_count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })),
        )?;
        debug!("Expressed interest {id} for {}", interest.name());
    }

    let expressed = cmd.count;
    let (data_seen, timeouts_seen) = (Arc::clone(&satisfied), Arc::clone(&timed_out));
    consumer.stop_when(move || {
        Ok(data_seen.load(Ordering::SeqCst) + timeouts_seen.load(Ordering::SeqCst) >= expressed)
    })?;
    let exit = consumer_loop.run().await;
    debug!("Consumer loop finished: {exit:?}");
    consumer.clear_stop_when()?;

    let (still_pending, exit) = tokio::join!(
        async {
            let count = consumer.pending_interest_count().await;
            consumer.shutdown();
            count
        },
        consumer_loop.run()
    );
    debug!("Consumer loop finished: {exit:?}");
    producer.shutdown();
    let joined = tokio::task::spawn_blocking(move || producer_thread.join()).await?;
    match joined {
        Ok(exit) => {
            let exit = exit?;
            debug!("Producer loop finished: {exit:?}");
        }
        Err(_) => return Err(anyhow!("The producer loop thread panicked")),
    }

    Ok(FetchSummary {
        expressed,
        satisfied: satisfied.load(Ordering::SeqCst),
        timed_out: timed_out.load(Ordering::SeqCst),
        still_pending: still_pending?,
    })
}

/// Answer every interest with a short text payload, skipping every `drop_every`-th one.
fn answer_interests(drop_every: Option<usize>) -> ndn_face::OnInterest {
    let received = AtomicUsize::new(0);
    Box::new(move |_: &Name, interest: &Interest, node: &mut Node, _: EntryId, _: &InterestFilter| {
        let n = received.fetch_add(1, Ordering::SeqCst) + 1;
        if drop_every.is_some_and(|k| k > 0 && n % k == 0) {
            debug!("Ignoring interest #{n} for {}", interest.name());
            return Ok(());
        }
        let data = Data::new(interest.name().clone(), format!("Data #{n}").into_bytes());
        node.put_data(&data).map_err(|e| CallbackError::Other(Box::new(e)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch(count: usize, drop_every: Option<usize>) -> FetchCommand {
        FetchCommand { prefix: "/test/fetch".parse().unwrap(), count, lifetime_ms: 300, drop_every }
    }

    fn fast_config() -> FaceConfig {
        FaceConfig { stop_when_interval_ms: 10, ..FaceConfig::default() }
    }

    #[tokio::test]
    async fn every_interest_is_answered() {
        let _ = env_logger::try_init();
        let summary = run_fetch(fetch(4, None), fast_config()).await.unwrap();
        assert_eq!(summary, FetchSummary { expressed: 4, satisfied: 4, timed_out: 0, still_pending: 0 });
    }

    #[tokio::test]
    async fn dropped_interests_time_out() {
        let summary = run_fetch(fetch(6, Some(3)), fast_config()).await.unwrap();
        assert_eq!(summary, FetchSummary { expressed: 6, satisfied: 4, timed_out: 2, still_pending: 0 });
    }
}
