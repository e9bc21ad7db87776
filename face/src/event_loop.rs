//! The loop thread.
//!
//! The [`EventLoop`] owns the [`Node`] and is the only place where protocol state is touched. It consumes three
//! sources of work:
//!
//! - [`FaceCommand`]s handed off by [`crate::ThreadsafeFace`] clones, in the order they were queued;
//! - one-shot timers armed by the node (interest timeouts) or by [`crate::ThreadsafeFace::call_later`];
//! - two self re-arming services: event processing, which drives [`Node::process_events`], and the termination
//!   service, which polls the [`crate::ThreadsafeFace::stop_when`] predicate.
//!
//! Both services stop re-arming once the face has been shut down.

use crate::config::FaceConfig;
use crate::node::Node;
use crate::scheduler::{LoopScheduler, NodeCallback};
use crate::threadsafe_face::{FaceCommand, LoopCallback, StopPredicate};
use crate::transport::Transport;
use futures::channel::mpsc;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use libndn::CallbackOutcome;
use log::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::time::Instant;

/// Why [`EventLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The `stop_when` predicate returned true. The loop can be run again.
    Stopped,
    /// The face was shut down.
    Shutdown,
    /// Every face handle was dropped and nothing is left to run.
    Idle,
}

enum ScheduledTask {
    ProcessEvents,
    StopWhen,
    Node(NodeCallback),
    Callback(LoopCallback),
}

enum LoopEvent {
    Command(Option<FaceCommand>),
    Timer(ScheduledTask),
    Idle,
}

pub struct EventLoop {
    node: Node,
    commands: mpsc::UnboundedReceiver<FaceCommand>,
    commands_open: bool,
    node_timers: mpsc::UnboundedReceiver<(Duration, NodeCallback)>,
    timers: FuturesUnordered<BoxFuture<'static, ScheduledTask>>,
    active: Arc<AtomicBool>,
    stop_when: Option<StopPredicate>,
    stop_when_armed: bool,
    stopped: bool,
    process_events_interval: Duration,
    stop_when_interval: Duration,
}

impl EventLoop {
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        config: FaceConfig,
        commands: mpsc::UnboundedReceiver<FaceCommand>,
        active: Arc<AtomicBool>,
    ) -> Self {
        let (scheduler, node_timers) = LoopScheduler::new();
        let process_events_interval = config.process_events_interval();
        let stop_when_interval = config.stop_when_interval();
        let node = Node::with_scheduler(transport, Box::new(scheduler), config);
        let mut event_loop = Self {
            node,
            commands,
            commands_open: true,
            node_timers,
            timers: FuturesUnordered::new(),
            active,
            stop_when: None,
            stop_when_armed: false,
            stopped: false,
            process_events_interval,
            stop_when_interval,
        };
        event_loop.schedule(Duration::ZERO, ScheduledTask::ProcessEvents);
        event_loop
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Arm a one-shot timer. The deadline is fixed now; the sleep itself is only created once the loop polls it.
    fn schedule(&mut self, delay: Duration, task: ScheduledTask) {
        let deadline = Instant::now() + delay;
        self.timers.push(Box::pin(async move {
            tokio::time::sleep_until(deadline).await;
            task
        }));
    }

    fn arm_node_timers(&mut self) {
        while let Ok((delay, callback)) = self.node_timers.try_recv() {
            self.schedule(delay, ScheduledTask::Node(callback));
        }
    }

    /// Run the loop on the current thread until the `stop_when` predicate returns true or the face is shut down.
    ///
    /// When the loop is run again after [`LoopExit::Stopped`], the predicate is next polled one full
    /// `stop_when_interval` later, so work that was queued in the meantime (a shutdown, say) runs first.
    ///
    /// The future must be driven by a tokio runtime with the time driver enabled. A current-thread runtime is the
    /// natural fit, since every callback runs inside this future anyway.
    pub async fn run(&mut self) -> LoopExit {
        if !self.stop_when_armed && self.is_active() {
            let delay = if self.stopped { self.stop_when_interval } else { Duration::ZERO };
            self.schedule(delay, ScheduledTask::StopWhen);
            self.stop_when_armed = true;
        }
        loop {
            self.arm_node_timers();
            let event = tokio::select! {
                biased;
                command = self.commands.next(), if self.commands_open => LoopEvent::Command(command),
                Some(task) = self.timers.next(), if !self.timers.is_empty() => LoopEvent::Timer(task),
                else => LoopEvent::Idle,
            };
            let exit = match event {
                LoopEvent::Command(Some(command)) => self.handle_command(command),
                LoopEvent::Command(None) => {
                    debug!("Every face handle has been dropped");
                    self.commands_open = false;
                    None
                }
                LoopEvent::Timer(task) => self.run_task(task),
                LoopEvent::Idle => Some(LoopExit::Idle),
            };
            if let Some(exit) = exit {
                debug!("Event loop exiting: {exit:?}");
                return exit;
            }
        }
    }

    /// Run the loop on a new, dedicated thread with its own current-thread tokio runtime.
    pub fn spawn_thread(mut self) -> std::io::Result<JoinHandle<std::io::Result<LoopExit>>> {
        std::thread::Builder::new().name("ndn-face-loop".into()).spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build()?;
            Ok(runtime.block_on(self.run()))
        })
    }

    fn handle_command(&mut self, command: FaceCommand) -> Option<LoopExit> {
        match command {
            FaceCommand::ExpressInterest { id, interest, on_data, on_timeout } => {
                if let Err(e) = self.node.express_interest(id, interest, on_data, on_timeout) {
                    error!("Could not express interest {id}. {e}");
                }
            }
            FaceCommand::RemovePendingInterest(id) => self.node.remove_pending_interest(id),
            FaceCommand::RegisterPrefix { id, prefix, on_interest, on_register_failed, options } => {
                self.node.register_prefix(id, prefix, on_interest, on_register_failed, options)
            }
            FaceCommand::RemoveRegisteredPrefix(id) => self.node.remove_registered_prefix(id),
            FaceCommand::SetInterestFilter { id, filter, on_interest } => {
                self.node.set_interest_filter(id, filter, on_interest)
            }
            FaceCommand::UnsetInterestFilter(id) => self.node.unset_interest_filter(id),
            FaceCommand::PutData(data) => {
                if let Err(e) = self.node.put_data(&data) {
                    error!("Could not put data {}. {e}", data.name());
                }
            }
            FaceCommand::Send(encoding) => {
                if let Err(e) = self.node.send(&encoding) {
                    error!("Could not send {} bytes. {e}", encoding.len());
                }
            }
            FaceCommand::StopWhen(predicate) => self.stop_when = predicate,
            FaceCommand::CallLater { delay, callback } => self.schedule(delay, ScheduledTask::Callback(callback)),
            FaceCommand::PendingInterestCount(sender) => {
                if sender.send(self.node.pending_interest_count()).is_err() {
                    trace!("Pending interest count requested, but nobody is listening");
                }
            }
            FaceCommand::Flush(sender) => {
                if sender.send(()).is_err() {
                    trace!("Flush requested, but nobody is listening");
                }
            }
            FaceCommand::Shutdown => {
                self.active.store(false, Ordering::Release);
                self.node.shutdown();
                return Some(LoopExit::Shutdown);
            }
        }
        None
    }

    fn run_task(&mut self, task: ScheduledTask) -> Option<LoopExit> {
        match task {
            ScheduledTask::ProcessEvents => {
                if self.is_active() {
                    self.node.process_events();
                    self.schedule(self.process_events_interval, ScheduledTask::ProcessEvents);
                }
            }
            ScheduledTask::StopWhen => {
                self.stop_when_armed = false;
                if !self.is_active() {
                    return None;
                }
                let stop = match self.stop_when.as_mut() {
                    Some(predicate) => match predicate() {
                        Ok(stop) => stop,
                        Err(e) => {
                            warn!("Error in stop_when predicate. {e}");
                            false
                        }
                    },
                    None => false,
                };
                if stop {
                    self.stopped = true;
                    return Some(LoopExit::Stopped);
                }
                self.schedule(self.stop_when_interval, ScheduledTask::StopWhen);
                self.stop_when_armed = true;
            }
            ScheduledTask::Node(callback) => callback(&mut self.node),
            ScheduledTask::Callback(callback) => {
                CallbackOutcome::inspect(callback(), "call_later callback");
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threadsafe_face::ThreadsafeFace;
    use crate::transport::LoopbackTransport;
    use libndn::{CallbackError, Data, Interest, Name};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    fn fast_config() -> FaceConfig {
        FaceConfig { stop_when_interval_ms: 5, ..FaceConfig::default() }
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_calls_run_in_deadline_order() {
        let (transport, _other) = LoopbackTransport::pair();
        let (face, mut event_loop) = ThreadsafeFace::new(transport, fast_config());
        let order = Arc::new(Mutex::new(Vec::new()));
        for (delay, label) in [(30, "late"), (10, "early"), (20, "middle")] {
            let order = Arc::clone(&order);
            face.call_later(Duration::from_millis(delay), move || {
                order.lock().unwrap().push(label);
                Ok(())
            })
            .unwrap();
        }
        face.call_later(Duration::from_millis(15), || Err(CallbackError::msg("this one fails"))).unwrap();
        let seen = Arc::clone(&order);
        face.stop_when(move || Ok(seen.lock().unwrap().len() == 3)).unwrap();
        assert_eq!(event_loop.run().await, LoopExit::Stopped);
        assert_eq!(*order.lock().unwrap(), vec!["early", "middle", "late"]);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_predicate_is_polled_again() {
        let (transport, _other) = LoopbackTransport::pair();
        let (face, mut event_loop) = ThreadsafeFace::new(transport, fast_config());
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&polls);
        face.stop_when(move || match counter.fetch_add(1, Ordering::SeqCst) {
            0 | 1 => Err(CallbackError::msg("not ready")),
            _ => Ok(true),
        })
        .unwrap();
        assert_eq!(event_loop.run().await, LoopExit::Stopped);
        assert_eq!(polls.load(Ordering::SeqCst), 3);

        // The loop can be resumed once the predicate is cleared
        face.clear_stop_when().unwrap();
        face.call_later(Duration::from_millis(50), {
            let face = face.clone();
            move || {
                face.shutdown();
                Ok(())
            }
        })
        .unwrap();
        assert_eq!(event_loop.run().await, LoopExit::Shutdown);
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn interest_times_out_on_the_loop() {
        let (transport, _other) = LoopbackTransport::pair();
        let (face, mut event_loop) = ThreadsafeFace::new(transport, fast_config());
        let timeouts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&timeouts);
        let interest = Interest::new("/nobody/home".parse::<Name>().unwrap())
            .with_interest_lifetime(Duration::from_millis(100));
        face.express_interest(
            &interest,
            Box::new(|_: &Interest, _: &Data| Ok(())),
            Some(Box::new(move |_: &Interest| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })),
        )
        .unwrap();
        let seen = Arc::clone(&timeouts);
        face.stop_when(move || Ok(seen.load(Ordering::SeqCst) > 0)).unwrap();
        assert_eq!(event_loop.run().await, LoopExit::Stopped);
        assert_eq!(timeouts.load(Ordering::SeqCst), 1);

        let (count, exit) = tokio::join!(
            async {
                let count = face.pending_interest_count().await;
                face.shutdown();
                count
            },
            event_loop.run()
        );
        assert_eq!(count.unwrap(), 0);
        assert_eq!(exit, LoopExit::Shutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_queued_after_a_stop_tears_the_node_down() {
        let (transport, mut other) = LoopbackTransport::pair();
        let (face, mut event_loop) = ThreadsafeFace::new(transport, fast_config());
        face.stop_when(|| Ok(true)).unwrap();
        assert_eq!(event_loop.run().await, LoopExit::Stopped);

        // The predicate still holds, but the shutdown is queued ahead of its next poll
        let (count, exit) = tokio::join!(
            async {
                let count = face.pending_interest_count().await;
                face.shutdown();
                count
            },
            event_loop.run()
        );
        assert_eq!(count.unwrap(), 0);
        assert_eq!(exit, LoopExit::Shutdown);
        assert!(matches!(other.receive(), Err(crate::TransportError::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn rerun_polls_the_predicate_again() {
        let (transport, _other) = LoopbackTransport::pair();
        let (face, mut event_loop) = ThreadsafeFace::new(transport, fast_config());
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&polls);
        face.stop_when(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        })
        .unwrap();
        assert_eq!(event_loop.run().await, LoopExit::Stopped);
        assert_eq!(event_loop.run().await, LoopExit::Stopped);
        assert_eq!(polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_then_idle() {
        let (transport, _other) = LoopbackTransport::pair();
        let (face, mut event_loop) = ThreadsafeFace::new(transport, fast_config());
        face.shutdown();
        face.shutdown();
        assert!(!face.is_active());
        assert_eq!(event_loop.run().await, LoopExit::Shutdown);
        drop(face);
        assert_eq!(event_loop.run().await, LoopExit::Idle);
    }

    #[test]
    fn handles_fail_once_the_loop_is_gone() {
        let (transport, _other) = LoopbackTransport::pair();
        let (face, event_loop) = ThreadsafeFace::new(transport, FaceConfig::default());
        drop(event_loop);
        let result = face.put_data(&Data::new(Name::new().append("a"), b"".to_vec()));
        assert!(matches!(result, Err(crate::FaceError::LoopClosed)));
    }
}
