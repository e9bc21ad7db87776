use crate::config::FaceConfig;
use crate::errors::FaceError;
use crate::event_loop::EventLoop;
use crate::node::{OnInterest, OnRegisterFailed};
use crate::transport::{RegistrationOptions, Transport};
use futures::channel::{mpsc, oneshot};
use libndn::{CallbackError, CallbackResult, Data, EntryId, Interest, InterestFilter, Name, OnData, OnTimeout};
use log::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Polled by the event loop. Returning `Ok(true)` stops the loop.
pub type StopPredicate = Box<dyn FnMut() -> Result<bool, CallbackError> + Send>;
/// A one-shot callback run on the loop thread by [`ThreadsafeFace::call_later`].
pub type LoopCallback = Box<dyn FnOnce() -> CallbackResult + Send>;

/// A unit of work handed from a [`ThreadsafeFace`] to the [`EventLoop`].
pub enum FaceCommand {
    /// Executed via [`ThreadsafeFace::express_interest`].
    ExpressInterest { id: EntryId, interest: Interest, on_data: OnData, on_timeout: Option<OnTimeout> },
    RemovePendingInterest(EntryId),
    /// Executed via [`ThreadsafeFace::register_prefix`].
    RegisterPrefix {
        id: EntryId,
        prefix: Name,
        on_interest: Option<OnInterest>,
        on_register_failed: OnRegisterFailed,
        options: RegistrationOptions,
    },
    RemoveRegisteredPrefix(EntryId),
    SetInterestFilter { id: EntryId, filter: InterestFilter, on_interest: OnInterest },
    UnsetInterestFilter(EntryId),
    PutData(Data),
    Send(Vec<u8>),
    /// Replace the predicate polled by the termination service. `None` clears it.
    StopWhen(Option<StopPredicate>),
    CallLater { delay: Duration, callback: LoopCallback },
    PendingInterestCount(oneshot::Sender<usize>),
    /// Answered once every command handed off before it has run.
    Flush(oneshot::Sender<()>),
    Shutdown,
}

/// A handle for calling the face from any thread.
///
/// It can be cheaply cloned and shared among threads. No method blocks or waits for the loop thread: operations are
/// queued in one FIFO shared by all clones and executed in order by the [`EventLoop`]. Callbacks run on the loop
/// thread.
///
/// Methods that return an [`EntryId`] allocate it on the calling thread before handing off. The id can be used for
/// cancellation straight away: the cancellation is queued behind the operation that created the entry.
#[derive(Clone)]
pub struct ThreadsafeFace {
    sender: mpsc::UnboundedSender<FaceCommand>,
    active: Arc<AtomicBool>,
}

impl ThreadsafeFace {
    /// Create a face and the event loop that serves it. The event loop does nothing until it is run, see
    /// [`EventLoop::run`] and [`EventLoop::spawn_thread`].
    pub fn new<T: Transport + 'static>(transport: T, config: FaceConfig) -> (ThreadsafeFace, EventLoop) {
        let (sender, receiver) = mpsc::unbounded();
        let active = Arc::new(AtomicBool::new(true));
        let event_loop = EventLoop::new(Box::new(transport), config, receiver, Arc::clone(&active));
        (ThreadsafeFace { sender, active }, event_loop)
    }

    fn hand_off(&self, command: FaceCommand) -> Result<(), FaceError> {
        self.sender.unbounded_send(command).map_err(|_| FaceError::LoopClosed)
    }

    /// False once [`ThreadsafeFace::shutdown`] has been called on any clone.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Express an interest. `interest` is copied now, so later changes to it have no effect.
    pub fn express_interest(
        &self,
        interest: &Interest,
        on_data: OnData,
        on_timeout: Option<OnTimeout>,
    ) -> Result<EntryId, FaceError> {
        let id = EntryId::next();
        trace!("Handing off interest {id} for {}", interest.name());
        self.hand_off(FaceCommand::ExpressInterest { id, interest: interest.clone(), on_data, on_timeout })?;
        Ok(id)
    }

    pub fn remove_pending_interest(&self, id: EntryId) -> Result<(), FaceError> {
        self.hand_off(FaceCommand::RemovePendingInterest(id))
    }

    pub fn register_prefix(
        &self,
        prefix: &Name,
        on_interest: Option<OnInterest>,
        on_register_failed: OnRegisterFailed,
        options: RegistrationOptions,
    ) -> Result<EntryId, FaceError> {
        let id = EntryId::next();
        self.hand_off(FaceCommand::RegisterPrefix {
            id,
            prefix: prefix.clone(),
            on_interest,
            on_register_failed,
            options,
        })?;
        Ok(id)
    }

    pub fn remove_registered_prefix(&self, id: EntryId) -> Result<(), FaceError> {
        self.hand_off(FaceCommand::RemoveRegisteredPrefix(id))
    }

    pub fn set_interest_filter(&self, filter: &InterestFilter, on_interest: OnInterest) -> Result<EntryId, FaceError> {
        let id = EntryId::next();
        self.hand_off(FaceCommand::SetInterestFilter { id, filter: filter.clone(), on_interest })?;
        Ok(id)
    }

    pub fn unset_interest_filter(&self, id: EntryId) -> Result<(), FaceError> {
        self.hand_off(FaceCommand::UnsetInterestFilter(id))
    }

    pub fn put_data(&self, data: &Data) -> Result<(), FaceError> {
        self.hand_off(FaceCommand::PutData(data.clone()))
    }

    /// Send an already encoded element.
    pub fn send(&self, encoding: &[u8]) -> Result<(), FaceError> {
        self.hand_off(FaceCommand::Send(encoding.to_vec()))
    }

    /// Poll `predicate` on the loop thread and stop the event loop when it returns true. Replaces any earlier
    /// predicate. A predicate that returns an error is logged and polled again later.
    pub fn stop_when<F>(&self, predicate: F) -> Result<(), FaceError>
    where
        F: FnMut() -> Result<bool, CallbackError> + Send + 'static,
    {
        self.hand_off(FaceCommand::StopWhen(Some(Box::new(predicate))))
    }

    pub fn clear_stop_when(&self) -> Result<(), FaceError> {
        self.hand_off(FaceCommand::StopWhen(None))
    }

    /// Run `callback` once on the loop thread after `delay`.
    pub fn call_later<F>(&self, delay: Duration, callback: F) -> Result<(), FaceError>
    where
        F: FnOnce() -> CallbackResult + Send + 'static,
    {
        self.hand_off(FaceCommand::CallLater { delay, callback: Box::new(callback) })
    }

    /// The number of interests still waiting for data, as seen by the loop thread once everything queued before this
    /// call has run.
    pub async fn pending_interest_count(&self) -> Result<usize, FaceError> {
        let (sender, receiver) = oneshot::channel();
        self.hand_off(FaceCommand::PendingInterestCount(sender))?;
        let count = receiver.await?;
        Ok(count)
    }

    /// Resolves once every operation handed off before this call has run on the loop thread.
    pub async fn flush(&self) -> Result<(), FaceError> {
        let (sender, receiver) = oneshot::channel();
        self.hand_off(FaceCommand::Flush(sender))?;
        receiver.await?;
        Ok(())
    }

    /// Stop the event loop's periodic services and shut the node down. Safe to call from any thread and more than
    /// once. Only the first call has an effect.
    pub fn shutdown(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        debug!("Face shutdown requested");
        if self.hand_off(FaceCommand::Shutdown).is_err() {
            debug!("The event loop had already finished");
        }
    }
}
