//! Push-to-pull event bridge.
//!
//! Turns a callback-driven producer (socket subscription, polling task,
//! foreign callback) into a single-consumer async sequence:
//!
//! - the producer gets an [`EmitHandle`] with `emit` / `fail` / `complete`,
//!   usable from any thread or task
//! - the consumer gets an [`EventStream`], pulled with `next().await` or as a
//!   `futures::Stream`
//!
//! Termination is exactly-once. After `fail` or `complete` the handle drops
//! its sender, so later calls find nothing to send into and are ignored.
//! Values emitted before the terminal event are still delivered first.

use std::future::poll_fn;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{ready, Context, Poll};

use futures::stream::{FusedStream, Stream};
use tokio::sync::mpsc;
use tracing::trace;

/// One delivery from producer to consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent<T, E> {
    Value(T),
    Failure(E),
    End,
}

type SenderSlot<T, E> = Mutex<Option<mpsc::UnboundedSender<StreamEvent<T, E>>>>;

/// Create a connected consumer/producer pair.
pub fn channel<T, E>() -> (EventStream<T, E>, EmitHandle<T, E>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let stream = EventStream { receiver: rx, finished: false };
    let handle = EmitHandle { sender: Arc::new(Mutex::new(Some(tx))) };
    (stream, handle)
}

/// Producer side of the bridge.
///
/// Cloning shares the same termination state. The consumer holds no reference
/// back to the producer, so dropping the [`EventStream`] releases the queue and
/// turns further emits into no-ops. Dropping every handle without a terminal
/// call ends the stream normally.
pub struct EmitHandle<T, E> {
    sender: Arc<SenderSlot<T, E>>,
}

impl<T, E> Clone for EmitHandle<T, E> {
    fn clone(&self) -> Self {
        Self { sender: Arc::clone(&self.sender) }
    }
}

impl<T, E> EmitHandle<T, E> {
    /// Queue a value. Dropped silently once the stream has terminated.
    pub fn emit(&self, value: T) {
        self.deliver(StreamEvent::Value(value), false);
    }

    /// Terminate with an error, surfaced by the next pull only.
    pub fn fail(&self, error: E) {
        self.deliver(StreamEvent::Failure(error), true);
    }

    /// Terminate normally.
    pub fn complete(&self) {
        self.deliver(StreamEvent::End, true);
    }

    /// True once a terminal event was sent or the consumer is gone.
    pub fn is_terminated(&self) -> bool {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        sender.as_ref().map_or(true, |tx| tx.is_closed())
    }

    fn deliver(&self, event: StreamEvent<T, E>, terminal: bool) {
        // Holding the lock across send keeps a racing fail/complete from
        // slipping a second terminal event in.
        let mut sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = sender.as_ref() else {
            trace!("event stream already terminated, dropping late event");
            return;
        };
        if tx.send(event).is_err() {
            trace!("event stream consumer dropped");
        }
        if terminal {
            *sender = None;
        }
    }
}

/// Consumer side of the bridge.
///
/// Pulls take `&mut self`, so there is never more than one outstanding pull.
pub struct EventStream<T, E> {
    receiver: mpsc::UnboundedReceiver<StreamEvent<T, E>>,
    finished: bool,
}

impl<T, E> EventStream<T, E> {
    /// Build a stream and hand its producer handle to `producer`.
    ///
    /// The closure runs before this returns; it typically registers the
    /// handle with a callback API or moves it into a spawned task.
    pub fn from_producer<F>(producer: F) -> Self
    where
        F: FnOnce(EmitHandle<T, E>),
    {
        let (stream, handle) = channel();
        producer(handle);
        stream
    }

    /// Wait for the next value.
    ///
    /// `Some(Ok(v))` for a value, `Some(Err(e))` once for a failure, `None`
    /// at end of sequence and on every pull after termination.
    pub async fn next(&mut self) -> Option<Result<T, E>> {
        poll_fn(|cx| self.poll_event(cx)).await
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn poll_event(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<T, E>>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match ready!(self.receiver.poll_recv(cx)) {
            Some(StreamEvent::Value(value)) => Poll::Ready(Some(Ok(value))),
            Some(StreamEvent::Failure(error)) => {
                self.finish();
                Poll::Ready(Some(Err(error)))
            }
            Some(StreamEvent::End) | None => {
                self.finish();
                Poll::Ready(None)
            }
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        self.receiver.close();
    }
}

impl<T, E> Stream for EventStream<T, E> {
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_event(cx)
    }
}

impl<T, E> FusedStream for EventStream<T, E> {
    fn is_terminated(&self) -> bool {
        self.finished
    }
}
