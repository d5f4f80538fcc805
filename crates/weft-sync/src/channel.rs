//! FIFO/rendezvous channel for coroutine bodies.
//!
//! Blocking operations never block a thread directly. When no immediate
//! match exists they queue a pending hand-off and suspend the calling
//! coroutine until a later operation (or `close`) fulfills it.
//!
//! Ordering: buffered values are always older than parked sends, so a
//! receive drains the buffer first and then promotes the oldest parked
//! send into the freed slot. Parked sends and parked receives are each
//! served oldest-first.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use weft_protocols::{Converter, JsonConverter, Payload};

use crate::context::WorkflowContext;
use crate::error::ChannelError;
use crate::waiter::{self, PendingReceiver, PendingSender, Received, SendStatus};

struct ChannelState {
    buffer: VecDeque<Payload>,
    receivers: VecDeque<PendingReceiver>,
    senders: VecDeque<PendingSender>,
    capacity: usize,
    closed: bool,
}

impl ChannelState {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::new(),
            receivers: VecDeque::new(),
            senders: VecDeque::new(),
            capacity,
            closed: false,
        }
    }

    /// Hand the value to a parked receive or buffer it. Gives the value
    /// back when neither is possible.
    fn try_send(&mut self, mut payload: Payload) -> Result<Option<Payload>, ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }

        while let Some(receiver) = self.receivers.pop_front() {
            match receiver.deliver(payload) {
                Ok(()) => return Ok(None),
                Err(returned) => payload = returned,
            }
        }

        if self.buffer.len() < self.capacity {
            self.buffer.push_back(payload);
            return Ok(None);
        }

        Ok(Some(payload))
    }

    fn try_receive(&mut self) -> Option<Payload> {
        if let Some(payload) = self.buffer.pop_front() {
            if let Some(next) = self.take_sender() {
                self.buffer.push_back(next);
            }
            return Some(payload);
        }

        self.take_sender()
    }

    fn take_sender(&mut self) -> Option<Payload> {
        while let Some(sender) = self.senders.pop_front() {
            if let Some(payload) = sender.take() {
                return Some(payload);
            }
        }
        None
    }
}

/// Value-passing and synchronization primitive for coroutine bodies.
///
/// Capacity 0 is a pure rendezvous: a send completes only when a receive
/// takes the value. Capacity `n` lets up to `n` values wait in the buffer.
/// Clones share the same channel.
pub struct Channel<C: Converter = JsonConverter> {
    state: Arc<Mutex<ChannelState>>,
    converter: Arc<C>,
}

impl Channel<JsonConverter> {
    /// Unbuffered (rendezvous) channel.
    pub fn new() -> Self {
        Self::buffered(0)
    }

    /// Channel holding up to `capacity` values without a waiting receiver.
    pub fn buffered(capacity: usize) -> Self {
        Self::with_converter(capacity, JsonConverter)
    }
}

impl Default for Channel<JsonConverter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Converter> Channel<C> {
    pub fn with_converter(capacity: usize, converter: C) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChannelState::new(capacity))),
            converter: Arc::new(converter),
        }
    }

    /// Send a value, suspending the calling coroutine until it is taken.
    ///
    /// Fails with [`ChannelError::Closed`] if the channel is closed before
    /// the value is taken; the value is then dropped.
    pub fn send<T: Serialize + ?Sized>(
        &self,
        ctx: &WorkflowContext,
        value: &T,
    ) -> Result<(), ChannelError> {
        let payload = self.converter.to_payload(value)?;

        let (coroutine, waiter) = {
            let mut state = self.state.lock();
            let Some(payload) = state.try_send(payload)? else {
                note_progress(ctx);
                return Ok(());
            };

            let coroutine = ctx.coroutine()?;
            let (pending, waiter) = waiter::send_pair(payload);
            state.senders.retain(PendingSender::is_live);
            state.senders.push_back(pending);
            (coroutine, waiter)
        };

        debug!(coroutine = %coroutine.id(), "send: parked");
        loop {
            coroutine.suspend()?;
            match waiter.poll() {
                SendStatus::Delivered => {
                    coroutine.mark_progress();
                    return Ok(());
                }
                SendStatus::Closed => return Err(ChannelError::Closed),
                SendStatus::Pending => {}
            }
        }
    }

    /// Send only if a receive is waiting or buffer space is free.
    ///
    /// Never parks and never suspends; returns whether the value was taken.
    pub fn send_nonblocking<T: Serialize + ?Sized>(&self, value: &T) -> Result<bool, ChannelError> {
        let payload = self.converter.to_payload(value)?;
        let mut state = self.state.lock();
        Ok(state.try_send(payload)?.is_none())
    }

    /// Receive a value into `dest`, suspending the calling coroutine until
    /// one arrives.
    ///
    /// Returns `Ok(true)` when a value was written to `dest` and
    /// `Ok(false)` at end-of-channel (closed and drained), leaving `dest`
    /// untouched.
    pub fn receive<T: DeserializeOwned>(
        &self,
        ctx: &WorkflowContext,
        dest: &mut T,
    ) -> Result<bool, ChannelError> {
        let (coroutine, waiter) = {
            let mut state = self.state.lock();
            if let Some(payload) = state.try_receive() {
                drop(state);
                self.assign(&payload, dest)?;
                note_progress(ctx);
                return Ok(true);
            }

            if state.closed {
                return Ok(false);
            }

            let coroutine = ctx.coroutine()?;
            let (pending, waiter) = waiter::receive_pair();
            state.receivers.retain(PendingReceiver::is_live);
            state.receivers.push_back(pending);
            (coroutine, waiter)
        };

        debug!(coroutine = %coroutine.id(), "receive: parked");
        loop {
            coroutine.suspend()?;
            match waiter.poll() {
                Some(Received::Value(payload)) => {
                    coroutine.mark_progress();
                    self.assign(&payload, dest)?;
                    return Ok(true);
                }
                Some(Received::Closed) => return Ok(false),
                None => {}
            }
        }
    }

    /// Receive only if a value is buffered or a send is parked.
    ///
    /// Returns whether a value was written to `dest`.
    pub fn receive_nonblocking<T: DeserializeOwned>(&self, dest: &mut T) -> Result<bool, ChannelError> {
        let payload = self.state.lock().try_receive();
        match payload {
            Some(payload) => {
                self.assign(&payload, dest)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Close the channel.
    ///
    /// Parked receives observe end-of-channel, parked sends fail with
    /// [`ChannelError::Closed`]. Buffered values stay receivable. Closing
    /// twice is a no-op.
    pub fn close(&self) {
        let (receivers, senders) = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            (
                std::mem::take(&mut state.receivers),
                std::mem::take(&mut state.senders),
            )
        };

        debug!(
            receivers = receivers.len(),
            senders = senders.len(),
            "channel closed"
        );

        for receiver in receivers {
            receiver.close();
        }
        for sender in senders {
            sender.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of buffered values.
    pub fn len(&self) -> usize {
        self.state.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().capacity
    }

    /// Number of parked sends still waiting for a receive.
    pub fn pending_senders(&self) -> usize {
        self.state.lock().senders.iter().filter(|s| s.is_live()).count()
    }

    /// Number of parked receives still waiting for a value.
    pub fn pending_receivers(&self) -> usize {
        self.state.lock().receivers.iter().filter(|r| r.is_live()).count()
    }

    fn assign<T: DeserializeOwned>(&self, payload: &Payload, dest: &mut T) -> Result<(), ChannelError> {
        *dest = self.converter.from_payload(payload)?;
        Ok(())
    }
}

fn note_progress(ctx: &WorkflowContext) {
    if let Ok(coroutine) = ctx.coroutine() {
        coroutine.mark_progress();
    }
}

impl<C: Converter> Clone for Channel<C> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            converter: self.converter.clone(),
        }
    }
}

impl<C: Converter> fmt::Debug for Channel<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Channel")
            .field("capacity", &state.capacity)
            .field("buffered", &state.buffer.len())
            .field("receivers", &state.receivers.len())
            .field("senders", &state.senders.len())
            .field("closed", &state.closed)
            .finish()
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
