//! Single-use hand-off slots for parked sends and receives.
//!
//! A parked operation is split in two halves sharing one slot: the
//! channel queues the pending half, the suspended caller keeps the waiter
//! half. Pending halves are consumed by value, so each parked operation is
//! fulfilled at most once. A waiter dropped while still unfulfilled (its
//! coroutine was aborted) marks the slot abandoned and the channel skips it.

use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;
use weft_protocols::Payload;

enum ReceiveSlot {
    Waiting,
    Delivered(Payload),
    Closed,
    Consumed,
    Abandoned,
}

/// Channel-side half of a parked receive.
pub(crate) struct PendingReceiver {
    slot: Arc<Mutex<ReceiveSlot>>,
}

/// Caller-side half of a parked receive.
pub(crate) struct ReceiveWaiter {
    slot: Arc<Mutex<ReceiveSlot>>,
}

/// Outcome observed by a parked receive.
pub(crate) enum Received {
    Value(Payload),
    Closed,
}

pub(crate) fn receive_pair() -> (PendingReceiver, ReceiveWaiter) {
    let slot = Arc::new(Mutex::new(ReceiveSlot::Waiting));
    (
        PendingReceiver { slot: slot.clone() },
        ReceiveWaiter { slot },
    )
}

impl PendingReceiver {
    /// Hand a value to the parked receive; gives it back if the receive
    /// was abandoned.
    pub(crate) fn deliver(self, payload: Payload) -> Result<(), Payload> {
        let mut slot = self.slot.lock();
        match *slot {
            ReceiveSlot::Waiting => {
                *slot = ReceiveSlot::Delivered(payload);
                Ok(())
            }
            _ => Err(payload),
        }
    }

    /// Signal end-of-channel to the parked receive.
    pub(crate) fn close(self) {
        let mut slot = self.slot.lock();
        if matches!(*slot, ReceiveSlot::Waiting) {
            *slot = ReceiveSlot::Closed;
        }
    }

    pub(crate) fn is_live(&self) -> bool {
        matches!(*self.slot.lock(), ReceiveSlot::Waiting)
    }
}

impl ReceiveWaiter {
    /// Take the outcome if the receive has been fulfilled.
    pub(crate) fn poll(&self) -> Option<Received> {
        let mut slot = self.slot.lock();
        match mem::replace(&mut *slot, ReceiveSlot::Consumed) {
            ReceiveSlot::Delivered(payload) => Some(Received::Value(payload)),
            ReceiveSlot::Closed => Some(Received::Closed),
            other => {
                *slot = other;
                None
            }
        }
    }
}

impl Drop for ReceiveWaiter {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        if matches!(*slot, ReceiveSlot::Waiting) {
            *slot = ReceiveSlot::Abandoned;
        }
    }
}

enum SendSlot {
    Offered(Payload),
    Taken,
    Closed,
    Abandoned,
}

/// Channel-side half of a parked send.
pub(crate) struct PendingSender {
    slot: Arc<Mutex<SendSlot>>,
}

/// Caller-side half of a parked send.
pub(crate) struct SendWaiter {
    slot: Arc<Mutex<SendSlot>>,
}

/// Outcome observed by a parked send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SendStatus {
    Pending,
    Delivered,
    Closed,
}

pub(crate) fn send_pair(payload: Payload) -> (PendingSender, SendWaiter) {
    let slot = Arc::new(Mutex::new(SendSlot::Offered(payload)));
    (PendingSender { slot: slot.clone() }, SendWaiter { slot })
}

impl PendingSender {
    /// Take the offered value; `None` if the send was abandoned.
    pub(crate) fn take(self) -> Option<Payload> {
        let mut slot = self.slot.lock();
        match mem::replace(&mut *slot, SendSlot::Taken) {
            SendSlot::Offered(payload) => Some(payload),
            other => {
                *slot = other;
                None
            }
        }
    }

    /// Fail the parked send; its value is dropped.
    pub(crate) fn close(self) {
        let mut slot = self.slot.lock();
        if matches!(*slot, SendSlot::Offered(_)) {
            *slot = SendSlot::Closed;
        }
    }

    pub(crate) fn is_live(&self) -> bool {
        matches!(*self.slot.lock(), SendSlot::Offered(_))
    }
}

impl SendWaiter {
    pub(crate) fn poll(&self) -> SendStatus {
        match *self.slot.lock() {
            SendSlot::Offered(_) => SendStatus::Pending,
            SendSlot::Taken => SendStatus::Delivered,
            SendSlot::Closed | SendSlot::Abandoned => SendStatus::Closed,
        }
    }
}

impl Drop for SendWaiter {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        if matches!(*slot, SendSlot::Offered(_)) {
            *slot = SendSlot::Abandoned;
        }
    }
}
