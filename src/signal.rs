// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Synchronous observer lists.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Slot<T> = Box<dyn FnMut(&T) + Send>;

/// Subscribers are called in connection order, on the emitting thread, once per `emit`.
pub struct Signal<T> {
    next: u64,
    slots: Vec<(SubscriptionId, Slot<T>)>,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self { next: 0, slots: Vec::new() }
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal").field("subscribers", &self.slots.len()).finish()
    }
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, slot: impl FnMut(&T) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next);
        self.next += 1;
        self.slots.push((id, Box::new(slot)));
        id
    }

    /// Returns whether `id` was connected.
    pub fn disconnect(&mut self, id: SubscriptionId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|(slot_id, _)| *slot_id != id);
        self.slots.len() != before
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn emit(&mut self, value: &T) {
        for (_, slot) in &mut self.slots {
            slot(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::Signal;

    #[test]
    fn emits_in_connection_order_until_disconnected() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut signal = Signal::<u32>::new();

        let first = {
            let seen = Arc::clone(&seen);
            signal.connect(move |value| seen.lock().expect("lock").push(("first", *value)))
        };
        {
            let seen = Arc::clone(&seen);
            signal.connect(move |value| seen.lock().expect("lock").push(("second", *value)));
        }

        signal.emit(&1);
        assert!(signal.disconnect(first));
        assert!(!signal.disconnect(first));
        signal.emit(&2);

        assert_eq!(*seen.lock().expect("lock"), [("first", 1), ("second", 1), ("second", 2)]);
    }
}
