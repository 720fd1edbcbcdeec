//! Countdown alert offsets.
//!
//! An [`AlertQueue`] holds the remaining "seconds before restart" offsets at
//! which a notice is due, largest first. Popping the head yields the offset to
//! announce now and the interval to wait before the next distinct offset.

use serde::{Deserialize, Serialize};

/// One countdown step produced by [`AlertQueue::pop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertStep {
    /// Seconds before restart announced by this step
    pub remaining: u64,
    /// Seconds to wait before the next step (or the restart)
    pub next_interval: u64,
}

/// Descending, duplicate-free list of second offsets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertQueue {
    alerts: Vec<u64>,
}

impl AlertQueue {
    /// Builds a queue from offsets in any order; duplicates collapse.
    pub fn new<I>(offsets: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        let mut alerts: Vec<u64> = offsets.into_iter().collect();
        alerts.sort_unstable_by(|a, b| b.cmp(a));
        alerts.dedup();
        Self { alerts }
    }

    /// Largest remaining offset.
    pub fn head(&self) -> Option<u64> {
        self.alerts.first().copied()
    }

    /// True when the countdown is over: nothing left, or only the zero
    /// offset (restart now) remains at the head.
    pub fn is_due(&self) -> bool {
        matches!(self.head(), None | Some(0))
    }

    /// Removes the head and reports the interval to the next offset.
    ///
    /// The last offset waits its own length, so a queue without a trailing
    /// zero still ends exactly at the restart time.
    pub fn pop(&mut self) -> Option<AlertStep> {
        if self.alerts.is_empty() {
            return None;
        }
        let remaining = self.alerts.remove(0);
        let next = self.alerts.first().copied().unwrap_or(0);
        Some(AlertStep {
            remaining,
            next_interval: remaining - next,
        })
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_descending_and_deduplicated() {
        let queue = AlertQueue::new([30, 0, 60, 30, 300, 60]);
        assert_eq!(queue.as_slice(), &[300, 60, 30, 0]);
        assert_eq!(queue.head(), Some(300));
    }

    #[test]
    fn test_pop_yields_interval_to_next_distinct_offset() {
        let mut queue = AlertQueue::new([60, 30, 30, 0]);

        assert_eq!(queue.pop(), Some(AlertStep { remaining: 60, next_interval: 30 }));
        assert_eq!(queue.pop(), Some(AlertStep { remaining: 30, next_interval: 30 }));
        assert!(queue.is_due());
        assert_eq!(queue.pop(), Some(AlertStep { remaining: 0, next_interval: 0 }));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_last_offset_waits_its_own_length() {
        let mut queue = AlertQueue::new([90]);
        assert_eq!(queue.pop(), Some(AlertStep { remaining: 90, next_interval: 90 }));
        assert!(queue.is_due());
    }

    #[test]
    fn test_due_states() {
        assert!(AlertQueue::new([]).is_due());
        assert!(AlertQueue::new([0]).is_due());
        assert!(AlertQueue::new([0, 0]).is_due());
        assert!(!AlertQueue::new([5, 0]).is_due());
    }

    #[test]
    fn test_intervals_sum_to_largest_offset() {
        let mut queue = AlertQueue::new([600, 300, 120, 60, 30, 10, 0]);
        let mut total = 0;
        let mut announced = Vec::new();
        while !queue.is_due() {
            let step = queue.pop().unwrap();
            announced.push(step.remaining);
            total += step.next_interval;
        }
        assert_eq!(total, 600);
        assert!(announced.windows(2).all(|pair| pair[0] > pair[1]));
    }
}
