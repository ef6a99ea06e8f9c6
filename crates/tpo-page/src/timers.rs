//! Timers
//!
//! One-shot timers and idle callbacks against the page's virtual
//! clock. Timers fire in due-time order, ties broken by scheduling
//! order; idle callbacks fire when the host goes idle or when their
//! deadline budget expires, whichever comes first.

/// Timer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u32);

struct Timer {
    id: u32,
    due_ms: u64,
    callback: Box<dyn FnOnce()>,
}

/// One-shot timer queue
#[derive(Default)]
pub(crate) struct TimerQueue {
    timers: Vec<Timer>,
    next_id: u32,
}

impl TimerQueue {
    /// Schedule a one-shot timer.
    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            due_ms: now_ms + delay_ms,
            callback,
        });
        TimerId(id)
    }

    /// Cancel a pending timer. Unknown ids are ignored.
    pub fn clear(&mut self, id: TimerId) {
        self.timers.retain(|t| t.id != id.0);
    }

    /// Due time of the earliest pending timer.
    pub fn next_due(&self) -> Option<u64> {
        self.timers.iter().map(|t| t.due_ms).min()
    }

    /// Pop the earliest timer with `due_ms <= limit_ms`.
    pub fn pop_due(&mut self, limit_ms: u64) -> Option<Box<dyn FnOnce()>> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= limit_ms)
            .min_by_key(|(_, t)| (t.due_ms, t.id))
            .map(|(i, _)| i)?;
        Some(self.timers.remove(idx).callback)
    }

    /// Check if there are pending timers.
    pub fn has_pending(&self) -> bool {
        !self.timers.is_empty()
    }
}

struct IdleEntry {
    id: u32,
    deadline_ms: u64,
    callback: Box<dyn FnOnce()>,
}

/// Idle callback queue with deadline budgets
#[derive(Default)]
pub(crate) struct IdleQueue {
    entries: Vec<IdleEntry>,
    next_id: u32,
}

impl IdleQueue {
    /// Queue an idle callback with a deadline budget.
    pub fn request(&mut self, now_ms: u64, budget_ms: u64, callback: Box<dyn FnOnce()>) {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(IdleEntry {
            id,
            deadline_ms: now_ms + budget_ms,
            callback,
        });
    }

    /// Deadline of the earliest pending entry.
    pub fn next_deadline(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.deadline_ms).min()
    }

    /// Pop the earliest entry with `deadline_ms <= limit_ms`.
    pub fn pop_due(&mut self, limit_ms: u64) -> Option<Box<dyn FnOnce()>> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline_ms <= limit_ms)
            .min_by_key(|(_, e)| (e.deadline_ms, e.id))
            .map(|(i, _)| i)?;
        Some(self.entries.remove(idx).callback)
    }

    /// Take every pending entry, in scheduling order.
    pub fn take_all(&mut self) -> Vec<Box<dyn FnOnce()>> {
        self.entries.sort_by_key(|e| e.id);
        self.entries.drain(..).map(|e| e.callback).collect()
    }

    /// Check if there are pending entries.
    pub fn has_pending(&self) -> bool {
        !self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_timer_order() {
        let mut q = TimerQueue::default();
        let order = Rc::new(Cell::new(0u32));

        let o = order.clone();
        q.schedule(0, 200, Box::new(move || o.set(o.get() * 10 + 2)));
        let o = order.clone();
        q.schedule(0, 100, Box::new(move || o.set(o.get() * 10 + 1)));

        while let Some(cb) = q.pop_due(1000) {
            cb();
        }
        assert_eq!(order.get(), 12);
    }

    #[test]
    fn test_timer_clear() {
        let mut q = TimerQueue::default();
        let id = q.schedule(0, 100, Box::new(|| {}));
        assert!(q.has_pending());
        q.clear(id);
        assert!(!q.has_pending());
        assert!(q.pop_due(1000).is_none());
    }

    #[test]
    fn test_idle_deadline() {
        let mut q = IdleQueue::default();
        let fired = Rc::new(Cell::new(false));
        let f = fired.clone();
        q.request(0, 3000, Box::new(move || f.set(true)));

        assert_eq!(q.next_deadline(), Some(3000));
        assert!(q.pop_due(2999).is_none());
        q.pop_due(3000).unwrap()();
        assert!(fired.get());
        assert!(!q.has_pending());
    }
}
