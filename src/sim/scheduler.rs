//! Deferred and repeating jobs
//!
//! Jobs are plain data handed back to the owner when they fall due, so a
//! deferred reaction carries ids to re-check rather than references into
//! live state.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use super::TIME_EPSILON;

/// Shortest allowed period for repeating jobs
const MIN_INTERVAL: f64 = 1e-3;

/// Handle for cancelling a scheduled job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(u64);

#[derive(Debug)]
struct Entry<J> {
    due: f64,
    seq: u64,
    token: Token,
    every: Option<f64>,
    job: J,
}

impl<J> PartialEq for Entry<J> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<J> Eq for Entry<J> {}

impl<J> PartialOrd for Entry<J> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<J> Ord for Entry<J> {
    // Reversed: BinaryHeap is a max-heap and the earliest job must surface first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .total_cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A job released by [`Scheduler::pop_due`]
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<J> {
    pub token: Token,
    /// When the job was due, which may be earlier than the `now` passed in
    pub at: f64,
    pub job: J,
}

/// Single-threaded job queue ordered by due time, then by scheduling order
#[derive(Debug)]
pub struct Scheduler<J> {
    queue: BinaryHeap<Entry<J>>,
    cancelled: HashSet<Token>,
    next_token: u64,
    next_seq: u64,
}

impl<J> Default for Scheduler<J> {
    fn default() -> Self {
        Self {
            queue: BinaryHeap::new(),
            cancelled: HashSet::new(),
            next_token: 0,
            next_seq: 0,
        }
    }
}

impl<J: Clone> Scheduler<J> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` every `interval` seconds, first at `now + interval`
    pub fn run_every(&mut self, now: f64, interval: f64, job: J) -> Token {
        let interval = interval.max(MIN_INTERVAL);
        self.push(now + interval, Some(interval), job)
    }

    /// Run `job` once, `delay` seconds from `now`
    pub fn run_once_after(&mut self, now: f64, delay: f64, job: J) -> Token {
        self.push(now + delay.max(0.0), None, job)
    }

    /// Cancel a job. Returns false if the token is unknown, already fired or already cancelled.
    pub fn cancel(&mut self, token: Token) -> bool {
        if self.cancelled.contains(&token) {
            return false;
        }
        if self.queue.iter().any(|e| e.token == token) {
            self.cancelled.insert(token);
            true
        } else {
            false
        }
    }

    /// Pop the next job due at or before `now`. Repeating jobs are re-armed.
    pub fn pop_due(&mut self, now: f64) -> Option<Fired<J>> {
        loop {
            let due = self.queue.peek()?.due;
            if due > now + TIME_EPSILON {
                return None;
            }
            let entry = self.queue.pop()?;
            if self.cancelled.remove(&entry.token) {
                continue;
            }
            if let Some(every) = entry.every {
                let seq = self.bump_seq();
                self.queue.push(Entry {
                    due: entry.due + every,
                    seq,
                    token: entry.token,
                    every: entry.every,
                    job: entry.job.clone(),
                });
            }
            return Some(Fired {
                token: entry.token,
                at: entry.due,
                job: entry.job,
            });
        }
    }

    /// Number of live (not cancelled) jobs
    pub fn len(&self) -> usize {
        self.queue
            .iter()
            .filter(|e| !self.cancelled.contains(&e.token))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every pending job
    pub fn clear(&mut self) {
        self.queue.clear();
        self.cancelled.clear();
    }

    /// Iterate pending job payloads in no particular order
    pub fn jobs(&self) -> impl Iterator<Item = &J> {
        self.queue
            .iter()
            .filter(|e| !self.cancelled.contains(&e.token))
            .map(|e| &e.job)
    }

    fn push(&mut self, due: f64, every: Option<f64>, job: J) -> Token {
        let token = Token(self.next_token);
        self.next_token += 1;
        let seq = self.bump_seq();
        self.queue.push(Entry { due, seq, token, every, job });
        token
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut Scheduler<&'static str>, now: f64) -> Vec<&'static str> {
        std::iter::from_fn(|| scheduler.pop_due(now).map(|fired| fired.job)).collect()
    }

    #[test]
    fn test_once_fires_after_delay() {
        let mut scheduler = Scheduler::new();
        scheduler.run_once_after(0.0, 0.5, "boom");

        assert!(drain(&mut scheduler, 0.4).is_empty());
        assert_eq!(drain(&mut scheduler, 0.5), vec!["boom"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_same_instant_keeps_scheduling_order() {
        let mut scheduler = Scheduler::new();
        scheduler.run_once_after(0.0, 1.0, "first");
        scheduler.run_once_after(0.5, 0.5, "second");
        scheduler.run_once_after(0.0, 0.2, "earliest");

        assert_eq!(drain(&mut scheduler, 1.0), vec!["earliest", "first", "second"]);
    }

    #[test]
    fn test_repeating_rearms() {
        let mut scheduler = Scheduler::new();
        let token = scheduler.run_every(0.0, 0.1, "sweep");

        let fired = drain(&mut scheduler, 0.35);
        assert_eq!(fired.len(), 3);
        assert_eq!(scheduler.len(), 1);

        assert!(scheduler.cancel(token));
        assert!(!scheduler.cancel(token));
        assert!(drain(&mut scheduler, 10.0).is_empty());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_fired_reports_due_time() {
        let mut scheduler = Scheduler::new();
        let token = scheduler.run_once_after(1.0, 0.5, "late");
        let fired = scheduler.pop_due(4.0).unwrap();
        assert_eq!(fired.token, token);
        assert_eq!(fired.at, 1.5);
    }

    #[test]
    fn test_cancel_fired_token_is_noop() {
        let mut scheduler = Scheduler::new();
        let token = scheduler.run_once_after(0.0, 0.0, "now");
        assert_eq!(drain(&mut scheduler, 0.0), vec!["now"]);
        assert!(!scheduler.cancel(token));
    }
}
