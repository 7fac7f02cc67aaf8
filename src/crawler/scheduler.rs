//! Dispatch scheduler for the crawl frontier
//!
//! This module handles:
//! - The FIFO queue of admitted pages (breadth-first with one worker)
//! - The page budget, counted against visited plus in-flight pages
//! - The politeness delay, as a global minimum spacing between dispatches
//! - The engine lifecycle transitions driven by queue and budget state
//!
//! Queue, in-flight set, lifecycle state, and the visited counter are all read
//! and written under one lock, so the "nothing left to do" decision can never
//! race with a worker that is about to enqueue new links.

use crate::crawler::frontier::FrontierEntry;
use crate::state::{EngineState, FinishReason};
use crate::url::NormalizedUrl;
use crate::ScraperError;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Outcome of one poll of the scheduler
enum Poll {
    /// Fetch this entry after waiting out the reserved slot
    Dispatch(FrontierEntry, Duration),
    /// Nothing dispatchable yet; wait for a state change
    Wait,
    /// No further dispatches will happen
    Done,
}

struct SchedulerInner {
    state: EngineState,
    queue: VecDeque<FrontierEntry>,
    in_flight: HashMap<NormalizedUrl, FrontierEntry>,
    next_slot: Option<Instant>,
    finish_reason: Option<FinishReason>,
}

/// Scheduler shared by all crawl workers
pub struct Scheduler {
    inner: Mutex<SchedulerInner>,
    notify: Notify,
    pages_visited: AtomicU64,
    max_pages: u64,
    delay: Duration,
}

impl Scheduler {
    /// Creates a new scheduler in the `Running` state
    ///
    /// # Arguments
    ///
    /// * `max_pages` - Page budget for the run
    /// * `delay` - Minimum spacing between consecutive dispatches
    pub fn new(max_pages: u64, delay: Duration) -> Self {
        Self {
            inner: Mutex::new(SchedulerInner {
                state: EngineState::Running,
                queue: VecDeque::new(),
                in_flight: HashMap::new(),
                next_slot: None,
                finish_reason: None,
            }),
            notify: Notify::new(),
            pages_visited: AtomicU64::new(0),
            max_pages,
            delay,
        }
    }

    /// Queues an admitted page
    ///
    /// Returns false, dropping the entry, if the engine has stopped dispatching.
    pub fn enqueue(&self, entry: FrontierEntry) -> bool {
        let accepted = {
            let mut inner = self.lock();
            if inner.state.accepts_work() {
                inner.queue.push_back(entry);
                true
            } else {
                false
            }
        };
        if accepted {
            self.notify.notify_waiters();
        }
        accepted
    }

    /// Waits for the next page to fetch
    ///
    /// This method:
    /// 1. Returns `None` once the engine has left `Running`
    /// 2. Moves the engine to `Draining` when the budget is spent or the crawl has run dry
    /// 3. Waits while every remaining budget slot is held by an in-flight page
    /// 4. Reserves the next politeness slot and sleeps until it opens, giving the
    ///    page back if the engine starts draining in the meantime
    ///
    /// # Returns
    ///
    /// * `Some(FrontierEntry)` - A page that is now in flight
    /// * `None` - The worker should exit
    pub async fn next(&self) -> Option<FrontierEntry> {
        loop {
            // Registered before the state is inspected so a wakeup between the
            // check and the await is not lost.
            let notified = self.notify.notified();

            let poll = self.poll();
            match poll {
                Poll::Dispatch(entry, wait) => {
                    if !wait.is_zero() && !self.wait_for_slot(wait).await {
                        self.release(&entry.url);
                        return None;
                    }
                    return Some(entry);
                }
                Poll::Done => return None,
                Poll::Wait => notified.await,
            }
        }
    }

    fn poll(&self) -> Poll {
        let mut inner = self.lock();

        if !inner.state.accepts_work() {
            return Poll::Done;
        }

        let visited = self.pages_visited.load(Ordering::SeqCst);
        if visited >= self.max_pages {
            Self::drain_locked(&mut inner, FinishReason::PageBudgetReached);
            return Poll::Done;
        }

        if inner.queue.is_empty() {
            if inner.in_flight.is_empty() {
                Self::drain_locked(&mut inner, FinishReason::Finished);
                return Poll::Done;
            }
            return Poll::Wait;
        }

        // An in-flight page may still fail and hand its budget slot back.
        if visited + inner.in_flight.len() as u64 >= self.max_pages {
            return Poll::Wait;
        }

        let Some(entry) = inner.queue.pop_front() else {
            return Poll::Wait;
        };
        inner.in_flight.insert(entry.url.clone(), entry.clone());

        let now = Instant::now();
        let slot = inner.next_slot.map_or(now, |slot| slot.max(now));
        inner.next_slot = Some(slot + self.delay);

        Poll::Dispatch(entry, slot - now)
    }

    /// Sleeps until a reserved dispatch slot opens
    ///
    /// Returns false if the engine stopped dispatching while waiting.
    async fn wait_for_slot(&self, wait: Duration) -> bool {
        let deadline = Instant::now() + wait;
        loop {
            let notified = self.notify.notified();
            if !self.lock().state.accepts_work() {
                return false;
            }
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => break,
                _ = notified => {}
            }
        }
        self.lock().state.accepts_work()
    }

    /// Hands back a page that was dispatched but never fetched
    fn release(&self, key: &NormalizedUrl) {
        self.lock().in_flight.remove(key);
        self.notify.notify_waiters();
    }

    /// Marks an in-flight page as finished
    ///
    /// # Arguments
    ///
    /// * `key` - Dedup key of the page
    /// * `visited` - Whether the page was fetched and parsed successfully
    pub fn complete(&self, key: &NormalizedUrl, visited: bool) {
        {
            let mut inner = self.lock();
            inner.in_flight.remove(key);

            if visited {
                self.pages_visited.fetch_add(1, Ordering::SeqCst);
            }

            if inner.state.accepts_work() {
                if self.pages_visited.load(Ordering::SeqCst) >= self.max_pages {
                    Self::drain_locked(&mut inner, FinishReason::PageBudgetReached);
                } else if inner.queue.is_empty() && inner.in_flight.is_empty() {
                    Self::drain_locked(&mut inner, FinishReason::Finished);
                }
            }
        }
        self.notify.notify_waiters();
    }

    /// Stops further dispatches
    ///
    /// Returns true if this call moved the engine out of `Running`.
    pub fn begin_drain(&self, reason: FinishReason) -> bool {
        let changed = {
            let mut inner = self.lock();
            Self::drain_locked(&mut inner, reason)
        };
        self.notify.notify_waiters();
        changed
    }

    fn drain_locked(inner: &mut SchedulerInner, reason: FinishReason) -> bool {
        if !inner.state.accepts_work() {
            return false;
        }
        match inner.state.transition(EngineState::Draining) {
            Ok(next) => inner.state = next,
            Err(e) => {
                tracing::warn!("{}", e);
                return false;
            }
        }
        inner.finish_reason = Some(reason);
        inner.queue.clear();
        tracing::debug!("Engine draining: {}", reason);
        true
    }

    /// Moves the engine to `Closed`
    pub fn close(&self) -> Result<(), ScraperError> {
        let mut inner = self.lock();
        inner.state = inner.state.transition(EngineState::Closed)?;
        inner.queue.clear();
        if inner.finish_reason.is_none() {
            inner.finish_reason = Some(FinishReason::Finished);
        }
        Ok(())
    }

    /// Removes and returns every page still marked in flight
    ///
    /// Used after workers have been aborted; the returned pages never completed.
    pub fn abandon_in_flight(&self) -> Vec<FrontierEntry> {
        let mut inner = self.lock();
        let mut abandoned: Vec<FrontierEntry> = inner.in_flight.drain().map(|(_, e)| e).collect();
        abandoned.sort_by(|a, b| a.url.cmp(&b.url));
        abandoned
    }

    /// Number of pages fetched and parsed successfully
    pub fn pages_visited(&self) -> u64 {
        self.pages_visited.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> EngineState {
        self.lock().state
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.lock().finish_reason
    }

    /// Returns the number of pages waiting to be dispatched
    pub fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    /// Returns the number of pages dispatched but not completed
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
