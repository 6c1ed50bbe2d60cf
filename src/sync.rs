//! The per-node reader/writer/quiescence protocol.
//!
//! Every folder gets one of these. It arbitrates three kinds of access to
//! that folder's children map: shared reads, exclusive writes, and a
//! quiescence wait that blocks until the node is fully idle — no reader,
//! writer, or waiter of either kind remains.
//!
//! The protocol alternates between admitting a full batch of waiting
//! readers and admitting a single writer, so neither class starves the
//! other. `change` is the handover hint an exiting holder leaves for the
//! next batch: a positive count says "this many readers were already
//! promised entry, let them in even if a writer is also waiting", and `-1`
//! says "one writer was promised entry". It is only ever read or written
//! with the mutex held.
//!
//! This mirrors `Tree`'s `entry_protocole_reader` / `exit_protocole_writer`
//! / `wait_for_operations_in_node` family in a reference C implementation of
//! this same per-node protocol, translated onto `parking_lot`'s
//! `Mutex`/`Condvar` pair the way the rest of this codebase's ecosystem
//! (e.g. `skyd`'s lock-guarded hash table) pairs them.

use parking_lot::{Condvar, Mutex};

#[derive(Default)]
struct State {
    rcount: i32,
    wcount: i32,
    rwait: i32,
    wwait: i32,
    change: i32,
}

pub(crate) struct NodeSync {
    state: Mutex<State>,
    readers: Condvar,
    writers: Condvar,
    quiescence: Condvar,
}

impl NodeSync {
    pub(crate) fn new() -> Self {
        NodeSync {
            state: Mutex::new(State::default()),
            readers: Condvar::new(),
            writers: Condvar::new(),
            quiescence: Condvar::new(),
        }
    }

    pub(crate) fn enter_reader(&self) {
        let mut state = self.state.lock();
        while state.change <= 0 && (state.wcount > 0 || state.wwait > 0) {
            state.rwait += 1;
            self.readers.wait(&mut state);
            state.rwait -= 1;
        }
        state.rcount += 1;
        if state.change > 0 {
            state.change -= 1;
            if state.change > 0 {
                // Cascade the wakeup so the rest of this batch of readers
                // admitted by the last writer's exit also gets in.
                self.readers.notify_one();
            }
        }
    }

    pub(crate) fn exit_reader(&self) {
        let mut state = self.state.lock();
        state.rcount -= 1;
        if state.rcount == 0 && state.wwait > 0 {
            state.change = -1;
            self.writers.notify_one();
        } else if state.rcount == 0 {
            self.quiescence.notify_all();
        }
    }

    pub(crate) fn enter_writer(&self) {
        let mut state = self.state.lock();
        while state.change != -1 && (state.wcount > 0 || state.rcount > 0) {
            state.wwait += 1;
            self.writers.wait(&mut state);
            state.wwait -= 1;
        }
        state.wcount += 1;
        state.change = 0;
    }

    pub(crate) fn exit_writer(&self) {
        let mut state = self.state.lock();
        state.wcount -= 1;
        if state.rwait > 0 {
            // Hand over to every reader currently waiting in one batch.
            state.change = state.rwait;
            self.readers.notify_one();
        } else if state.wwait > 0 {
            state.change = -1;
            self.writers.notify_one();
        } else {
            self.quiescence.notify_all();
        }
    }

    /// Blocks until no thread is holding or waiting for this node in any
    /// role. Safe to call while holding this node's parent as a writer:
    /// with the parent locked, no new operation can reach this node, so
    /// once it goes quiet it stays quiet.
    pub(crate) fn wait_quiescent(&self) {
        let mut state = self.state.lock();
        while state.rcount != 0 || state.rwait != 0 || state.wcount != 0 || state.wwait != 0 {
            self.quiescence.wait(&mut state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn readers_run_concurrently() {
        let sync = Arc::new(NodeSync::new());
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sync = Arc::clone(&sync);
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                thread::spawn(move || {
                    sync.enter_reader();
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(10));
                    active.fetch_sub(1, Ordering::SeqCst);
                    sync.exit_reader();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) > 1, "readers should overlap");
    }

    #[test]
    fn writer_excludes_everyone() {
        let sync = Arc::new(NodeSync::new());
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..6 {
            let sync = Arc::clone(&sync);
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            handles.push(thread::spawn(move || {
                if i % 2 == 0 {
                    sync.enter_writer();
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    active.fetch_sub(1, Ordering::SeqCst);
                    sync.exit_writer();
                } else {
                    sync.enter_reader();
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    active.fetch_sub(1, Ordering::SeqCst);
                    sync.exit_reader();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1, "writers must exclude readers and other writers");
    }

    #[test]
    fn quiescence_wait_returns_once_idle() {
        let sync = Arc::new(NodeSync::new());
        sync.enter_reader();
        let waiter = {
            let sync = Arc::clone(&sync);
            thread::spawn(move || sync.wait_quiescent())
        };
        thread::sleep(Duration::from_millis(20));
        sync.exit_reader();
        waiter.join().unwrap();
    }
}
