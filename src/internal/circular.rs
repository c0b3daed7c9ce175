//! Circular dependency detection and build coordination.

use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::FutureExt;
use parking_lot::Mutex;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::registration::Map;

thread_local! {
    static CURRENT: Cell<Option<ChainId>> = const { Cell::new(None) };
}

/// Identity of one top-level resolution request and every nested lookup it
/// makes.
///
/// While a chain is building, it is bound to the running thread (and to each
/// poll of its future), so a lookup made from inside a factory joins the
/// chain even when it goes through another handle to the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ChainId(u64);

impl ChainId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ChainId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The chain bound to this thread, or a fresh one.
    pub(crate) fn current_or_next() -> Self {
        CURRENT.with(Cell::get).unwrap_or_else(Self::next)
    }

    /// Binds this chain to the thread until the returned guard drops.
    pub(crate) fn make_current(self) -> CurrentChain {
        let previous = CURRENT.with(|current| current.replace(Some(self)));
        CurrentChain { previous }
    }

    /// Wraps `future` so that every poll runs with this chain bound.
    pub(crate) fn bind<F: Future + Unpin>(self, future: F) -> Bound<F> {
        Bound { chain: self, inner: future }
    }
}

pub(crate) struct CurrentChain {
    previous: Option<ChainId>,
}

impl Drop for CurrentChain {
    fn drop(&mut self) {
        CURRENT.with(|current| current.set(self.previous));
    }
}

pub(crate) struct Bound<F> {
    chain: ChainId,
    inner: F,
}

impl<F: Future + Unpin> Future for Bound<F> {
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let _current = self.chain.make_current();
        self.inner.poll_unpin(cx)
    }
}

/// A key as cached by one container of a scope tree.
pub(crate) type Slot = (u64, Key);

struct Building {
    chain: ChainId,
    deferred: bool,
    waiters: Vec<oneshot::Sender<()>>,
}

#[derive(Default)]
struct State {
    chains: Map<ChainId, Vec<Slot>>,
    building: Map<Slot, Building>,
    // (waiting chain, chain it waits for)
    waits: Vec<(ChainId, ChainId)>,
}

impl State {
    /// True when `from` already waits, directly or transitively, on `target`.
    fn waits_on(&self, from: ChainId, target: ChainId) -> bool {
        let mut pending = vec![from];
        let mut seen = Vec::new();
        while let Some(chain) = pending.pop() {
            if chain == target {
                return true;
            }
            if seen.contains(&chain) {
                continue;
            }
            seen.push(chain);
            pending.extend(self.waits.iter().filter(|(w, _)| *w == chain).map(|(_, on)| *on));
        }
        false
    }

    fn cycle(&self, chain: ChainId, from: usize, key: &Key) -> DiError {
        let stack = self.chains.get(&chain).map(Vec::as_slice).unwrap_or_default();
        let mut path: Vec<String> = stack[from.min(stack.len())..].iter().map(|(_, k)| k.to_string()).collect();
        path.push(key.to_string());
        DiError::Circular { path }
    }
}

/// Outcome of asking to build a slot.
pub(crate) enum Entered {
    /// The caller builds; the guard releases the slot when dropped.
    Build(InFlightGuard),
    /// Another chain is building a cached slot; wait, then look again.
    Wait(Waiter),
}

/// Keys currently being built in one scope tree.
///
/// Shared by every container of the tree and by every outstanding
/// [`InFlightGuard`], so a guard held by a suspended future still releases
/// its slot when dropped.
#[derive(Clone, Default)]
pub(crate) struct InFlight {
    state: Arc<Mutex<State>>,
}

impl InFlight {
    /// Marks `slot` as being built on `chain`.
    ///
    /// Fails with `Circular` when the slot is already in flight on the chain,
    /// or when waiting for another chain would wait on this one. Fails with
    /// `DepthExceeded` when `max_depth` slots are already in flight on the
    /// chain. A cached slot held by another chain yields [`Entered::Wait`],
    /// unless a synchronous caller would wait on a deferred build, which is
    /// `SyncAgainstAsync`.
    pub(crate) fn enter(
        &self,
        chain: ChainId,
        slot: Slot,
        cached: bool,
        deferred: bool,
        max_depth: usize,
    ) -> DiResult<Entered> {
        let mut state = self.state.lock();

        let depth = match state.chains.get(&chain) {
            Some(stack) => {
                if let Some(pos) = stack.iter().position(|s| *s == slot) {
                    return Err(state.cycle(chain, pos, &slot.1));
                }
                stack.len()
            }
            None => 0,
        };

        if cached {
            if let Some((owner, async_build)) = state.building.get(&slot).map(|b| (b.chain, b.deferred)) {
                if owner != chain {
                    if state.waits_on(owner, chain) {
                        return Err(state.cycle(chain, 0, &slot.1));
                    }
                    if async_build && !deferred {
                        return Err(DiError::SyncAgainstAsync(slot.1.to_string()));
                    }
                    let (tx, rx) = oneshot::channel();
                    if let Some(building) = state.building.get_mut(&slot) {
                        building.waiters.push(tx);
                    }
                    state.waits.push((chain, owner));
                    return Ok(Entered::Wait(Waiter {
                        state: self.state.clone(),
                        edge: (chain, owner),
                        done: Some(rx),
                    }));
                }
            }
        }

        if depth >= max_depth {
            return Err(DiError::DepthExceeded(depth));
        }

        state.chains.entry(chain).or_default().push(slot.clone());
        if cached {
            state.building.insert(
                slot.clone(),
                Building {
                    chain,
                    deferred,
                    waiters: Vec::new(),
                },
            );
        }
        Ok(Entered::Build(InFlightGuard {
            state: self.state.clone(),
            chain,
            slot,
            cached,
        }))
    }

    /// Slots in flight across all chains.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.state.lock().chains.values().map(Vec::len).sum()
    }
}

/// Releases its slot on drop, on every exit path, and wakes any waiters.
pub(crate) struct InFlightGuard {
    state: Arc<Mutex<State>>,
    chain: ChainId,
    slot: Slot,
    cached: bool,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if let Some(stack) = state.chains.get_mut(&self.chain) {
            if let Some(pos) = stack.iter().rposition(|s| *s == self.slot) {
                stack.remove(pos);
            }
            if stack.is_empty() {
                state.chains.remove(&self.chain);
            }
        }
        if self.cached && state.building.get(&self.slot).is_some_and(|b| b.chain == self.chain) {
            if let Some(building) = state.building.remove(&self.slot) {
                for waiter in building.waiters {
                    let _ = waiter.send(());
                }
            }
        }
    }
}

/// Pending wait for another chain's build of the same slot.
pub(crate) struct Waiter {
    state: Arc<Mutex<State>>,
    edge: (ChainId, ChainId),
    done: Option<oneshot::Receiver<()>>,
}

impl Waiter {
    /// Blocks the thread until the other build finishes or fails.
    pub(crate) fn wait_blocking(mut self) {
        if let Some(done) = self.done.take() {
            let _ = futures::executor::block_on(done);
        }
    }

    /// Resolves once the other build finishes or fails.
    pub(crate) async fn wait(mut self) {
        if let Some(done) = self.done.take() {
            let _ = done.await;
        }
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if let Some(pos) = state.waits.iter().position(|edge| *edge == self.edge) {
            state.waits.remove(pos);
        }
    }
}
