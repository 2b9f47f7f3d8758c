//! Ordered, run-once teardown.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared, join_all};
use parking_lot::Mutex;

/// A cleanup action. Called at most once.
pub type DestroyHandler = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Completion signal shared by every caller of [`DestroyChain::destroy`]
pub type Teardown = Shared<BoxFuture<'static, ()>>;

enum ChainState {
    Live(Vec<DestroyHandler>),
    Claimed(Teardown),
}

/// Cleanup actions registered during the live phase of a view.
///
/// The first `destroy()` swaps the handler list out under the lock before any
/// handler runs; later calls get a clone of the same [`Teardown`].
pub struct DestroyChain {
    state: Mutex<ChainState>,
}

impl Default for DestroyChain {
    fn default() -> Self {
        Self::new()
    }
}

impl DestroyChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState::Live(Vec::new())),
        }
    }

    /// Register a handler. If teardown already started it runs right away.
    pub fn add(&self, handler: DestroyHandler) {
        {
            let mut state = self.state.lock();
            if let ChainState::Live(handlers) = &mut *state {
                handlers.push(handler);
                return;
            }
        }

        tracing::debug!("destroy handler registered after teardown, running immediately");
        run_detached(handler());
    }

    pub fn add_sync(&self, handler: impl FnOnce() + Send + 'static) {
        self.add(Box::new(move || {
            handler();
            futures::future::ready(()).boxed()
        }));
    }

    /// Claim the chain and run every handler, newest first, concurrently.
    pub fn destroy(&self) -> Teardown {
        let teardown = {
            let mut state = self.state.lock();
            let handlers = match &mut *state {
                ChainState::Claimed(teardown) => return teardown.clone(),
                ChainState::Live(handlers) => std::mem::take(handlers),
            };

            let teardown = async move {
                let pending: Vec<_> = handlers.into_iter().rev().map(|handler| handler()).collect();
                join_all(pending).await;
            }
            .boxed()
            .shared();

            *state = ChainState::Claimed(teardown.clone());
            teardown
        };

        // Start the handlers now, outside the lock; async remainders finish
        // when any caller awaits the teardown.
        let _ = teardown.clone().now_or_never();
        teardown
    }

    pub fn is_claimed(&self) -> bool {
        matches!(*self.state.lock(), ChainState::Claimed(_))
    }

    pub fn len(&self) -> usize {
        match &*self.state.lock() {
            ChainState::Live(handlers) => handlers.len(),
            ChainState::Claimed(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn run_detached(mut future: BoxFuture<'static, ()>) {
    if (&mut future).now_or_never().is_some() {
        return;
    }
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(future);
        }
        Err(_) => futures::executor::block_on(future),
    }
}
