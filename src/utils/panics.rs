//! Panic containment for code the resolver does not control.
//!
//! Catching a panic with `catch_unwind` stops it from unwinding further, but the
//! process-wide panic hook has already printed its report by then. Futures
//! wrapped in [`silenced`] are polled with the report suppressed on the polling
//! thread; every other panic is reported by the previously installed hook.

use std::any::Any;
use std::cell::Cell;
use std::future::Future;
use std::sync::Once;

thread_local! {
    static SILENCED: Cell<bool> = const { Cell::new(false) };
}

static INSTALL_HOOK: Once = Once::new();

fn install_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = std::panic::take_hook();

        std::panic::set_hook(Box::new(move |info| {
            if !SILENCED.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

/// Restores the previous state when dropped, including while unwinding.
struct Silence {
    previous: bool,
}

impl Silence {
    fn enter() -> Silence {
        Silence {
            previous: SILENCED.with(|s| s.replace(true)),
        }
    }
}

impl Drop for Silence {
    fn drop(&mut self) {
        SILENCED.with(|s| s.set(self.previous));
    }
}

/// Polls `fut` without a panic report. A panic still unwinds out of the
/// returned future and must be caught by the caller.
pub(crate) fn silenced<F: Future>(fut: F) -> impl Future<Output = F::Output> {
    install_hook();

    let mut fut = Box::pin(fut);

    futures_util::future::poll_fn(move |cx| {
        let _silence = Silence::enter();

        fut.as_mut().poll(cx)
    })
}

/// The message a panic was raised with, when it has one.
pub(crate) fn message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
