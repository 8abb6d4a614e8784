//! `critical-section` provider for the device build.
//!
//! The only `critical-section` user in HydraPet is the inbound MQTT channel
//! ([`INBOUND_CHANNEL`](crate::remote::channels::INBOUND_CHANNEL)): the
//! MQTT event task pushes into it and the dispatcher task drains it.  Both
//! run as ESP-IDF pthreads, so a single std mutex is enough to serialise
//! them.  Nesting on one thread is tracked with a per-thread depth counter
//! and only the outermost acquire takes the mutex.
//!
//! The module is only compiled for `target_os = "espidf"` (see `lib.rs`);
//! host tests use `critical-section`'s `std` feature.

use core::cell::{Cell, RefCell};
use std::sync::{Mutex, MutexGuard, PoisonError};

static CHANNEL_LOCK: Mutex<()> = Mutex::new(());

thread_local! {
    static NESTING: Cell<u8> = const { Cell::new(0) };
    static HELD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

fn enter() -> u8 {
    let depth = NESTING.get();
    if depth == 0 {
        // Guards `()`, so a poisoned lock holds nothing stale.
        let guard = CHANNEL_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        HELD.with(|held| *held.borrow_mut() = Some(guard));
    }
    let depth = depth.saturating_add(1);
    NESTING.set(depth);
    depth
}

fn leave() {
    match NESTING.get() {
        0 => {}
        1 => {
            NESTING.set(0);
            HELD.with(|held| drop(held.borrow_mut().take()));
        }
        depth => NESTING.set(depth - 1),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    enter()
}

#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_token: u8) {
    leave();
}
