//! `critical-section` 1.x symbols for the ESP-IDF build.
//!
//! The command channel is an `embassy-sync` channel over
//! `CriticalSectionRawMutex`.  It is pushed from the MQTT client task and
//! drained by the main loop, so the section has to exclude other
//! FreeRTOS tasks, not just interrupts on this core.  A std mutex is
//! taken on the outermost entry and released when the nesting unwinds.

use core::cell::{Cell, RefCell};
use std::sync::{Mutex, MutexGuard, PoisonError};

static SECTION_LOCK: Mutex<()> = Mutex::new(());

struct Nesting {
    depth: Cell<u8>,
    held: RefCell<Option<MutexGuard<'static, ()>>>,
}

thread_local! {
    static NESTING: Nesting = const {
        Nesting {
            depth: Cell::new(0),
            held: RefCell::new(None),
        }
    };
}

#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    NESTING.with(|n| {
        let depth = n.depth.get();
        if depth == 0 {
            // Guards `()`: a poisoned lock carries no broken state.
            let guard = SECTION_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            n.held.replace(Some(guard));
        }
        n.depth.set(depth.saturating_add(1));
        depth
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_restore: u8) {
    NESTING.with(|n| match n.depth.get() {
        0 => {}
        1 => {
            n.depth.set(0);
            n.held.replace(None);
        }
        depth => n.depth.set(depth - 1),
    });
}
