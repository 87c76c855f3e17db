use std::sync::{Mutex, MutexGuard};

use tracing::warn;

/// Lock a slot, taking over the guard if a previous holder panicked.
pub(crate) fn lock_or_recover<'a, T>(
    lock: &'a Mutex<T>,
    slot: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        warn!(
            op,
            slot,
            result = "poisoned_recovered",
            "Recovered from poisoned slot lock; contents may predate the panic"
        );
        poisoned.into_inner()
    })
}
