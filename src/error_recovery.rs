//! Fatal error reporting
//!
//! Fail-fast hooks for conditions this crate treats as unrecoverable:
//! allocation failure on the infallible container paths, worker threads that
//! cannot be started, and broken internal invariants.

use crate::error::PrimkitError;

/// Fatal error macro
///
/// Logs the message, prints it with source context and terminates the process.
#[macro_export]
macro_rules! primkit_die {
    ($fmt:expr $(, $args:expr)*) => {
        {
            let msg = format!($fmt $(, $args)*);
            log::error!("{}", msg);
            eprintln!("{}:{}: die: {} !", file!(), line!(), msg);
            std::process::abort();
        }
    };
}

/// Invariant verification macro
///
/// Checks the condition and aborts with context if it does not hold.
/// In test builds it panics instead so the failure is reported by the harness.
#[macro_export]
macro_rules! primkit_verify {
    ($expr:expr) => {
        if !($expr) {
            let msg = format!("{}:{}: verify({}) failed !",
                file!(), line!(), stringify!($expr));
            log::error!("{}", msg);
            #[cfg(test)]
            panic!("{}", msg);
            #[cfg(not(test))]
            std::process::abort();
        }
    };
    ($expr:expr, $fmt:expr $(, $args:expr)*) => {
        if !($expr) {
            let msg = format!("{}:{}: verify({}) failed: {} !",
                file!(), line!(), stringify!($expr),
                format!($fmt $(, $args)*));
            log::error!("{}", msg);
            #[cfg(test)]
            panic!("{}", msg);
            #[cfg(not(test))]
            std::process::abort();
        }
    };
}

/// Report an unrecoverable error and terminate.
///
/// This is the hook used when an infallible operation hits resource
/// exhaustion (allocation or thread creation). It does not return.
#[cold]
#[inline(never)]
pub fn fatal_error(err: &PrimkitError) -> ! {
    primkit_die!("unrecoverable {} failure: {}", err.category(), err)
}
