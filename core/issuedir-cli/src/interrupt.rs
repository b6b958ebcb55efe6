//! Ctrl-C as a cooperative cancel flag for the batch loop.

use std::sync::atomic::AtomicBool;

static CANCELLED: AtomicBool = AtomicBool::new(false);

/// Routes SIGINT to the cancel flag. A second Ctrl-C still kills the process.
pub fn install() -> &'static AtomicBool {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGINT, on_sigint as extern "C" fn(libc::c_int) as libc::sighandler_t);
    }
    &CANCELLED
}

#[cfg(unix)]
extern "C" fn on_sigint(_signal: libc::c_int) {
    if CANCELLED.swap(true, std::sync::atomic::Ordering::SeqCst) {
        unsafe {
            libc::signal(libc::SIGINT, libc::SIG_DFL);
            libc::raise(libc::SIGINT);
        }
    }
}
