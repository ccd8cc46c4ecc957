use anyhow::Result;
use std::io::{self, Write};
use std::process;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use signal_hook::consts::{SIGINT, SIGTERM};

#[cfg(unix)]
use signal_hook::iterator::Signals;

#[cfg(windows)]
use signal_hook::flag;

/// Standard Unix exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidUsage = 2,
    Timeout = 124,    // same as coreutils timeout(1)
    SignalInt = 130,  // 128 + SIGINT (2)
    SignalPipe = 141, // 128 + SIGPIPE (13)
    SignalTerm = 143, // 128 + SIGTERM (15)
}

impl ExitCode {
    /// Conventional `128 + signo` code for a terminating signal.
    pub fn from_signal(signal: i32) -> Self {
        match signal {
            SIGTERM => ExitCode::SignalTerm,
            _ => ExitCode::SignalInt,
        }
    }

    pub fn exit(self) -> ! {
        process::exit(self as i32)
    }
}

/// Why a run stopped before producing a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Interrupted {
    #[error("processing was cancelled")]
    Cancelled,
    #[error("processing deadline exceeded")]
    DeadlineExceeded,
}

/// Shared cancellation state with an optional deadline.
///
/// Cloning is cheap; all clones observe the same cancel flag.
#[derive(Debug, Clone, Default)]
pub struct CancelContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelContext {
    /// A context that is never cancelled unless `cancel` is called.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the interruption if the context has been cancelled or its
    /// deadline has passed. An explicit cancel wins over an expired deadline.
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.cancelled.load(Ordering::Acquire) {
            return Err(Interrupted::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Interrupted::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    pub fn is_done(&self) -> bool {
        self.check().is_err()
    }
}

/// Signal handler that turns SIGINT/SIGTERM into a cancellation.
///
/// The first signal cancels the context so in-flight work stops at its next
/// poll; a second one exits immediately.
pub struct SignalHandler {
    received: Arc<AtomicI32>,
    _handle: thread::JoinHandle<()>,
}

impl SignalHandler {
    pub fn new(ctx: CancelContext) -> Result<Self> {
        let received = Arc::new(AtomicI32::new(0));

        #[cfg(unix)]
        {
            let mut signals = Signals::new([SIGINT, SIGTERM])?;
            let last = Arc::clone(&received);

            let handle = thread::spawn(move || {
                let mut shutdown_count = 0;
                for sig in signals.forever() {
                    shutdown_count += 1;
                    tracing::warn!(signal = sig, "received signal, cancelling");
                    last.store(sig, Ordering::Relaxed);
                    ctx.cancel();
                    if shutdown_count > 1 {
                        ExitCode::from_signal(sig).exit();
                    }
                }
            });

            Ok(SignalHandler {
                received,
                _handle: handle,
            })
        }

        #[cfg(windows)]
        {
            let term_flag = Arc::new(AtomicBool::new(false));
            flag::register(SIGINT, Arc::clone(&term_flag))?;
            let last = Arc::clone(&received);

            let handle = thread::spawn(move || {
                let mut shutdown_count = 0;
                loop {
                    thread::sleep(Duration::from_millis(100));
                    if term_flag.swap(false, Ordering::Relaxed) {
                        shutdown_count += 1;
                        last.store(SIGINT, Ordering::Relaxed);
                        ctx.cancel();
                        if shutdown_count > 1 {
                            ExitCode::SignalInt.exit();
                        }
                    }
                }
            });

            Ok(SignalHandler {
                received,
                _handle: handle,
            })
        }
    }

    /// The most recent signal delivered, if any.
    pub fn received(&self) -> Option<i32> {
        match self.received.load(Ordering::Relaxed) {
            0 => None,
            sig => Some(sig),
        }
    }

    /// Exit code for a run that was cancelled by a signal.
    pub fn exit_code(&self) -> ExitCode {
        self.received()
            .map(ExitCode::from_signal)
            .unwrap_or(ExitCode::SignalInt)
    }
}

/// Safe wrapper for writing to stdout that handles broken pipes
pub struct SafeStdout {
    stdout: io::Stdout,
}

impl SafeStdout {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
        }
    }

    pub fn writeln(&mut self, data: &str) -> Result<()> {
        match writeln!(self.stdout, "{}", data) {
            Ok(()) => Ok(()),
            // Broken pipe is normal in pipelines - exit quietly
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => ExitCode::SignalPipe.exit(),
            Err(e) => Err(anyhow::anyhow!("Failed to write to stdout: {}", e)),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        match self.stdout.flush() {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => ExitCode::SignalPipe.exit(),
            Err(e) => Err(anyhow::anyhow!("Failed to flush stdout: {}", e)),
        }
    }
}

impl Default for SafeStdout {
    fn default() -> Self {
        Self::new()
    }
}
