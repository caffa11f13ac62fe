//! In-process logger keeping the most recent lines in a ring buffer.

use std::fmt::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Green,
    Red,
    Gold,
    Gray,
}

impl Color {
    fn ansi(self) -> &'static str {
        match self {
            Color::Green => "\x1b[92m",
            Color::Red => "\x1b[91m",
            Color::Gold => "\x1b[93m",
            Color::Gray => "\x1b[37m",
        }
    }
}

#[macro_export]
macro_rules! notify {
    () => {};

    ($($arg:tt)*) => {{
        $crate::logger().append(format!($($arg)*), $crate::Color::Green);
    }};
}

#[macro_export]
macro_rules! strong {
    () => {};

    ($($arg:tt)*) => {{
        $crate::logger().append(format!($($arg)*), $crate::Color::Red);
    }};
}

#[macro_export]
macro_rules! warning {
    () => {};

    ($($arg:tt)*) => {{
        $crate::logger().append(format!($($arg)*), $crate::Color::Gold);
    }};
}

/// Only recorded once tracing has been turned on with [`set_tracing`], the
/// arguments aren't even formatted otherwise.
#[macro_export]
macro_rules! trace {
    () => {};

    ($($arg:tt)*) => {{
        if $crate::tracing() {
            $crate::logger().append(format!($($arg)*), $crate::Color::Gray);
        }
    }};
}

pub static LOGGER: Lazy<Mutex<Logger<300>>> = Lazy::new(|| Mutex::new(Logger::new()));

static TRACING: AtomicBool = AtomicBool::new(false);

/// Lock the global logger. A panic while holding the lock doesn't lose the
/// lines logged so far.
pub fn logger() -> MutexGuard<'static, Logger<300>> {
    LOGGER.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn set_tracing(enabled: bool) {
    TRACING.store(enabled, Ordering::Relaxed);
}

#[inline]
pub fn tracing() -> bool {
    TRACING.load(Ordering::Relaxed)
}

pub struct Logger<const N: usize> {
    lines: [(String, Color); N],
    head: usize,
    len: usize,
}

impl<const N: usize> Logger<N> {
    fn new() -> Self {
        Self {
            lines: std::array::from_fn(|_| (String::new(), Color::Gray)),
            head: 0,
            len: 0,
        }
    }

    pub fn append(&mut self, line: String, color: Color) {
        self.lines[self.head] = (line + "\n", color);
        self.head = (self.head + 1) % N;
        self.len += 1;
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len.min(N)
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn lines(&self) -> (&[(String, Color)], &[(String, Color)]) {
        if self.len < N {
            (&self.lines[0..self.len], &[])
        } else {
            // wrapped around, so we need to return two slices
            let (a, b) = self.lines.split_at(self.head);

            (b, a)
        }
    }

    /// Every line still in the buffer, oldest first, optionally wrapped in
    /// ANSI color escapes.
    pub fn format(&self, colored: bool) -> String {
        let mut out = String::new();
        let lines = self.lines();

        for (line, color) in lines.0.iter().chain(lines.1) {
            if colored {
                let _ = write!(out, "{}{}\x1b[0m", color.ansi(), line.trim_end());
                out.push('\n');
            } else {
                out.push_str(line);
            }
        }

        out
    }

    /// Format and empty the buffer.
    pub fn drain(&mut self, colored: bool) -> String {
        let out = self.format(colored);
        self.clear();
        out
    }
}
