//! Buffers ledger log lines so a host UI can drain and show them; every line is also
//! forwarded to the `log` facade.

use log::Level;
use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::sync::Mutex;

static LEDGER_LOG_BUFFER: Lazy<Mutex<VecDeque<String>>> = Lazy::new(|| Mutex::new(VecDeque::new()));

const MAX_BUFFER_LEN: usize = 500;

fn should_buffer(level: Level, s: &str) -> bool {
    if level <= Level::Warn {
        return true;
    }
    if level > Level::Info {
        return false;
    }
    // Keep store mutations, add flows and migrations; drop the rest to reduce noise.
    ["storage::", "crud::", "migration"].iter().any(|p| s.starts_with(p))
}

/// Push a log line. Called by the `ledger_log!` macro.
pub fn push(level: Level, s: String) {
    log::log!(target: "loanbook", level, "{}", s);
    if !should_buffer(level, &s) {
        return;
    }
    if let Ok(mut v) = LEDGER_LOG_BUFFER.lock() {
        v.push_back(s);
        while v.len() > MAX_BUFFER_LEN {
            v.pop_front();
        }
    }
}

/// Drain and clear buffered log lines.
pub fn drain_logs() -> Vec<String> {
    LEDGER_LOG_BUFFER
        .lock()
        .map(|mut v| v.drain(..).collect())
        .unwrap_or_default()
}

#[macro_export]
macro_rules! ledger_log {
    (warn: $($t:tt)*) => {
        $crate::log_bridge::push(::log::Level::Warn, format!($($t)*))
    };
    (debug: $($t:tt)*) => {
        $crate::log_bridge::push(::log::Level::Debug, format!($($t)*))
    };
    ($($t:tt)*) => {
        $crate::log_bridge::push(::log::Level::Info, format!($($t)*))
    };
}
