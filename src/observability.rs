//! Structured events.
//!
//! Every event is sent to target `shachi` with two fixed fields: `component`,
//! the subsystem that emitted it, and `event`, a snake_case name. Extra fields
//! follow `tracing` syntax (`%` for Display, `?` for Debug). No subscriber is
//! installed here.
//!
//! | component | event | level |
//! |---|---|---|
//! | `connect` | `retry_scheduled` | debug |
//! | `connect` | `table_connected` | debug |
//! | `connect` | `table_created` | info |
//! | `connect` | `attempt_failed` | warn |
//! | `connect` | `retries_exhausted` | error |
//! | `exec` | `batch_started` | debug |
//! | `exec` | `batch_finished` | debug |
//! | `exec` | `precondition_failed` | info |

pub(crate) const TARGET: &str = "shachi";

/// Table acquisition and creation.
pub(crate) const CONNECT: &str = "connect";
/// Batch execution.
pub(crate) const EXEC: &str = "exec";

/// ```ignore
/// log_event!(Level::INFO, CONNECT, "table_created", table = %name);
/// ```
macro_rules! log_event {
    ($level:expr, $component:expr, $event:literal $(, $($field:tt)*)?) => {
        ::tracing::event!(
            target: $crate::observability::TARGET,
            $level,
            component = $component,
            event = $event
            $(, $($field)*)?
        )
    };
}

macro_rules! log_debug {
    ($($args:tt)*) => {
        $crate::observability::log_event!(::tracing::Level::DEBUG, $($args)*)
    };
}

macro_rules! log_info {
    ($($args:tt)*) => {
        $crate::observability::log_event!(::tracing::Level::INFO, $($args)*)
    };
}

macro_rules! log_warn {
    ($($args:tt)*) => {
        $crate::observability::log_event!(::tracing::Level::WARN, $($args)*)
    };
}

macro_rules! log_error {
    ($($args:tt)*) => {
        $crate::observability::log_event!(::tracing::Level::ERROR, $($args)*)
    };
}

pub(crate) use log_debug;
pub(crate) use log_error;
pub(crate) use log_event;
pub(crate) use log_info;
pub(crate) use log_warn;
