//! Logging macros with call-site capture.
//!
//! The macros format the message like `format!`, record `file!()`/`line!()`
//! as the call-site, and accept attributes after a `;` as `key => value` pairs.
//! Nothing is formatted when the level is disabled.
//!
//! # Examples
//!
//! ```
//! use rust_log_facade::prelude::*;
//! use rust_log_facade::info;
//!
//! let logger = Logger::discard();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // With attributes
//! info!(logger, "Request served"; "status" => 200, "path" => "/health");
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use rust_log_facade::prelude::*;
/// # let logger = Logger::discard();
/// use rust_log_facade::log;
/// log!(logger, Level::INFO, "Simple message");
/// log!(logger, Level::ERROR, "Error code: {}", 500; "retry" => false);
/// log!(logger, Level::INFO.offset(2), "Between info and warn");
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $fmt:literal $(, $arg:expr)* $(; $($key:expr => $value:expr),* $(,)?)?) => {{
        let logger = &$logger;
        let level: $crate::core::Level = $level;
        if logger.enabled(level) {
            logger.log_at(
                $crate::core::Source::new(file!(), line!()),
                level,
                format!($fmt $(, $arg)*),
                vec![$($($crate::core::Attr::new($key, $value)),*)?],
            );
        }
    }};
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_facade::prelude::*;
/// # let logger = Logger::discard();
/// # logger.set_level(Level::TRACE);
/// use rust_log_facade::trace;
/// trace!(logger, "Entering function: calculate()");
/// trace!(logger, "Variable value: {}", 42);
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Level::TRACE, $($arg)+)
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_facade::prelude::*;
/// # let logger = Logger::discard();
/// use rust_log_facade::debug;
/// debug!(logger, "Debug information");
/// debug!(logger, "Counter value: {}", 10; "stage" => "warmup");
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Level::DEBUG, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_facade::prelude::*;
/// # let logger = Logger::discard();
/// use rust_log_facade::info;
/// info!(logger, "Application started");
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Level::INFO, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_facade::prelude::*;
/// # let logger = Logger::discard();
/// use rust_log_facade::warn;
/// warn!(logger, "Low disk space"; "free_mb" => 120u64);
/// warn!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Level::WARN, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_facade::prelude::*;
/// # let logger = Logger::discard();
/// use rust_log_facade::error;
/// error!(logger, "Failed to connect to database");
/// error!(logger, "Connection timeout after {} seconds", 30; "host" => "db-1");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Level::ERROR, $($arg)+)
    };
}
