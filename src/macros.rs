//! Macros Used Throughout the Library

/// Convenience macro to log messages at provided level and to print them to `stderr`
///
/// # Example
/// `log_and_stderr!(info, "Sweeping expired keys every", "100 ms");`
#[macro_export]
macro_rules! log_and_stderr {
    ($level:ident, $msg:expr) => {
        log::$level!("{}", $msg);
        eprintln!("{}", $msg);
    };
    ($level:ident, $msg:expr, $arg:expr) => {
        log::$level!("{} {}", $msg, $arg);
        eprintln!("{} {}", $msg, $arg);
    };
}
