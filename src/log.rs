//! Level-tagged logging.
//!
//! Output goes through `esp-println` when the `esp32-log` feature is enabled.
//! Without it every statement compiles away, but its arguments are still
//! type-checked so disabled builds cannot rot.

#[cfg(feature = "esp32-log")]
macro_rules! log_line {
    ($level:literal, $($arg:tt)*) => {
        esp_println::println!("[{}] {}", $level, format_args!($($arg)*))
    };
}

#[cfg(not(feature = "esp32-log"))]
macro_rules! log_line {
    ($level:literal, $($arg:tt)*) => {
        if false {
            let _ = format_args!($($arg)*);
        }
    };
}

macro_rules! debug {
    ($($arg:tt)*) => { log_line!("DEBUG", $($arg)*) };
}

macro_rules! info {
    ($($arg:tt)*) => { log_line!("INFO", $($arg)*) };
}

macro_rules! warn {
    ($($arg:tt)*) => { log_line!("WARN", $($arg)*) };
}
