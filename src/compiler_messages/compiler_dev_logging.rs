// Extra timer logging
#[macro_export]
#[cfg(feature = "detailed_timers")]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => {
        saying::say!($msg, Green #$time.elapsed());
    };
}

#[macro_export]
#[cfg(not(feature = "detailed_timers"))]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => {
        // Nothing
    };
}

// OWNERSHIP ANALYSIS LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_ownership")]
macro_rules! ownership_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_ownership"))]
macro_rules! ownership_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}
