mod logger;
pub mod retry;
pub mod time_utils;

pub use logger::LoggerManager;
pub use retry::{with_retry, with_retry_if, RetryPolicy};
pub use time_utils::{deadline_after, now_utc_str, unix_now};
