//! 时间工具模块

use chrono::Utc;

/// 当前 unix 时间戳 (秒)
pub fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// 从现在起 `secs` 秒后的截止时间
pub fn deadline_after(secs: u64) -> u64 {
    unix_now().saturating_add(secs)
}

/// 当前 UTC 时间 (RFC3339)
pub fn now_utc_str() -> String {
    Utc::now().to_rfc3339()
}
