//! 时间工具函数 — 业务时区转换
//!
//! 所有日期→时间戳转换统一在 service 层完成，
//! repository 层只接收 `i64` Unix millis。

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use super::AppResult;
use crate::AppError;

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// 日期 + 时分秒毫秒 → Unix millis (业务时区)
///
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，fallback 到 UTC。
pub fn date_hms_to_millis(date: NaiveDate, hour: u32, min: u32, sec: u32, ms: u32, tz: Tz) -> i64 {
    let naive = date.and_hms_milli_opt(hour, min, sec, ms).unwrap();
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 日期开始 (00:00:00.000) → Unix millis (业务时区)
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    date_hms_to_millis(date, 0, 0, 0, 0, tz)
}

/// 日期结束 (23:59:59.999) → Unix millis (业务时区)
///
/// 返回当天最后一毫秒，调用方使用 `<= end` (含) 语义。
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    date_hms_to_millis(date, 23, 59, 59, 999, tz)
}

/// 当前业务时区日期
pub fn today(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Unix millis → 业务时区的 ISO 日期字符串 (YYYY-MM-DD)
pub fn millis_to_date_string(millis: i64, tz: Tz) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&tz).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "1970-01-01".to_string())
}
