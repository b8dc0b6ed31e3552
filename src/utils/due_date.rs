use chrono::NaiveDate;

use crate::utils::validate::is_canonical_due_date;

/// 格式化截止日期标签，如 `Due: Mar 01, 2024`
///
/// 非 `YYYY-MM-DD` 或日历上不存在的日期原样输出。
pub fn format_due_label(due_date: &str) -> String {
    if is_canonical_due_date(due_date) {
        if let Ok(date) = NaiveDate::parse_from_str(due_date, "%Y-%m-%d") {
            return format!("Due: {}", date.format("%b %d, %Y"));
        }
    }
    format!("Due: {due_date}")
}
