use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{Result, StoreError};

static DUE_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Invalid due date regex"));

/// 存储键的最大字节数
const MAX_KEY_BYTES: usize = 768;

/// 路径中不允许出现的字符
const FORBIDDEN_KEY_CHARS: &[char] = &['/', '.', '#', '$', '[', ']'];

/// 校验作为存储路径一段的键（用户 ID、作业 ID）
pub fn validate_key(kind: &str, key: &str) -> Result<()> {
    // 非空
    if key.is_empty() {
        return Err(StoreError::validation(format!("{kind} must not be empty")));
    }
    // 长度上限
    if key.len() > MAX_KEY_BYTES {
        return Err(StoreError::validation(format!(
            "{kind} must be at most {MAX_KEY_BYTES} bytes"
        )));
    }
    // 不能包含路径分隔符和保留字符
    if let Some(c) = key
        .chars()
        .find(|c| FORBIDDEN_KEY_CHARS.contains(c) || c.is_control())
    {
        return Err(StoreError::validation(format!(
            "{kind} must not contain {c:?}"
        )));
    }
    Ok(())
}

/// 截止日期是否为定宽 `YYYY-MM-DD` 形式
///
/// 只有这种形式下字符串排序才等价于时间排序。
pub fn is_canonical_due_date(due_date: &str) -> bool {
    DUE_DATE_RE.is_match(due_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_keys() {
        assert!(validate_key("assignment id", "-NaB3xYz").is_ok());
        assert!(validate_key("user id", "kT9xQ2_user").is_ok());
    }

    #[test]
    fn test_invalid_keys() {
        assert!(validate_key("assignment id", "").is_err());
        assert!(validate_key("assignment id", "a/b").is_err());
        assert!(validate_key("assignment id", "a.b").is_err());
        assert!(validate_key("assignment id", "a[0]").is_err());
        assert!(validate_key("assignment id", "line\nbreak").is_err());
        assert!(validate_key("assignment id", &"x".repeat(MAX_KEY_BYTES + 1)).is_err());
    }

    #[test]
    fn test_error_names_the_key_kind() {
        let err = validate_key("user id", "").unwrap_err();
        assert_eq!(err.message(), "user id must not be empty");
    }

    #[test]
    fn test_canonical_due_date() {
        assert!(is_canonical_due_date("2024-03-01"));
        assert!(!is_canonical_due_date("2024-3-1"));
        assert!(!is_canonical_due_date("03/01/2024"));
        assert!(!is_canonical_due_date(""));
    }
}
