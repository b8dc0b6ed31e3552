//! 作业与存储记录之间的转换
//!
//! 读取时按字段名精确匹配，缺失或类型不符的字段回退为空字符串 / false，
//! 并把问题收集到 [`DecodedAssignment::issues`] 中交给调用方记录，
//! 不会让单条坏记录中断整批加载。未知字段忽略。

use serde_json::Value;

use crate::backend::Record;
use crate::models::assignments::entities::{Assignment, Bucket};

pub const FIELD_COURSE: &str = "course";
pub const FIELD_DETAILS: &str = "details";
pub const FIELD_DUE_DATE: &str = "dueDate";
pub const FIELD_COMPLETED: &str = "completed";
pub const FIELD_ID: &str = "ID";

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAssignment {
    pub assignment: Assignment,
    pub issues: Vec<String>,
}

impl DecodedAssignment {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

fn string_field(record: &Record, field: &str, required: bool, issues: &mut Vec<String>) -> String {
    match record.get(field) {
        Some(Value::String(value)) => value.clone(),
        Some(other) => {
            issues.push(format!("field '{field}' is not a string: {other}"));
            String::new()
        }
        None => {
            if required {
                issues.push(format!("missing field '{field}'"));
            }
            String::new()
        }
    }
}

/// 将 `bucket` 分区下键为 `key` 的记录还原为作业
///
/// 作业 ID 取自存储键；completed 标记由所在分区决定。
pub fn decode(key: &str, record: &Record, bucket: Bucket) -> DecodedAssignment {
    let mut issues = Vec::new();

    let course = string_field(record, FIELD_COURSE, true, &mut issues);
    let details = string_field(record, FIELD_DETAILS, false, &mut issues);
    let due_date = string_field(record, FIELD_DUE_DATE, true, &mut issues);

    let expected = bucket.completed_flag();
    match record.get(FIELD_COMPLETED) {
        Some(Value::Bool(flag)) if *flag != expected => issues.push(format!(
            "field '{FIELD_COMPLETED}' is {flag} but record lives in '{bucket}'"
        )),
        Some(Value::Bool(_)) | None => {}
        Some(other) => issues.push(format!("field '{FIELD_COMPLETED}' is not a bool: {other}")),
    }

    match record.get(FIELD_ID) {
        Some(Value::String(id)) if id != key => {
            issues.push(format!("field '{FIELD_ID}' is '{id}' but key is '{key}'"))
        }
        Some(Value::String(_)) | None => {}
        Some(other) => issues.push(format!("field '{FIELD_ID}' is not a string: {other}")),
    }

    DecodedAssignment {
        assignment: Assignment {
            id: key.to_string(),
            course,
            details,
            due_date,
            completed: expected,
        },
        issues,
    }
}

/// 生成写入 `bucket` 分区的记录；completed 分区额外写入 `completed` 与 `ID`
pub fn encode(assignment: &Assignment, bucket: Bucket) -> Record {
    let mut record = Record::new();
    record.insert(
        FIELD_COURSE.to_string(),
        Value::String(assignment.course.clone()),
    );
    record.insert(
        FIELD_DETAILS.to_string(),
        Value::String(assignment.details.clone()),
    );
    record.insert(
        FIELD_DUE_DATE.to_string(),
        Value::String(assignment.due_date.clone()),
    );
    if bucket == Bucket::Completed {
        record.insert(FIELD_COMPLETED.to_string(), Value::Bool(true));
        record.insert(FIELD_ID.to_string(), Value::String(assignment.id.clone()));
    }
    record
}
