use serde::{Deserialize, Serialize};

use crate::errors::{Result, StoreError};

// 生命周期分区
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Current,   // 待完成
    Completed, // 已完成
}

impl Bucket {
    pub const CURRENT: &'static str = "current";
    pub const COMPLETED: &'static str = "completed";

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Current => Self::CURRENT,
            Bucket::Completed => Self::COMPLETED,
        }
    }

    /// 该分区内的作业应有的 completed 标记
    pub fn completed_flag(&self) -> bool {
        matches!(self, Bucket::Completed)
    }
}

impl<'de> Deserialize<'de> for Bucket {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Bucket {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            Bucket::CURRENT => Ok(Bucket::Current),
            Bucket::COMPLETED => Ok(Bucket::Completed),
            _ => Err(format!(
                "Invalid bucket: '{s}'. Supported buckets: current, completed"
            )),
        }
    }
}

// 单个作业的生命周期状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentState {
    Current,
    Completed,
    Deleted, // 终态
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Complete,
    Delete,
}

impl AssignmentState {
    /// 分区内记录所处的状态
    pub fn of_bucket(bucket: Bucket) -> Self {
        match bucket {
            Bucket::Current => AssignmentState::Current,
            Bucket::Completed => AssignmentState::Completed,
        }
    }

    /// 应用一次生命周期转换
    ///
    /// 合法转换：current → completed，current/completed → deleted。
    pub fn apply(self, action: LifecycleAction) -> Result<Self> {
        match (self, action) {
            (AssignmentState::Current, LifecycleAction::Complete) => Ok(AssignmentState::Completed),
            (AssignmentState::Current | AssignmentState::Completed, LifecycleAction::Delete) => {
                Ok(AssignmentState::Deleted)
            }
            (state, action) => Err(StoreError::validation(format!(
                "Invalid lifecycle transition: {action:?} from {state:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    // 唯一 ID，由上游创建时分配
    pub id: String,
    // 课程名
    pub course: String,
    // 作业描述
    pub details: String,
    // 截止日期 YYYY-MM-DD
    #[serde(rename = "dueDate")]
    pub due_date: String,
    // 是否已完成
    pub completed: bool,
}

impl Assignment {
    pub fn state(&self) -> AssignmentState {
        if self.completed {
            AssignmentState::Completed
        } else {
            AssignmentState::Current
        }
    }

    /// 标记为已完成，返回完成后的副本
    pub fn into_completed(mut self) -> Result<Self> {
        self.state().apply(LifecycleAction::Complete)?;
        self.completed = true;
        Ok(self)
    }
}
