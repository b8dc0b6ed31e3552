pub mod assignments;
pub mod users;

pub use assignments::entities::{Assignment, AssignmentState, Bucket, LifecycleAction};
pub use users::entities::UserId;
