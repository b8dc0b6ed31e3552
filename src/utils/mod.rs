pub mod due_date;
pub mod retry;
pub mod validate;

pub use due_date::format_due_label;
pub use retry::{RetryPolicy, with_retry};
pub use validate::{is_canonical_due_date, validate_key};
