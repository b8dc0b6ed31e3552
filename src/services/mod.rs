pub mod assignments;
pub mod board;
pub mod identity;

pub use assignments::AssignmentStore;
pub use board::{AssignmentBoard, BoardRow};
pub use identity::{IdentityProvider, StaticIdentity};
