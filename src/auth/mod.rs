pub mod identity;

pub use identity::{ActingUser, USER_ID_HEADER};
