pub mod contact;
pub mod user;

pub use contact::{Contact, InquiryKind, NewContact};
pub use user::{NewUser, ProfileChanges, Role, User};
