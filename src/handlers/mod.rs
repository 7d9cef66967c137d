pub mod admin;
pub mod contact;
pub mod health;
pub mod login;
pub mod logout;
pub mod password_reset;
pub mod profile;
pub mod register;

pub use admin::{create_user, delete_user, list_users};
pub use contact::{list_contacts, submit_contact, submit_investment_inquiry};
pub use health::health_check;
pub use login::login;
pub use logout::logout;
pub use password_reset::{forgot_password, reset_password};
pub use profile::update_profile;
pub use register::register;
