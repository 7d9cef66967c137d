pub mod auth;
pub mod contact;
pub mod email;
pub mod notifier;
pub mod password;
pub mod token;

pub use auth::AuthService;
pub use contact::ContactService;
pub use email::{EmailService, LogMailer, Mailer, MemoryMailer};
pub use notifier::Notifier;
pub use password::PasswordHasher;
pub use token::{Claims, TokenService};
