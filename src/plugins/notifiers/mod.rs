// Notifier implementations
pub mod email;

pub use email::{EmailNotifier, SmtpEmailSender};
