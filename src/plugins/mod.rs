pub mod traits;
pub mod notifiers;

pub use notifiers::{EmailNotifier, SmtpEmailSender};
pub use traits::{EmailSender, NotificationEvent, OutgoingEmail};
