pub mod notifier;

pub use notifier::{EmailSender, NotificationEvent, OutgoingEmail};
