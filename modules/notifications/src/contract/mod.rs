pub mod model;

pub use model::{Audience, NewAddressedNotification, Notification, NotificationKind};
