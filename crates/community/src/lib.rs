//! Community content: tips, hashtags, comments, reactions, notifications.

pub mod comment;
pub mod notification;
pub mod reaction;
pub mod tip;

pub use comment::{Comment, NewComment};
pub use notification::{Notification, NotificationKind};
pub use reaction::{Reaction, ReactionKind};
pub use tip::{HashtagCount, NewTip, Tip, TipQuery, TipStats, TipUpdate};
