//! Presentation: pure render functions over state snapshots.
//!
//! HTML components produce fragments with BEM-style class names
//! (`chat-message__author`, `header__dot--online`). No business rules live
//! here; every message body goes through `sanitize::process_message`, and
//! every other interpolated string through `sanitize::escape_html`.

pub mod banner;
pub mod composer;
pub mod header;
pub mod login;
pub mod message;
pub mod message_list;
pub mod page;
pub mod terminal;

pub use composer::Composer;
