pub mod user;
pub mod vcard;
pub mod scan_log;
pub mod notification;
pub mod contact;

pub use user::*;
pub use vcard::*;
pub use scan_log::*;
pub use notification::*;
pub use contact::*;
