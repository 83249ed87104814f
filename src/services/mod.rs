pub mod auth_service;
pub mod user_service;
pub mod vcard_service;
pub mod scan_service;
pub mod notification_service;
pub mod admin_service;
pub mod geocode_service;
pub mod email_service;
