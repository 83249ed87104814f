pub mod health;
pub mod metrics;
pub mod auth;
pub mod profile;
pub mod vcards;
pub mod scans;
pub mod notifications;
pub mod contact;
pub mod admin;
pub mod swagger;
