//! HTTP portal: applicant storage and the JSON API over the onboarding flow.

pub mod api;
pub mod db;
pub mod models;
pub mod server;

pub use db::{DbHandle, PortalDb};
pub use server::{ServerConfig, start_server};
