pub mod config;
pub mod errors;
pub mod export;
pub mod flow;
pub mod init;
pub mod logging;
pub mod nominee;
pub mod portal;
pub mod record;
pub mod resolver;
pub mod signature;
pub mod steps;
pub mod store;
pub mod validator;
