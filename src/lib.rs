pub mod cli;
pub mod clipboard;
pub mod config;
pub mod dom;
pub mod export;
pub mod logging;
pub mod models;
pub mod nav;
pub mod paginate;
pub mod portal;
pub mod submit;
pub mod upload;
