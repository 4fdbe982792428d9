pub mod cache;
pub mod cid;
pub mod config;
pub mod group;
pub mod item;
pub mod note;
pub mod setup;
