pub mod config;
pub mod contact;
pub mod error;
pub mod server;
pub mod store;
pub mod uploads;

use std::env::var_os;
use std::path::PathBuf;

pub fn data_path_from_env() -> PathBuf {
    var_os("DATA_PATH").map_or_else(|| PathBuf::from("."), PathBuf::from)
}
