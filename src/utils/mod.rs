//! Cross-platform utilities and helpers
//!
//! - [`fs`] - JSON documents with atomic writes and timestamped backups
//! - [`platform`] - home directory, path expansion and shell selection

pub mod fs;
pub mod platform;

pub use fs::{
    atomic_write, backup_json_file, ensure_dir, ensure_parent_dir, read_json_file,
    write_json_file,
};
pub use platform::{get_home_dir, is_windows, resolve_path};
