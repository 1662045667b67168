//! Remote file management
//!
//! DELE, RNFR/RNTO, SIZE and SITE.

mod operations;

pub use operations::{delete_file, file_size, rename_file, site_command};
