//! Navigate module
//!
//! Remote working directory commands: CWD, CDUP, PWD, MKD and RMD.

mod operations;

// Re-export public types and functions
pub use operations::{
    change_directory, change_to_parent, make_directory, parse_pwd_reply,
    print_working_directory, remove_directory,
};
