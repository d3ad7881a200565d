// File system helpers and file filters
pub mod file_case;
pub mod file_info;
pub mod rename;
pub mod scanner;
pub mod temp_manager;

pub use file_case::{FileLowerCase, FileUpperCase};
pub use file_info::FileInformation;
pub use rename::{Rename, RenameOptions, RenameRule};
pub use scanner::{entry_name, DirectoryScanner};
pub use temp_manager::StagingArea;
