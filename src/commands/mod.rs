// Command handlers behind the CLI; errors are reported as strings
pub mod apply;
pub mod archive;
