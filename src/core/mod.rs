pub mod filter;
pub mod chain;
pub mod registry;
pub mod inflector;
pub mod text;
pub mod word;
pub mod date;
pub mod path;
pub mod file_ops;
pub mod compression;
