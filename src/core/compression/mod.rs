// String and archive compression
pub mod common;
pub mod filters;
pub mod resolver;
pub mod string;
pub mod tar_handler;
pub mod zip_handler;

#[path = "7z_handler.rs"]
pub mod sevenz_handler;

pub use common::{ArchiveAdapter, ArchiveKind, TarCompression};
pub use filters::{
    ArchiveFormat, CompressString, CompressToArchive, CompressToArchiveOptions, DecompressArchive,
    DecompressArchiveOptions, DecompressString, StringCodec, StringCompressionOptions,
};
pub use resolver::{
    adapter_for, AggregateArchiveAdapterResolver, ArchiveAdapterResolver, FileExtensionArchiveAdapterResolver,
    MimeTypeArchiveAdapterResolver,
};
pub use sevenz_handler::SevenZAdapter;
pub use string::{Bz2Adapter, GzAdapter, GzMode, StringCompressionAdapter};
pub use tar_handler::TarAdapter;
pub use zip_handler::ZipAdapter;
