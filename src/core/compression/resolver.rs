// Choosing an archive adapter for an existing file

use std::sync::Arc;

use log::debug;

use crate::core::compression::common::{base_name, ArchiveAdapter, ArchiveKind, TarCompression};
use crate::core::compression::sevenz_handler::SevenZAdapter;
use crate::core::compression::tar_handler::TarAdapter;
use crate::core::compression::zip_handler::ZipAdapter;
use crate::core::file_ops::FileInformation;
use crate::models::FilterError;

/// Adapter implementing `kind`
pub fn adapter_for(kind: ArchiveKind) -> Arc<dyn ArchiveAdapter> {
    match kind {
        ArchiveKind::Zip => Arc::new(ZipAdapter::new()),
        ArchiveKind::Tar(compression) => Arc::new(TarAdapter::new(compression)),
        ArchiveKind::SevenZ => Arc::new(SevenZAdapter::new()),
    }
}

pub trait ArchiveAdapterResolver: Send + Sync {
    /// Adapter able to read `file`; `UnsupportedArchive` when none fits
    fn resolve(&self, file: &FileInformation) -> Result<Arc<dyn ArchiveAdapter>, FilterError>;
}

/// Resolve by file name
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExtensionArchiveAdapterResolver;

impl FileExtensionArchiveAdapterResolver {
    pub fn new() -> Self {
        Self
    }

    /// Archive kind for a file name, matched case-insensitively
    pub fn kind_for_name(name: &str) -> Result<ArchiveKind, FilterError> {
        let name = base_name(name).to_lowercase();

        // "backuptar.gz" counts as a gzip tarball too
        if name.ends_with("tar.gz") {
            return Ok(ArchiveKind::Tar(TarCompression::Gz));
        }
        if name.ends_with("tar.bz2") {
            return Ok(ArchiveKind::Tar(TarCompression::Bz2));
        }

        let extension = match name.rfind('.') {
            Some(dot) => &name[dot + 1..],
            None => name.as_str(),
        };
        match extension {
            "zip" | "zipx" => Ok(ArchiveKind::Zip),
            "tar" => Ok(ArchiveKind::Tar(TarCompression::None)),
            "tgz" => Ok(ArchiveKind::Tar(TarCompression::Gz)),
            "tbz2" | "tbz" => Ok(ArchiveKind::Tar(TarCompression::Bz2)),
            "7z" => Ok(ArchiveKind::SevenZ),
            other => Err(FilterError::UnsupportedArchive(format!(
                "Cannot handle the filename extension {}",
                other
            ))),
        }
    }
}

impl ArchiveAdapterResolver for FileExtensionArchiveAdapterResolver {
    fn resolve(&self, file: &FileInformation) -> Result<Arc<dyn ArchiveAdapter>, FilterError> {
        let kind = Self::kind_for_name(&file.base_name)?;
        debug!("Resolved {} as {} by extension", file.path.display(), kind);
        Ok(adapter_for(kind))
    }
}

/// Resolve by sniffed content type
#[derive(Debug, Clone, Copy, Default)]
pub struct MimeTypeArchiveAdapterResolver;

impl MimeTypeArchiveAdapterResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn kind_for_mime_type(mime_type: &str) -> Result<ArchiveKind, FilterError> {
        match mime_type {
            "application/zip" => Ok(ArchiveKind::Zip),
            "application/x-tar" => Ok(ArchiveKind::Tar(TarCompression::None)),
            "application/x-7z-compressed" => Ok(ArchiveKind::SevenZ),
            other => Err(FilterError::UnsupportedArchive(format!(
                "Cannot handle the mime type {}",
                other
            ))),
        }
    }
}

impl ArchiveAdapterResolver for MimeTypeArchiveAdapterResolver {
    fn resolve(&self, file: &FileInformation) -> Result<Arc<dyn ArchiveAdapter>, FilterError> {
        let kind = Self::kind_for_mime_type(file.detect_mime_type())?;
        debug!("Resolved {} as {} by content type", file.path.display(), kind);
        Ok(adapter_for(kind))
    }
}

/// Try several resolvers in turn
pub struct AggregateArchiveAdapterResolver {
    resolvers: Vec<Box<dyn ArchiveAdapterResolver>>,
}

impl AggregateArchiveAdapterResolver {
    pub fn new(resolvers: Vec<Box<dyn ArchiveAdapterResolver>>) -> Self {
        Self { resolvers }
    }
}

/// Content type first, then file name
impl Default for AggregateArchiveAdapterResolver {
    fn default() -> Self {
        Self::new(vec![
            Box::new(MimeTypeArchiveAdapterResolver::new()),
            Box::new(FileExtensionArchiveAdapterResolver::new()),
        ])
    }
}

impl ArchiveAdapterResolver for AggregateArchiveAdapterResolver {
    fn resolve(&self, file: &FileInformation) -> Result<Arc<dyn ArchiveAdapter>, FilterError> {
        for resolver in &self.resolvers {
            match resolver.resolve(file) {
                Ok(adapter) => return Ok(adapter),
                Err(e) => debug!("Resolver fell through for {}: {}", file.path.display(), e),
            }
        }
        Err(FilterError::UnsupportedArchive(format!(
            "No matchers were able to resolve the file {}",
            file.path.display()
        )))
    }
}
