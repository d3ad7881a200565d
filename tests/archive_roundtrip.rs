use std::fs;
use std::path::Path;

use tempfile::TempDir;
use value_filter::core::compression::{
    ArchiveFormat, ArchiveKind, CompressString, CompressToArchive, CompressToArchiveOptions, DecompressArchive,
    DecompressArchiveOptions, DecompressString, FileExtensionArchiveAdapterResolver,
    MimeTypeArchiveAdapterResolver, StringCodec, StringCompressionOptions, TarCompression,
};
use value_filter::core::file_ops::FileInformation;
use value_filter::{Filter, FilterError, Value};

const FORMATS: [(ArchiveFormat, TarCompression, &str); 5] = [
    (ArchiveFormat::Zip, TarCompression::Gz, "bundle.zip"),
    (ArchiveFormat::Tar, TarCompression::None, "bundle.tar"),
    (ArchiveFormat::Tar, TarCompression::Gz, "bundle.tar.gz"),
    (ArchiveFormat::Tar, TarCompression::Bz2, "bundle.tar.bz2"),
    (ArchiveFormat::SevenZ, TarCompression::Gz, "bundle.7z"),
];

fn options(archive: &Path, adapter: ArchiveFormat, mode: TarCompression) -> CompressToArchiveOptions {
    let mut options = CompressToArchiveOptions::new(archive.to_string_lossy());
    options.adapter = adapter;
    options.mode = mode;
    options
}

fn build_tree(root: &Path) {
    fs::create_dir_all(root.join("docs/img")).unwrap();
    fs::write(root.join("readme.md"), b"# Bundle\n").unwrap();
    fs::write(root.join("docs/guide.txt"), "déjà vu".as_bytes()).unwrap();
    fs::write(root.join("docs/img/pixel.bin"), [0u8, 159, 146, 150, 255]).unwrap();
}

fn path_value(path: &Path) -> Value {
    Value::from(path.to_string_lossy().as_ref())
}

#[test]
fn directory_round_trips_through_every_format() {
    for (adapter, mode, name) in FORMATS {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        build_tree(&source);

        let archive = temp.path().join(name);
        let compress = CompressToArchive::new(options(&archive, adapter, mode)).unwrap();
        let written = compress.filter(path_value(&source)).unwrap();
        assert_eq!(written, path_value(&archive), "{}", name);

        let target = temp.path().join("target");
        fs::create_dir(&target).unwrap();
        let decompress = DecompressArchive::new(DecompressArchiveOptions {
            target: target.to_string_lossy().into_owned(),
        })
        .unwrap();
        let restored = decompress.filter(path_value(&archive)).unwrap();
        assert_eq!(restored, path_value(&target), "{}", name);

        assert_eq!(fs::read(target.join("readme.md")).unwrap(), b"# Bundle\n", "{}", name);
        assert_eq!(fs::read_to_string(target.join("docs/guide.txt")).unwrap(), "déjà vu", "{}", name);
        assert_eq!(
            fs::read(target.join("docs/img/pixel.bin")).unwrap(),
            [0u8, 159, 146, 150, 255],
            "{}",
            name
        );
    }
}

#[test]
fn string_contents_round_trip_through_every_format() {
    for (adapter, mode, name) in FORMATS {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join(name);

        let mut opts = options(&archive, adapter, mode);
        opts.file_name = Some("note.txt".into());
        CompressToArchive::new(opts)
            .unwrap()
            .filter(Value::from("remember the milk"))
            .unwrap();

        let decompress = DecompressArchive::new(DecompressArchiveOptions {
            target: temp.path().to_string_lossy().into_owned(),
        })
        .unwrap();
        decompress.filter(path_value(&archive)).unwrap();

        assert_eq!(
            fs::read_to_string(temp.path().join("note.txt")).unwrap(),
            "remember the milk",
            "{}",
            name
        );
    }
}

#[test]
fn mime_and_extension_resolution_agree() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    build_tree(&source);

    for (adapter, mode, name) in [FORMATS[0], FORMATS[1], FORMATS[4]] {
        let archive = temp.path().join(name);
        CompressToArchive::new(options(&archive, adapter, mode))
            .unwrap()
            .filter(path_value(&source))
            .unwrap();

        let info = FileInformation::new(archive.clone());
        let by_mime = MimeTypeArchiveAdapterResolver::kind_for_mime_type(info.detect_mime_type()).unwrap();
        let by_name = FileExtensionArchiveAdapterResolver::kind_for_name(name).unwrap();
        assert_eq!(by_mime, by_name, "{}", name);
    }

    assert_eq!(
        FileExtensionArchiveAdapterResolver::kind_for_name("BACKUP.TGZ").unwrap(),
        ArchiveKind::Tar(TarCompression::Gz)
    );
}

#[test]
fn failures_are_distinguishable_and_leave_target_alone() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("target");
    fs::create_dir(&target).unwrap();
    fs::write(target.join("keep.txt"), b"untouched").unwrap();

    let not_a_dir = temp.path().join("plain.txt");
    fs::write(&not_a_dir, b"x").unwrap();
    let err = DecompressArchive::new(DecompressArchiveOptions {
        target: not_a_dir.to_string_lossy().into_owned(),
    })
    .err()
    .unwrap();
    assert!(err.is_config_error());

    let corrupt = temp.path().join("broken.zip");
    fs::write(&corrupt, b"PK\x03\x04 this is not really a zip").unwrap();
    let decompress = DecompressArchive::new(DecompressArchiveOptions {
        target: target.to_string_lossy().into_owned(),
    })
    .unwrap();
    let err = decompress.filter(path_value(&corrupt)).unwrap_err();
    assert!(matches!(err, FilterError::CorruptedArchive(_)));

    let unknown = temp.path().join("notes.md");
    fs::write(&unknown, b"# not an archive").unwrap();
    assert_eq!(decompress.filter(path_value(&unknown)).unwrap(), path_value(&unknown));

    let missing = temp.path().join("missing.zip");
    assert_eq!(decompress.filter(path_value(&missing)).unwrap(), path_value(&missing));

    let entries: Vec<_> = fs::read_dir(&target).unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(fs::read(target.join("keep.txt")).unwrap(), b"untouched");
}

#[test]
fn string_compression_round_trips() {
    let text = "The quick brown fox jumps over the lazy dog. ".repeat(20);

    for codec in [StringCodec::Gz, StringCodec::Bz2] {
        let options = StringCompressionOptions {
            adapter: codec,
            ..Default::default()
        };
        let compressed = CompressString::new(options.clone())
            .unwrap()
            .filter(Value::from(text.as_str()))
            .unwrap();
        assert!(matches!(compressed, Value::Bytes(ref b) if b.len() < text.len()));

        let restored = DecompressString::new(options).unwrap().filter(compressed).unwrap();
        assert_eq!(restored, Value::from(text.as_str()));
    }
}
