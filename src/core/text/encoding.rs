// Character encoding option shared by the text and file filters

use encoding_rs::{Encoding, UTF_8};

use crate::models::FilterError;

pub const DEFAULT_ENCODING: &str = "UTF-8";

pub fn default_encoding() -> String {
    DEFAULT_ENCODING.to_string()
}

/// Resolve an encoding label, rejecting unknown ones
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, FilterError> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
        FilterError::InvalidConfig(format!("Encoding '{}' is not supported", label))
    })
}

/// Decode bytes, apply a text transform and encode the result again
pub fn transcode_with<F>(encoding: &'static Encoding, bytes: &[u8], transform: F) -> Vec<u8>
where
    F: Fn(&str) -> String,
{
    if encoding == UTF_8 {
        return transform(&String::from_utf8_lossy(bytes)).into_bytes();
    }
    let (decoded, _) = encoding.decode_without_bom_handling(bytes);
    let transformed = transform(&decoded);
    let (encoded, _, _) = encoding.encode(&transformed);
    encoded.into_owned()
}
