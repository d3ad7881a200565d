// HTML entity encoding

use encoding_rs::{Encoding, UTF_8};
use serde::Deserialize;

use crate::core::filter::Filter;
use crate::core::text::encoding::{default_encoding, resolve_encoding};
use crate::core::text::entities::{entity_name, is_known_name};
use crate::models::config::parse_options;
use crate::models::{FilterError, Value};

/// Which quote characters are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    /// Double quotes only
    Compat,
    /// Double and single quotes
    #[default]
    Quotes,
    /// Neither
    NoQuotes,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HtmlEntitiesOptions {
    pub quotestyle: QuoteStyle,
    pub encoding: String,
    /// Re-encode entities already present in the input
    pub doublequote: bool,
}

impl Default for HtmlEntitiesOptions {
    fn default() -> Self {
        Self {
            quotestyle: QuoteStyle::default(),
            encoding: default_encoding(),
            doublequote: true,
        }
    }
}

/// Replace characters with their HTML entities
#[derive(Debug, Clone)]
pub struct HtmlEntities {
    quote_style: QuoteStyle,
    encoding: &'static Encoding,
    double_encode: bool,
}

impl HtmlEntities {
    pub fn new(options: HtmlEntitiesOptions) -> Result<Self, FilterError> {
        Ok(Self {
            quote_style: options.quotestyle,
            encoding: resolve_encoding(&options.encoding)?,
            double_encode: options.doublequote,
        })
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, FilterError> {
        Self::new(parse_options("HtmlEntities", options)?)
    }

    /// Encode already-decoded text
    pub fn encode(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + text.len() / 4);
        for (index, c) in text.char_indices() {
            match c {
                '&' if !self.double_encode && starts_with_entity(&text[index..]) => out.push('&'),
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' if self.quote_style != QuoteStyle::NoQuotes => out.push_str("&quot;"),
                '\'' if self.quote_style == QuoteStyle::Quotes => out.push_str("&#039;"),
                other => match entity_name(other) {
                    Some(name) => {
                        out.push('&');
                        out.push_str(name);
                        out.push(';');
                    }
                    None => out.push(other),
                },
            }
        }
        out
    }

    fn encode_bytes(&self, bytes: &[u8]) -> Result<Value, FilterError> {
        if self.encoding == UTF_8 {
            let cleaned = drop_invalid_utf8(bytes);
            if !bytes.is_empty() && cleaned.is_empty() {
                return Err(FilterError::Domain(
                    "Encoding mismatch has resulted in htmlentities errors".into(),
                ));
            }
            return Ok(Value::Str(self.encode(&cleaned)));
        }

        let (decoded, _) = self.encoding.decode_without_bom_handling(bytes);
        let encoded = self.encode(&decoded);
        let (out, _, _) = self.encoding.encode(&encoded);
        Ok(Value::from_bytes(out.into_owned()))
    }
}

impl Filter for HtmlEntities {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        match value {
            Value::Bytes(bytes) => self.encode_bytes(&bytes),
            Value::Str(text) => Ok(Value::Str(self.encode(&text))),
            other => Ok(match other.as_text() {
                Some(text) => Value::Str(self.encode(&text)),
                None => other,
            }),
        }
    }
}

/// Whether `text` begins with a well-formed character reference
fn starts_with_entity(text: &str) -> bool {
    let Some(end) = text.find(';') else {
        return false;
    };
    let body = &text[1..end];

    if let Some(numeric) = body.strip_prefix('#') {
        return match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => !numeric.is_empty() && numeric.chars().all(|c| c.is_ascii_digit()),
        };
    }

    body.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && body.chars().all(|c| c.is_ascii_alphanumeric())
        && is_known_name(body)
}

/// UTF-8 text with every invalid byte sequence removed
fn drop_invalid_utf8(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                // valid_up_to marks a verified UTF-8 prefix
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match e.error_len() {
                    Some(len) => bytes = &rest[len..],
                    None => return out,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn default_filter() -> HtmlEntities {
        HtmlEntities::new(HtmlEntitiesOptions::default()).unwrap()
    }

    #[test]
    fn test_default_settings() {
        let filter = default_filter();
        let cases = [
            ("string", "string"),
            ("<", "&lt;"),
            (">", "&gt;"),
            ("'", "&#039;"),
            ("\"", "&quot;"),
            ("&", "&amp;"),
            ("&amp;", "&amp;amp;"),
        ];
        for (input, expected) in cases {
            assert_eq!(filter.filter(Value::from(input)).unwrap(), Value::from(expected), "input {:?}", input);
        }
    }

    #[test]
    fn test_named_characters() {
        let filter = default_filter();
        assert_eq!(
            filter.filter(Value::from("café © 2024 – α→β")).unwrap(),
            Value::from("caf&eacute; &copy; 2024 &ndash; &alpha;&rarr;&beta;")
        );
    }

    #[test]
    fn test_quote_styles() {
        let input = "A 'single' and \"double\"";

        let quotes = default_filter();
        assert_eq!(
            quotes.encode(input),
            "A &#039;single&#039; and &quot;double&quot;"
        );

        let compat = HtmlEntities::from_options(json!({"quotestyle": "compat"})).unwrap();
        assert_eq!(compat.encode(input), "A 'single' and &quot;double&quot;");

        let none = HtmlEntities::from_options(json!({"quotestyle": "noquotes"})).unwrap();
        assert_eq!(none.encode(input), input);
    }

    #[test]
    fn test_double_encode_off() {
        let filter = HtmlEntities::from_options(json!({"doublequote": false})).unwrap();
        assert_eq!(filter.encode("&amp;"), "&amp;");
        assert_eq!(filter.encode("&#39; &#x27; &eacute;"), "&#39; &#x27; &eacute;");
        assert_eq!(filter.encode("&bogus; & &#;"), "&amp;bogus; &amp; &amp;#;");
    }

    #[test]
    fn test_encoding_mismatch_is_cleaned() {
        let filter = default_filter();
        // latin-1 é between double quotes, read as UTF-8
        let result = filter.filter(Value::Bytes(b"\"\xe9\"".to_vec())).unwrap();
        assert_eq!(result, Value::from("&quot;&quot;"));
    }

    #[test]
    fn test_encoding_mismatch_with_nothing_left() {
        let filter = default_filter();
        let err = filter.filter(Value::Bytes(vec![0x96])).unwrap_err();
        assert!(matches!(err, FilterError::Domain(_)));
    }

    #[test]
    fn test_declared_encoding() {
        let filter = HtmlEntities::from_options(json!({"encoding": "ISO-8859-1"})).unwrap();
        let result = filter.filter(Value::Bytes(b"\xe9<".to_vec())).unwrap();
        assert_eq!(result, Value::from("&eacute;&lt;"));
    }

    #[test]
    fn test_non_scalars_unchanged() {
        let filter = default_filter();
        let list = Value::List(vec![Value::from("<"), Value::from(">")]);
        assert_eq!(filter.filter(list.clone()).unwrap(), list);
        assert_eq!(filter.filter(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_unknown_quote_style_rejected() {
        let err = HtmlEntities::from_options(json!({"quotestyle": "single"})).unwrap_err();
        assert!(err.is_config_error());
    }
}
