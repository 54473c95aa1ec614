//! Form encoding of call parameters.
//!
//! The vendor reads `application/x-www-form-urlencoded` bodies in PHP's
//! `http_build_query` shape: nested objects and arrays flatten into
//! bracketed keys (`field_names[0]=email`), booleans become `1`/`0` and
//! nulls are dropped.

use std::borrow::Cow;

use encoding_rs::Encoding;
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::error::{OrmError, Result};

/// Flatten `params` into key/value pairs in iteration order.
pub fn flatten(params: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        flatten_value(key.clone(), value, &mut pairs);
    }
    pairs
}

fn flatten_value(prefix: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push((prefix, if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => out.push((prefix, n.to_string())),
        Value::String(s) => out.push((prefix, s.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_value(format!("{prefix}[{index}]"), item, out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten_value(format!("{prefix}[{key}]"), item, out);
            }
        }
    }
}

/// Form-encode `params`, transcoding every string to `encoding` first when
/// it is not UTF-8.
pub fn encode_params(params: &Map<String, Value>, encoding: &str) -> Result<String> {
    let pairs = flatten(params);
    let target = lookup_encoding(encoding)?;
    let transcode = transcoder(move |s: &str| target.encode(s).0);

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if target != encoding_rs::UTF_8 {
        serializer.encoding_override(Some(&transcode));
    }

    for (key, value) in &pairs {
        serializer.append_pair(key, value);
    }
    Ok(serializer.finish())
}

fn lookup_encoding(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| OrmError::UnsupportedEncoding(label.to_string()))
}

// Pins the closure's signature to the higher-ranked form `form_urlencoded`
// expects.
fn transcoder<F>(f: F) -> F
where
    F: for<'s> Fn(&'s str) -> Cow<'s, [u8]>,
{
    f
}

/// bzip2-compress a form body.
#[cfg(feature = "compression")]
pub fn compress(body: &[u8]) -> Result<Vec<u8>> {
    use std::io::Write;

    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder
        .write_all(body)
        .map_err(|e| OrmError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| OrmError::Compression(e.to_string()))
}
