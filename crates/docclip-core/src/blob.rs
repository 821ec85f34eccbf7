//! Relay blob codec.
//!
//! Non-HTML clipboard content is shipped to a session as a flat sequence of
//! records, one per platform format, with no outer envelope:
//!
//! ```text
//! <mimetype>\n<hex-length>\n<raw-bytes>\n
//! ```

use bytes::{BufMut, Bytes, BytesMut};

/// One platform clipboard format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobRecord {
    pub mime: String,
    pub data: Bytes,
}

impl BlobRecord {
    pub fn new(mime: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            mime: mime.into(),
            data: data.into(),
        }
    }
}

/// Encode records into a relay blob.
pub fn encode(records: &[BlobRecord]) -> Bytes {
    let mut out = BytesMut::new();
    for record in records {
        out.put_slice(record.mime.as_bytes());
        out.put_u8(b'\n');
        out.put_slice(format!("{:x}", record.data.len()).as_bytes());
        out.put_u8(b'\n');
        out.put_slice(&record.data);
        out.put_u8(b'\n');
    }
    out.freeze()
}

/// Wrap a single HTML document as a relay blob.
pub fn encode_html(html: &str) -> Bytes {
    encode(&[BlobRecord::new("text/html", Bytes::copy_from_slice(html.as_bytes()))])
}

/// Decode a relay blob. `None` if the input is not a well-formed sequence of
/// records (an empty input is not a blob).
pub fn decode(input: &[u8]) -> Option<Vec<BlobRecord>> {
    let mut records = Vec::new();
    let mut rest = input;
    while !rest.is_empty() {
        let (mime, tail) = split_line(rest)?;
        let mime = std::str::from_utf8(mime).ok()?;
        if mime.is_empty() || !mime.contains('/') {
            return None;
        }
        let (len, tail) = split_line(tail)?;
        let len = usize::from_str_radix(std::str::from_utf8(len).ok()?, 16).ok()?;
        if tail.len() <= len || tail[len] != b'\n' {
            return None;
        }
        records.push(BlobRecord::new(mime, Bytes::copy_from_slice(&tail[..len])));
        rest = &tail[len + 1..];
    }
    (!records.is_empty()).then_some(records)
}

/// The `text/html` record of a blob, if any.
pub fn html_record(records: &[BlobRecord]) -> Option<&str> {
    records
        .iter()
        .find(|r| r.mime == "text/html")
        .and_then(|r| std::str::from_utf8(&r.data).ok())
}

fn split_line(input: &[u8]) -> Option<(&[u8], &[u8])> {
    let at = input.iter().position(|b| *b == b'\n')?;
    Some((&input[..at], &input[at + 1..]))
}
