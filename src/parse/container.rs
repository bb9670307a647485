use std::io::Read;

use flate2::read::MultiGzDecoder;

use crate::parse::error::DecodeError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const GZIP_DEFLATE: u8 = 8;
const UTF8_BOM: [u8; 3] = [0xef, 0xbb, 0xbf];

/// Magic numbers of containers we recognize but can't read
const UNSUPPORTED: &[(&[u8], &str)] = &[
    (b"PK\x03\x04", "zip archive (Live Pack?)"),
    (&[0x28, 0xb5, 0x2f, 0xfd], "zstd stream"),
    (b"BZh", "bzip2 stream"),
    (&[0xfd, b'7', b'z', b'X', b'Z', 0x00], "xz stream"),
];

/// Turn the on-disk container into the raw XML byte stream.
///
/// Live sets are gzip-compressed XML. Plain XML is passed through untouched.
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::CorruptContainer("file is empty".to_string()));
    }

    if bytes.starts_with(&GZIP_MAGIC) {
        return match bytes.get(2) {
            Some(&GZIP_DEFLATE) => inflate(bytes),
            Some(method) => Err(DecodeError::UnsupportedContainer(format!(
                "gzip compression method {}",
                method
            ))),
            None => Err(DecodeError::CorruptContainer(
                "truncated gzip header".to_string(),
            )),
        };
    }

    for (magic, name) in UNSUPPORTED {
        if bytes.starts_with(magic) {
            return Err(DecodeError::UnsupportedContainer(name.to_string()));
        }
    }

    if looks_like_xml(bytes) {
        return Ok(bytes.to_vec());
    }

    Err(DecodeError::CorruptContainer(
        "not a gzip stream or XML document".to_string(),
    ))
}

fn inflate(bytes: &[u8]) -> Result<Vec<u8>, DecodeError> {
    // Concatenated members decode as one stream, the way gunzip reads them
    let mut decoder = MultiGzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| DecodeError::CorruptContainer(e.to_string()))?;
    Ok(out)
}

fn looks_like_xml(bytes: &[u8]) -> bool {
    let body = bytes.strip_prefix(&UTF8_BOM[..]).unwrap_or(bytes);
    body.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|&b| b == b'<')
}
