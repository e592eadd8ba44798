//! HTTP body compression.
//!
//! The API servers gzip SOAP responses when the request carries
//! `Accept-Encoding: gzip`. Only gzip is negotiated.

use bytes::Bytes;
use std::io;

#[cfg(feature = "compression-gzip")]
use std::io::Read;

#[cfg(feature = "compression-gzip")]
use flate2::read::GzDecoder;

/// Supported `Content-Encoding` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionEncoding {
    #[default]
    Identity,
    #[cfg(feature = "compression-gzip")]
    Gzip,
}

impl CompressionEncoding {
    /// Parse a `Content-Encoding` header value.
    ///
    /// Returns `None` for encodings this build cannot decode.
    pub fn from_header(value: Option<&str>) -> Option<Self> {
        match value.map(str::trim) {
            None | Some("identity") | Some("") => Some(Self::Identity),
            #[cfg(feature = "compression-gzip")]
            Some(v) if v.eq_ignore_ascii_case("gzip") => Some(Self::Gzip),
            _ => None,
        }
    }

    /// Get the header value string for this encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            #[cfg(feature = "compression-gzip")]
            Self::Gzip => "gzip",
        }
    }

    /// Returns true if this encoding is identity (no compression).
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Identity)
    }

    /// Decompress `data` that was encoded with this encoding.
    pub fn decompress(&self, data: Bytes) -> io::Result<Bytes> {
        match self {
            Self::Identity => Ok(data),
            #[cfg(feature = "compression-gzip")]
            Self::Gzip => {
                let mut decoder = GzDecoder::new(data.as_ref());
                let mut out = Vec::new();
                decoder.read_to_end(&mut out)?;
                Ok(Bytes::from(out))
            }
        }
    }
}
