//! Pluggable compression for stage inputs and outputs.
//!
//! Reading is transparent: [`auto_detect_reader`] recognizes a codec by file
//! extension first and by magic bytes second, so a gzip stream is decoded even
//! when it lives in a file named `*.tsv`. Writing is explicit: stages pick a
//! codec by name (the `compression` option) when the `compress` flag is set,
//! independent of the output file name.
//!
//! ## Built-in Codecs
//!
//! - **Gzip** (`.gz`, `.gzip`) - via `flate2` (feature: `compression-gzip`)
//! - **Zstd** (`.zst`, `.zstd`) - via `zstd` (feature: `compression-zstd`)
//!
//! ## Custom Codecs
//! ```
//! use stagekit::io::compression::{CompressionCodec, EncodedWrite, PlainWriter};
//! use std::io::{Read, Write, Result};
//!
//! struct Identity;
//!
//! impl CompressionCodec for Identity {
//!     fn name(&self) -> &str { "identity" }
//!     fn extensions(&self) -> &[&str] { &[".id"] }
//!     fn magic_bytes(&self) -> Option<&[u8]> { None }
//!     fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> Result<Box<dyn Read>> {
//!         Ok(reader)
//!     }
//!     fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> Result<Box<dyn EncodedWrite>> {
//!         Ok(Box::new(PlainWriter::new(writer)))
//!     }
//! }
//! ```
//!
//! Compressed output carries no timestamps, so writing the same records twice
//! produces identical bytes.

use anyhow::{Context, Result, anyhow};
use std::fs::{File, create_dir_all};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Global codec registry.
static CODEC_REGISTRY: RwLock<Option<Vec<Arc<dyn CompressionCodec>>>> = RwLock::new(None);

/// Codec used when the `compress` flag is set and no codec is named.
pub const DEFAULT_CODEC: &str = "gzip";

fn init_registry() -> Vec<Arc<dyn CompressionCodec>> {
    vec![
        #[cfg(feature = "compression-gzip")]
        Arc::new(GzipCodec),
        #[cfg(feature = "compression-zstd")]
        Arc::new(ZstdCodec),
    ]
}

fn get_registry() -> Vec<Arc<dyn CompressionCodec>> {
    let mut lock = CODEC_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    lock.get_or_insert_with(init_registry).clone()
}

/// Register a custom compression codec globally.
///
/// Registered codecs take part in read-side detection and can be selected by
/// name for output.
pub fn register_codec(codec: Arc<dyn CompressionCodec>) {
    let mut lock = CODEC_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    lock.get_or_insert_with(init_registry).push(codec);
}

/// Look up a registered codec by its [`name`](CompressionCodec::name).
pub fn codec_by_name(name: &str) -> Option<Arc<dyn CompressionCodec>> {
    get_registry()
        .into_iter()
        .find(|c| c.name().eq_ignore_ascii_case(name))
}

/// A writer whose trailing bytes (compression footers, buffers) are written by
/// an explicit, fallible [`finish`](EncodedWrite::finish).
///
/// Dropping an `EncodedWrite` without finishing it may silently lose data.
pub trait EncodedWrite: Write {
    fn finish(self: Box<Self>) -> std::io::Result<()>;
}

/// Buffered pass-through writer for uncompressed output.
pub struct PlainWriter<W: Write>(BufWriter<W>);

impl<W: Write> PlainWriter<W> {
    pub fn new(inner: W) -> Self {
        Self(BufWriter::new(inner))
    }
}

impl<W: Write> Write for PlainWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.flush()
    }
}

impl<W: Write> EncodedWrite for PlainWriter<W> {
    fn finish(self: Box<Self>) -> std::io::Result<()> {
        let this = *self;
        let mut inner = this.0.into_inner().map_err(|e| e.into_error())?;
        inner.flush()
    }
}

/// Pluggable compression codec.
///
/// Codecs are detected on read via file extensions (fast path) or magic bytes
/// (fallback), and selected by name on write.
pub trait CompressionCodec: Send + Sync {
    /// Human-readable codec name (e.g., "gzip", "zstd").
    fn name(&self) -> &str;

    /// Lowercase file extensions with the leading dot (e.g., `&[".gz", ".gzip"]`).
    fn extensions(&self) -> &[&str];

    /// Optional magic byte signature for content-based detection.
    fn magic_bytes(&self) -> Option<&[u8]>;

    /// Wrap a reader with decompression.
    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>>;

    /// Wrap a writer with compression.
    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn EncodedWrite>>;
}

/// Detect a codec from the file path extension (case-insensitive).
pub fn detect_from_extension(path: impl AsRef<Path>) -> Option<Arc<dyn CompressionCodec>> {
    let path_str = path.as_ref().to_string_lossy().to_lowercase();
    get_registry()
        .into_iter()
        .find(|codec| codec.extensions().iter().any(|ext| path_str.ends_with(ext)))
}

/// Peek at the start of a buffered reader and match codec signatures.
/// The reader is not advanced.
fn detect_from_magic<R: BufRead>(reader: &mut R) -> Option<Arc<dyn CompressionCodec>> {
    let buf = reader.fill_buf().ok()?;
    if buf.is_empty() {
        return None;
    }
    get_registry().into_iter().find(|codec| {
        codec
            .magic_bytes()
            .is_some_and(|magic| buf.len() >= magic.len() && buf.starts_with(magic))
    })
}

/// Wrap a reader with decompression if the path or the content calls for it.
///
/// Detection strategy:
/// 1. file path extension
/// 2. magic bytes at the start of the stream
/// 3. otherwise the stream is returned as-is (buffered)
pub fn auto_detect_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn Read>> {
    if let Some(codec) = detect_from_extension(&path_hint) {
        return codec
            .wrap_reader_dyn(Box::new(reader))
            .with_context(|| format!("wrap reader with {} codec", codec.name()));
    }

    let mut buf_reader = BufReader::new(reader);
    if let Some(codec) = detect_from_magic(&mut buf_reader) {
        return codec
            .wrap_reader_dyn(Box::new(buf_reader))
            .with_context(|| format!("wrap reader with {} codec", codec.name()));
    }

    Ok(Box::new(buf_reader))
}

/// Open a file for reading with transparent decompression.
pub fn open_input(path: impl AsRef<Path>) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rdr = auto_detect_reader(f, path)
        .with_context(|| format!("setup decompression for {}", path.display()))?;
    Ok(Box::new(BufReader::new(rdr)))
}

/// Create (or truncate) an output file, optionally compressing with the named codec.
///
/// Parent directories are created as needed. The returned writer must be
/// [`finish`](EncodedWrite::finish)ed.
pub fn create_output(
    path: impl AsRef<Path>,
    codec: Option<&str>,
) -> Result<Box<dyn EncodedWrite>> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    match codec {
        None => Ok(Box::new(PlainWriter::new(f))),
        Some(name) => {
            let codec = codec_by_name(name)
                .ok_or_else(|| anyhow!("unknown compression codec {name:?}"))?;
            codec
                .wrap_writer_dyn(Box::new(BufWriter::new(f)))
                .with_context(|| format!("setup {} compression for {}", name, path.display()))
        }
    }
}

/// Create an output file, hand it to `body`, then finish the stream.
///
/// The file is closed on every path; errors from `body` win over errors from
/// finishing.
pub fn write_output<F>(path: impl AsRef<Path>, codec: Option<&str>, body: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let path = path.as_ref();
    let mut w = create_output(path, codec)?;
    body(&mut w)?;
    w.finish()
        .with_context(|| format!("finish writing {}", path.display()))
}

// ============================================================================
// Built-in Codec Implementations
// ============================================================================

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl EncodedWrite for flate2::write::GzEncoder<Box<dyn Write>> {
    fn finish(self: Box<Self>) -> std::io::Result<()> {
        let mut inner = flate2::write::GzEncoder::finish(*self)?;
        inner.flush()
    }
}

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for GzipCodec {
    fn name(&self) -> &str {
        "gzip"
    }

    fn extensions(&self) -> &[&str] {
        &[".gz", ".gzip"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x1f, 0x8b])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        use flate2::read::MultiGzDecoder;
        Ok(Box::new(MultiGzDecoder::new(reader)))
    }

    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn EncodedWrite>> {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        Ok(Box::new(GzEncoder::new(writer, Compression::default())))
    }
}

#[cfg(feature = "compression-zstd")]
struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
impl EncodedWrite for zstd::stream::write::Encoder<'static, Box<dyn Write>> {
    fn finish(self: Box<Self>) -> std::io::Result<()> {
        let mut inner = zstd::stream::write::Encoder::finish(*self)?;
        inner.flush()
    }
}

#[cfg(feature = "compression-zstd")]
impl CompressionCodec for ZstdCodec {
    fn name(&self) -> &str {
        "zstd"
    }

    fn extensions(&self) -> &[&str] {
        &[".zst", ".zstd"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x28, 0xb5, 0x2f, 0xfd])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read>)
    }

    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn EncodedWrite>> {
        zstd::stream::write::Encoder::new(writer, 3).map(|e| Box::new(e) as Box<dyn EncodedWrite>)
    }
}
