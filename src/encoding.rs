//! Encoding detection and line reading
//!
//! Word lists and input texts come in whatever encoding their authors used.
//! Files are detected (BOM first, then chardetng) and handed out as UTF-8
//! lines.

use crate::error::Result;
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Bytes sampled for detection
const SAMPLE_SIZE: usize = 64 * 1024;

/// Result of encoding detection
#[derive(Debug, Clone)]
pub struct EncodingInfo {
    /// Detected encoding name
    pub name: &'static str,
    /// Confidence level (0.0 - 1.0)
    pub confidence: f32,
    pub encoding: &'static Encoding,
}

impl Default for EncodingInfo {
    fn default() -> Self {
        Self {
            name: "UTF-8",
            confidence: 1.0,
            encoding: encoding_rs::UTF_8,
        }
    }
}

/// Detect the encoding of a file by sampling its start
pub fn detect_encoding(path: &Path) -> Result<EncodingInfo> {
    let mut sample = Vec::with_capacity(SAMPLE_SIZE);
    File::open(path)?
        .take(SAMPLE_SIZE as u64)
        .read_to_end(&mut sample)?;

    Ok(detect_encoding_bytes(&sample))
}

/// Detect the encoding of an in-memory sample
pub fn detect_encoding_bytes(sample: &[u8]) -> EncodingInfo {
    if sample.is_empty() {
        return EncodingInfo::default();
    }

    if let Some((encoding, _)) = Encoding::for_bom(sample) {
        return EncodingInfo {
            name: encoding.name(),
            confidence: 1.0,
            encoding,
        };
    }

    // A clean UTF-8 decode (ASCII included) is as good as certain
    if std::str::from_utf8(sample).is_ok() {
        return EncodingInfo::default();
    }

    let mut detector = EncodingDetector::new();
    detector.feed(sample, true);
    let encoding = detector.guess(None, true);

    let confidence = if encoding == encoding_rs::UTF_8 { 0.5 } else { 0.8 };

    EncodingInfo {
        name: encoding.name(),
        confidence,
        encoding,
    }
}

/// UTF-8 lines of a file, without line terminators.
///
/// UTF-8 files are memory-mapped and split lazily; anything else is decoded
/// in one go since multi-byte encodings cannot be split on `\n` bytes.
pub enum LineReader {
    Mapped {
        mmap: memmap2::Mmap,
        position: usize,
    },
    Decoded {
        lines: std::vec::IntoIter<String>,
        encoding: &'static Encoding,
    },
    Empty,
}

impl LineReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Self::Empty);
        }

        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        let info = detect_encoding_bytes(&mmap[..mmap.len().min(SAMPLE_SIZE)]);
        log::debug!("{:?}: {} (confidence {:.1})", path, info.name, info.confidence);

        if info.encoding == encoding_rs::UTF_8 {
            let position = if mmap.starts_with(&[0xEF, 0xBB, 0xBF]) { 3 } else { 0 };
            return Ok(Self::Mapped { mmap, position });
        }

        let (decoded, actual, had_errors) = info.encoding.decode(&mmap);
        if had_errors {
            log::warn!("{:?}: invalid {} sequences replaced", path, actual.name());
        }
        let lines: Vec<String> = decoded.lines().map(str::to_string).collect();

        Ok(Self::Decoded {
            lines: lines.into_iter(),
            encoding: actual,
        })
    }

    pub fn encoding(&self) -> &'static Encoding {
        match self {
            Self::Decoded { encoding, .. } => *encoding,
            _ => encoding_rs::UTF_8,
        }
    }
}

impl Iterator for LineReader {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Empty => None,
            Self::Decoded { lines, .. } => lines.next(),
            Self::Mapped { mmap, position } => {
                if *position >= mmap.len() {
                    return None;
                }

                let remaining = &mmap[*position..];
                let line_end = memchr::memchr(b'\n', remaining)
                    .map(|i| i + 1)
                    .unwrap_or(remaining.len());
                *position += line_end;

                let line = &remaining[..line_end];
                let line = line.strip_suffix(b"\n").unwrap_or(line);
                let line = line.strip_suffix(b"\r").unwrap_or(line);

                Some(String::from_utf8_lossy(line).into_owned())
            }
        }
    }
}
