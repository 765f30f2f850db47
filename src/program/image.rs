//! Program images: the initial contents of RAM.
//!
//! Text format (`.vimg`):
//! - One word per line, in decimal, `0x` hex or `0b` binary
//! - `_` may separate digits
//! - `@<addr>` moves the load address; following words continue from it
//! - `;` starts a comment, blank lines are ignored

use std::fmt;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

/// A run of words loaded at consecutive addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub origin: usize,
    pub words: Vec<u64>,
}

/// Words to place in RAM before the first tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramImage {
    segments: Vec<Segment>,
}

impl ProgramImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Words loaded from address 0.
    pub fn from_words(words: Vec<u64>) -> Self {
        Self {
            segments: vec![Segment { origin: 0, words }],
        }
    }

    /// Add words starting at `origin`.
    pub fn push_segment(&mut self, origin: usize, words: Vec<u64>) {
        self.segments.push(Segment { origin, words });
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Every `(address, word)` pair, in load order. Later segments win on
    /// overlap.
    pub fn cells(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.segments.iter().flat_map(|segment| {
            segment
                .words
                .iter()
                .enumerate()
                .map(move |(i, &word)| (segment.origin.saturating_add(i), word))
        })
    }

    /// Total number of words.
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.words.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parse the text format.
    pub fn parse(source: &str) -> Result<Self, ImageError> {
        let mut image = ProgramImage::new();
        let mut current = Segment { origin: 0, words: Vec::new() };

        for (line_num, line) in source.lines().enumerate() {
            let line_num = line_num + 1;
            let text = match line.find(';') {
                Some(pos) => &line[..pos],
                None => line,
            }
            .trim();

            if text.is_empty() {
                continue;
            }

            if let Some(addr) = text.strip_prefix('@') {
                let origin = parse_number(addr.trim())
                    .and_then(|origin| {
                        usize::try_from(origin)
                            .map_err(|_| format!("origin 0x{:X} is not addressable", origin))
                    })
                    .map_err(|message| ImageError::Parse {
                        line: line_num,
                        message,
                    })?;
                if !current.words.is_empty() {
                    image.segments.push(current);
                }
                current = Segment {
                    origin,
                    words: Vec::new(),
                };
                continue;
            }

            if text.split_whitespace().count() > 1 {
                return Err(ImageError::Parse {
                    line: line_num,
                    message: format!("expected one word, found '{}'", text),
                });
            }

            let word = parse_number(text).map_err(|message| ImageError::Parse {
                line: line_num,
                message,
            })?;
            if current.origin.checked_add(current.words.len()).is_none() {
                return Err(ImageError::Parse {
                    line: line_num,
                    message: format!(
                        "word runs past the end of the address space (origin 0x{:X})",
                        current.origin
                    ),
                });
            }
            current.words.push(word);
        }

        if !current.words.is_empty() {
            image.segments.push(current);
        }
        Ok(image)
    }

    /// Load an image file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ImageError> {
        let source = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ImageError::Io(e.to_string()))?;
        Self::parse(&source)
    }

    /// Write the image in text form.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ImageError> {
        let mut file = std::fs::File::create(path.as_ref())
            .map_err(|e| ImageError::Io(e.to_string()))?;
        write!(file, "{}", self).map_err(|e| ImageError::Io(e.to_string()))
    }
}

impl fmt::Display for ProgramImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; {} words", self.len())?;
        for segment in &self.segments {
            writeln!(f, "@0x{:02X}", segment.origin)?;
            for (i, word) in segment.words.iter().enumerate() {
                writeln!(f, "0x{:02X} ; {:03}", word, segment.origin + i)?;
            }
        }
        Ok(())
    }
}

fn parse_number(text: &str) -> Result<u64, String> {
    let cleaned = text.replace('_', "");
    let lower = cleaned.to_ascii_lowercase();
    let (digits, radix) = if let Some(hex) = lower.strip_prefix("0x") {
        (hex, 16)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        (bin, 2)
    } else {
        (lower.as_str(), 10)
    };

    u64::from_str_radix(digits, radix).map_err(|e| format!("invalid number '{}': {}", text, e))
}

/// Errors from reading program images.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        let image = ProgramImage::parse(
            "; demo\n\
             0x1E\n\
             \n\
             0b0110_1111 ; ADD 15\n\
             240\n",
        )
        .unwrap();
        assert_eq!(image.cells().collect::<Vec<_>>(), vec![(0, 0x1E), (1, 0x6F), (2, 240)]);
    }

    #[test]
    fn test_origin_directive() {
        let image = ProgramImage::parse("1\n@0x0E\n28\n14\n@4\n").unwrap();
        assert_eq!(image.segments().len(), 2);
        assert_eq!(
            image.cells().collect::<Vec<_>>(),
            vec![(0, 1), (14, 28), (15, 14)]
        );
        assert_eq!(image.len(), 3);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = ProgramImage::parse("1\n2\nzz\n").unwrap_err();
        assert!(matches!(err, ImageError::Parse { line: 3, .. }));

        let err = ProgramImage::parse("1 2\n").unwrap_err();
        assert!(matches!(err, ImageError::Parse { line: 1, .. }));

        let err = ProgramImage::parse("@\n").unwrap_err();
        assert!(matches!(err, ImageError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_origin_past_address_space() {
        let err = ProgramImage::parse("@0xFFFFFFFFFFFFFFFF\n1\n2\n").unwrap_err();
        assert!(matches!(err, ImageError::Parse { line: 3, .. }));

        let err = ProgramImage::parse("@0x1_0000_0000_0000_0000\n1\n").unwrap_err();
        assert!(matches!(err, ImageError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_cells_saturate_on_huge_origin() {
        let mut image = ProgramImage::new();
        image.push_segment(usize::MAX, vec![1, 2]);
        assert_eq!(
            image.cells().collect::<Vec<_>>(),
            vec![(usize::MAX, 1), (usize::MAX, 2)]
        );
    }

    #[test]
    fn test_empty_source() {
        let image = ProgramImage::parse("; nothing\n\n").unwrap();
        assert!(image.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let mut image = ProgramImage::from_words(vec![0x1E, 0xF0]);
        image.push_segment(14, vec![28]);

        let path = std::env::temp_dir().join(format!("vcomputer-image-{}.vimg", std::process::id()));
        image.save(&path).unwrap();
        let loaded = ProgramImage::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, image);
    }

    #[test]
    fn test_missing_file() {
        let err = ProgramImage::load("/nonexistent/program.vimg").unwrap_err();
        assert!(matches!(err, ImageError::Io(_)));
    }
}
