//! Input file access and the SMAT triplet reader.
//!
//! Every input (matrix, permutation, labels) goes through [`read_input`],
//! which memory-maps the file and transparently inflates it when it starts
//! with the gzip magic bytes.

use std::fs::File;
use std::io::Read;
use std::ops::Deref;
use std::path::Path;

use flate2::read::MultiGzDecoder;
use memmap2::Mmap;

use crate::error::LoadError;
use crate::util::format::format_bytes;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Raw bytes of an input file, either mapped or inflated into memory.
#[derive(Debug)]
pub enum InputBytes {
    Mapped(Mmap),
    Decoded(Vec<u8>),
    Empty,
}

impl Deref for InputBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Mapped(mmap) => mmap,
            Self::Decoded(buf) => buf,
            Self::Empty => &[],
        }
    }
}

/// Open `path`, memory-map it and inflate it if it is gzip-compressed.
pub fn read_input(path: &Path) -> Result<InputBytes, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
    let len = file.metadata().map_err(|e| LoadError::io(path, e))?.len();
    if len == 0 {
        return Ok(InputBytes::Empty);
    }

    // SAFETY: the mapping is read-only and dropped before the loader returns.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| LoadError::io(path, e))?;

    if mmap.starts_with(&GZIP_MAGIC) {
        let mut buf = Vec::with_capacity(mmap.len() * 4);
        MultiGzDecoder::new(&mmap[..])
            .read_to_end(&mut buf)
            .map_err(|e| LoadError::io(path, e))?;
        log::debug!(
            "{}: inflated gzip {} -> {}",
            path.display(),
            format_bytes(len),
            format_bytes(buf.len() as u64)
        );
        return Ok(InputBytes::Decoded(buf));
    }

    log::debug!("{}: mapped {}", path.display(), format_bytes(len));

    Ok(InputBytes::Mapped(mmap))
}

/// Interpret input bytes as UTF-8 text.
pub fn as_text<'a>(path: &Path, bytes: &'a [u8]) -> Result<&'a str, LoadError> {
    std::str::from_utf8(bytes).map_err(|e| LoadError::parse(path, 0, format!("not valid UTF-8: {e}")))
}

/// One stored (row, column, value) entry as read from disk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triplet {
    pub row: u32,
    pub col: u32,
    pub value: f64,
}

/// Unassembled contents of a triplet file.
#[derive(Debug, Clone)]
pub struct TripletFile {
    pub nrows: usize,
    pub ncols: usize,
    pub entries: Vec<Triplet>,
}

/// Read an SMAT file: a `nrows ncols nnz` header followed by `nnz` lines of
/// 0-based `row col value`.
pub fn read_triplets(path: &Path) -> Result<TripletFile, LoadError> {
    let bytes = read_input(path)?;
    let text = as_text(path, &bytes)?;
    parse_triplets(path, text)
}

fn is_skippable(line: &str) -> bool {
    let line = line.trim_start();
    line.is_empty() || line.starts_with('#') || line.starts_with('%')
}

fn parse_index(path: &Path, line: usize, token: &str, what: &str) -> Result<usize, LoadError> {
    token
        .parse::<usize>()
        .map_err(|_| LoadError::parse(path, line, format!("invalid {what} '{token}'")))
}

pub(crate) fn parse_triplets(path: &Path, text: &str) -> Result<TripletFile, LoadError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l))
        .filter(|(_, l)| !is_skippable(l));

    let Some((header_line, header)) = lines.next() else {
        return Err(LoadError::parse(path, 0, "missing header"));
    };

    let fields: Vec<&str> = header.split_whitespace().collect();
    if fields.len() != 3 {
        return Err(LoadError::parse(
            path,
            header_line,
            "header must be 'nrows ncols nnz'",
        ));
    }
    let nrows = parse_index(path, header_line, fields[0], "row count")?;
    let ncols = parse_index(path, header_line, fields[1], "column count")?;
    let nnz = parse_index(path, header_line, fields[2], "nonzero count")?;

    if nrows > u32::MAX as usize || ncols > u32::MAX as usize {
        return Err(LoadError::parse(path, header_line, "matrix dimensions too large"));
    }

    // The header count is untrusted; every entry line takes at least 6 bytes.
    let mut entries = Vec::with_capacity(nnz.min(text.len() / 6 + 1));
    for (line_no, line) in lines {
        if entries.len() == nnz {
            return Err(LoadError::parse(
                path,
                line_no,
                format!("more than {nnz} entries"),
            ));
        }

        let mut tokens = line.split_whitespace();
        let (Some(r), Some(c), Some(v), None) =
            (tokens.next(), tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(LoadError::parse(path, line_no, "expected 'row col value'"));
        };

        let row = parse_index(path, line_no, r, "row index")?;
        let col = parse_index(path, line_no, c, "column index")?;
        let value = v
            .parse::<f64>()
            .map_err(|_| LoadError::parse(path, line_no, format!("invalid value '{v}'")))?;

        if row >= nrows || col >= ncols {
            return Err(LoadError::parse(
                path,
                line_no,
                format!("entry ({row}, {col}) outside a {nrows}x{ncols} matrix"),
            ));
        }

        entries.push(Triplet {
            row: row as u32,
            col: col as u32,
            value,
        });
    }

    if entries.len() != nnz {
        return Err(LoadError::parse(
            path,
            0,
            format!("header declares {nnz} entries but only {} present", entries.len()),
        ));
    }

    Ok(TripletFile {
        nrows,
        ncols,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(text: &str) -> Result<TripletFile, LoadError> {
        parse_triplets(Path::new("test.smat"), text)
    }

    #[test]
    fn test_parse_basic() {
        let file = parse("3 4 2\n0 1 1.5\n2 3 -2\n").unwrap();
        assert_eq!(file.nrows, 3);
        assert_eq!(file.ncols, 4);
        assert_eq!(
            file.entries,
            vec![
                Triplet { row: 0, col: 1, value: 1.5 },
                Triplet { row: 2, col: 3, value: -2.0 },
            ]
        );
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let file = parse("% generated\n\n2 2 1\n# entry\n1 1 4\n\n").unwrap();
        assert_eq!(file.entries.len(), 1);
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        match parse("2 2 1\n0 x 1\n") {
            Err(LoadError::ParseError { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(parse("2 2 1\n5 0 1\n"), Err(LoadError::ParseError { line: 2, .. })));
        assert!(matches!(parse("2 2 2\n0 0 1\n"), Err(LoadError::ParseError { .. })));
        assert!(matches!(parse("2 2 1\n0 0 1\n1 1 1\n"), Err(LoadError::ParseError { line: 3, .. })));
        assert!(matches!(parse(""), Err(LoadError::ParseError { .. })));
        assert!(matches!(parse("2 2\n"), Err(LoadError::ParseError { line: 1, .. })));
    }

    #[test]
    fn test_absurd_nonzero_count_is_a_parse_error() {
        let err = parse("2 2 18446744073709551615\n0 0 1\n").unwrap_err();
        assert!(matches!(err, LoadError::ParseError { line: 0, .. }));
    }

    #[test]
    fn test_read_gzip_input() {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"2 2 1\n1 0 3.0\n").unwrap();
        let compressed = encoder.finish().unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&compressed).unwrap();

        let triplets = read_triplets(file.path()).unwrap();
        assert_eq!(triplets.entries, vec![Triplet { row: 1, col: 0, value: 3.0 }]);
    }

    #[test]
    fn test_missing_file() {
        let result = read_input(Path::new("/nonexistent/spyglass/input.smat"));
        assert!(matches!(result, Err(LoadError::NotFound { .. })));
    }
}
