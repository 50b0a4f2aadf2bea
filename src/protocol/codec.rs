//! Protocol codec
//!
//! Reading request lines and writing reply lines.

use std::io::{BufRead, Read, Write};

use crate::error::{CairnError, Result};

/// Maximum accepted request line (1 MB)
pub const MAX_LINE_SIZE: usize = 1024 * 1024;

/// Split a request line into tokens
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Read one request line and tokenize it
///
/// Returns `Ok(None)` on a clean end of stream. A line longer than
/// `MAX_LINE_SIZE` is discarded up to its newline and reported as a
/// protocol error, leaving the stream positioned at the next request.
/// Invalid UTF-8 is decoded lossily.
pub fn read_request<R: BufRead>(reader: &mut R) -> Result<Option<Vec<String>>> {
    let mut buf = Vec::new();
    let read = (&mut *reader)
        .take(MAX_LINE_SIZE as u64 + 1)
        .read_until(b'\n', &mut buf)?;

    if read == 0 {
        return Ok(None);
    }

    if buf.len() > MAX_LINE_SIZE && buf.last() != Some(&b'\n') {
        discard_line(reader)?;
        return Err(CairnError::Protocol(format!(
            "Request line too long (max {} bytes)",
            MAX_LINE_SIZE
        )));
    }

    let line = String::from_utf8_lossy(&buf);

    Ok(Some(tokenize(&line)))
}

/// Skip input up to and including the next newline (or end of stream)
fn discard_line<R: BufRead>(reader: &mut R) -> Result<()> {
    loop {
        let (found, used) = {
            let available = reader.fill_buf()?;
            if available.is_empty() {
                return Ok(());
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(i) => (true, i + 1),
                None => (false, available.len()),
            }
        };
        reader.consume(used);
        if found {
            return Ok(());
        }
    }
}

/// Write a single line followed by a newline and flush
pub fn write_line<W: Write>(writer: &mut W, line: &str) -> Result<()> {
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
