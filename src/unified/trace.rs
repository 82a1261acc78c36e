use std::io::BufRead;

use thiserror::Error;

/// the kind of a memory reference in the trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Instruction,
    Load,
    Store,
    Other(char),
}

impl From<char> for RefKind {
    fn from(c: char) -> Self {
        match c {
            'I' => RefKind::Instruction,
            'L' => RefKind::Load,
            'S' => RefKind::Store,
            other => RefKind::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub kind: RefKind,
    pub addr: u64,
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("cannot read trace at line {line}")]
    Io {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

/// one line of the trace after parsing
#[derive(Debug, PartialEq, Eq)]
pub enum TraceEntry {
    Ref(Reference),
    Malformed,
}

/// parse `<kind> <hex address>[,size]`, `None` for a blank line
pub fn parse_line(line: &str) -> Option<TraceEntry> {
    let mut tokens = line.split_whitespace();
    let kind = tokens.next()?;
    let entry = match parse_reference(kind, tokens.next()) {
        Some(reference) => TraceEntry::Ref(reference),
        None => TraceEntry::Malformed,
    };
    Some(entry)
}

fn parse_reference(kind: &str, addr: Option<&str>) -> Option<Reference> {
    let mut chars = kind.chars();
    let kind = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    // lackey style traces carry the access size after a comma
    let addr = addr?.split(',').next()?;
    let addr = addr
        .strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .unwrap_or(addr);
    // from_str_radix would take a sign
    if addr.starts_with('+') {
        return None;
    }
    let addr = u64::from_str_radix(addr, 16).ok()?;
    Some(Reference {
        kind: kind.into(),
        addr,
    })
}

/// # TraceReader
/// reads one reference per line from any buffered source.
/// - blank lines are dropped silently.
/// - lines that do not parse are returned as `TraceEntry::Malformed`,
///   the caller decides what to do with them.
pub struct TraceReader<R> {
    reader: R,
    buf: Vec<u8>,
    line: usize,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        TraceReader {
            reader,
            buf: Vec::new(),
            line: 0,
        }
    }

    /// the next entry, `Ok(None)` at end of input
    pub fn next_entry(&mut self) -> Result<Option<TraceEntry>, TraceError> {
        loop {
            self.buf.clear();
            self.line += 1;
            let read = self
                .reader
                .read_until(b'\n', &mut self.buf)
                .map_err(|source| TraceError::Io {
                    line: self.line,
                    source,
                })?;
            if read == 0 {
                return Ok(None);
            }
            let parsed = match std::str::from_utf8(&self.buf) {
                Ok(text) => parse_line(text),
                Err(_) => Some(TraceEntry::Malformed),
            };
            match parsed {
                Some(TraceEntry::Malformed) => {
                    let content = String::from_utf8_lossy(&self.buf);
                    tracing::debug!(
                        line = self.line,
                        content = content.trim_end(),
                        "skip malformed trace entry"
                    );
                    return Ok(Some(TraceEntry::Malformed));
                }
                Some(entry) => return Ok(Some(entry)),
                None => continue,
            }
        }
    }

    pub fn current_line(&self) -> usize {
        self.line
    }
}
