//! The corpus: every input string, stored once, hashed many times.

use std::io::BufRead;

use crate::arena::Arena;
use crate::error::Error;
use crate::hashers::MIN_INPUT_LEN;

/// Lines longer than the arena's u16 length prefix are discarded at
/// ingestion.
pub const MAX_LINE_LEN: usize = u16::MAX as usize;

/// Stop ingesting once a handle crosses this offset; the remaining
/// headroom below 4 GiB absorbs the line already in flight.
const HIGH_WATER: u32 = 63 << 26;

/// An ordered, immutable collection of strings over an arena.
///
/// Built single-threaded during ingestion, then shared by reference
/// across all workers. The mutable-then-immutable handoff is the
/// critical invariant here, and it is expressed through ownership:
/// building takes `&mut self`, searching takes `&self`.
pub struct Corpus {
    arena: Arena,
    handles: Vec<u32>,
}

impl Corpus {
    pub fn new() -> Self {
        Corpus {
            arena: Arena::new(),
            handles: Vec::new(),
        }
    }

    /// A corpus over a small arena, for tests.
    pub fn with_arena_capacity(cap: usize) -> Self {
        Corpus {
            arena: Arena::with_capacity(cap),
            handles: Vec::new(),
        }
    }

    /// Appends one string. Callers are expected to have filtered by
    /// length already; ingestion does.
    pub fn push(&mut self, s: &[u8]) -> Result<u32, Error> {
        debug_assert!((MIN_INPUT_LEN..=MAX_LINE_LEN).contains(&s.len()));
        let handle = self.arena.append(s)?;
        self.handles.push(handle);
        Ok(handle)
    }

    /// Number of strings.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Bytes of string storage in use.
    pub fn arena_bytes(&self) -> usize {
        self.arena.len()
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn handles(&self) -> &[u32] {
        &self.handles
    }

    pub fn get(&self, index: usize) -> &[u8] {
        self.arena.get(self.handles[index])
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads one string per line from `input` into a fresh corpus.
///
/// The line terminator is trimmed; lines shorter than the hashers'
/// 8-byte minimum or longer than the length-prefix maximum are skipped.
/// Lines are byte strings, never required to be UTF-8. Ingestion stops
/// early at the arena high-water mark.
pub fn read_corpus<R: BufRead>(mut input: R) -> Result<Corpus, Error> {
    let mut corpus = Corpus::new();
    let mut line = Vec::new();
    let mut skipped = 0u64;
    loop {
        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        if line.len() < MIN_INPUT_LEN {
            skipped += 1;
            continue;
        }
        if line.len() > MAX_LINE_LEN {
            log::warn!("skipping {}-byte line, over the length-prefix limit", line.len());
            skipped += 1;
            continue;
        }
        let handle = corpus.push(&line)?;
        if handle > HIGH_WATER {
            log::warn!("arena high-water mark reached, ignoring the rest of the input");
            break;
        }
    }
    if skipped > 0 {
        log::info!("skipped {skipped} lines outside the {MIN_INPUT_LEN}..={MAX_LINE_LEN} byte range");
    }
    Ok(corpus)
}
