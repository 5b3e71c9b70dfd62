//! A slab of memory to which strings are appended back to back.
//!
//! Strings are identified by their 32-bit byte offset in the slab, which
//! caps total storage at just under 4 GiB. Offsets stay valid across
//! growth; only the backing buffer moves.

use crate::error::Error;

/// Default initial capacity, large enough that the allocator serves it
/// with mmap. It resizes by a factor of 1.5 up to almost 4 GiB.
const DEFAULT_CAPACITY: usize = 12123 * 4096 - 24;

/// Floor for test-sized arenas. Below roughly two pages the growth
/// formula stops making progress.
const MIN_CAPACITY: usize = 1 << 16;

/// Next capacity: 1.5x, rounded down to a page multiple minus a small
/// reservation for allocator bookkeeping. `None` once the 32-bit offset
/// space is out of room.
fn grown(cap: usize) -> Option<usize> {
    let next = ((cap + cap / 2) & !4095).checked_sub(24)?;
    if next <= cap || next > u32::MAX as usize {
        return None;
    }
    Some(next)
}

/// Append-only byte storage. Each record is a little-endian u16 length
/// immediately followed by the payload; a handle is the offset of the
/// length field. Offset 0 is reserved and serves as the null handle.
pub struct Arena {
    buf: Vec<u8>,
}

impl Arena {
    /// The reserved handle. Never refers to live data.
    pub const NULL: u32 = 0;

    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// An arena with a smaller initial footprint, for tests that want to
    /// exercise growth without appending tens of megabytes.
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.clamp(MIN_CAPACITY, u32::MAX as usize);
        let mut buf = Vec::with_capacity(cap);
        buf.push(0);
        Arena { buf }
    }

    /// Bytes stored, including the reserved byte and length prefixes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.len() <= 1
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Ensures `additional` bytes can be appended without another growth
    /// check. May reallocate; handles stay valid.
    pub fn reserve(&mut self, additional: usize) -> Result<(), Error> {
        let needed = self.buf.len() + additional;
        if needed <= self.buf.capacity() {
            return Ok(());
        }
        let mut cap = self.buf.capacity();
        while needed > cap {
            cap = grown(cap).ok_or(Error::ArenaExhausted)?;
        }
        log::debug!("arena grows to {cap} bytes");
        self.buf.reserve_exact(cap - self.buf.len());
        Ok(())
    }

    /// Copies `bytes` to the end of the arena and returns its handle.
    ///
    /// The payload must fit the u16 length prefix; ingestion filters
    /// longer lines out before they get here.
    pub fn append(&mut self, bytes: &[u8]) -> Result<u32, Error> {
        debug_assert!(bytes.len() <= u16::MAX as usize);
        let need = 2 + bytes.len();
        let pos = self.buf.len();
        if pos as u64 + need as u64 > 1 << 32 {
            return Err(Error::ArenaExhausted);
        }
        self.reserve(need)?;
        self.buf
            .extend_from_slice(&(bytes.len() as u16).to_le_bytes());
        self.buf.extend_from_slice(bytes);
        Ok(pos as u32)
    }

    /// Resolves a handle previously returned by [`append`](Self::append)
    /// to the stored bytes. Handles are opaque offsets; the accessor is
    /// bounds-checked, so a fabricated handle panics rather than reading
    /// out of the buffer.
    pub fn get(&self, handle: u32) -> &[u8] {
        let pos = handle as usize;
        let len = u16::from_le_bytes([self.buf[pos], self.buf[pos + 1]]) as usize;
        &self.buf[pos + 2..pos + 2 + len]
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_handle_is_not_null() {
        let mut arena = Arena::with_capacity(0);
        let h = arena.append(b"collision").unwrap();
        assert_ne!(h, Arena::NULL);
        assert_eq!(arena.get(h), b"collision");
    }

    #[test]
    fn round_trip_across_growth() {
        // Small initial capacity so a few hundred KiB forces several
        // reallocations with live handles outstanding.
        let mut arena = Arena::with_capacity(0);
        let mut handles = Vec::new();
        for i in 0..512u32 {
            let s = vec![(i % 251) as u8; 700 + (i as usize % 97)];
            handles.push((arena.append(&s).unwrap(), s));
        }
        for (h, s) in &handles {
            assert_eq!(arena.get(*h), &s[..]);
        }
    }

    #[test]
    fn reserve_never_shrinks() {
        let mut arena = Arena::with_capacity(0);
        let h = arena.append(b"stays put").unwrap();
        let mut last = arena.capacity();
        for step in [1usize, 1 << 10, 1 << 20, 1 << 22] {
            arena.reserve(step).unwrap();
            assert!(arena.capacity() >= last);
            last = arena.capacity();
        }
        assert_eq!(arena.get(h), b"stays put");
    }

    #[test]
    fn empty_payload_round_trips() {
        let mut arena = Arena::with_capacity(0);
        let h = arena.append(b"").unwrap();
        assert_eq!(arena.get(h), b"");
    }

    #[test]
    fn growth_is_page_aligned_minus_reservation() {
        let g = grown(DEFAULT_CAPACITY).unwrap();
        assert!(g > DEFAULT_CAPACITY);
        assert_eq!((g + 24) % 4096, 0);
    }

    #[test]
    fn growth_stops_at_the_offset_space() {
        let mut cap = MIN_CAPACITY;
        let mut steps = 0;
        while let Some(next) = grown(cap) {
            assert!(next > cap);
            assert!(next <= u32::MAX as usize);
            cap = next;
            steps += 1;
            assert!(steps < 100, "growth sequence does not terminate");
        }
        // The last admissible capacity is in the final 1.5x step below 4 GiB.
        assert!(cap > u32::MAX as usize / 2);
    }
}
