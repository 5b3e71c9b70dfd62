//! Collision detection: sort the trial's (hash, handle) pairs, then scan
//! adjacent entries for maximal runs of equal hashes.

use crate::arena::Arena;
use crate::radix;

/// One corpus string hashed under the trial seed. Tightly packed: the
/// detector sorts arrays of millions of these, and padding to 16 bytes
/// would cost a third of the cache throughput and skew the radix bucket
/// math.
#[repr(C, packed(4))]
#[derive(Debug, Clone, Copy)]
pub struct HashEntry {
    pub hash: u64,
    pub handle: u32,
}

const _: () = assert!(std::mem::size_of::<HashEntry>() == 12);

/// Ordering is by the sort key alone; entries with equal hashes compare
/// equal regardless of handle.
impl PartialEq for HashEntry {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl PartialOrd for HashEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        { self.hash }.partial_cmp(&{ other.hash })
    }
}

impl voracious_radix_sort::Radixable<u64> for HashEntry {
    type Key = u64;

    #[inline]
    fn key(&self) -> u64 {
        self.hash
    }
}

/// Receives collision groups. One `group` call covers one whole maximal
/// run; implementations are shared by all worker threads.
pub trait CollisionSink: Sync {
    fn group(&self, seed: u64, hash: u64, strings: &[&[u8]]);
}

/// Prints one line per group member, holding the stdout lock across the
/// group so output from concurrent workers is never spliced mid-group.
pub struct StdoutSink;

impl CollisionSink for StdoutSink {
    fn group(&self, seed: u64, hash: u64, strings: &[&[u8]]) {
        use std::io::Write;
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for s in strings {
            let _ = write!(out, "{seed:016x} {hash:016x} ");
            let _ = out.write_all(s);
            let _ = out.write_all(b"\n");
        }
    }
}

/// Sorts the trial's entries and emits every maximal run of two or more
/// equal hashes as one group, with the members' original strings.
///
/// `entries` holds one entry per corpus string and is handed back with
/// its length unchanged; `scratch` is the radix sort's alternate buffer.
/// Both are worker-owned and reused across trials.
pub fn find_collisions<S: CollisionSink + ?Sized>(
    entries: &mut Vec<HashEntry>,
    scratch: &mut Vec<HashEntry>,
    arena: &Arena,
    seed: u64,
    sink: &S,
) {
    let n = entries.len();
    if n < 2 {
        return;
    }
    radix::sort_entries(entries, scratch);

    // The complement of the maximum hash present can never equal its
    // neighbor, so it terminates the last run without a bounds check.
    let top = entries[n - 1].hash;
    entries.push(HashEntry {
        hash: !top,
        handle: Arena::NULL,
    });

    let mut i = 1;
    while i < n {
        let h = entries[i - 1].hash;
        let cur = entries[i].hash;
        if h != cur {
            i += 1;
            continue;
        }
        let start = i - 1;
        let mut end = i + 1;
        loop {
            let next = entries[end].hash;
            if next != h {
                break;
            }
            end += 1;
        }
        let strings: Vec<&[u8]> = entries[start..end]
            .iter()
            .map(|e| arena.get({ e.handle }))
            .collect();
        sink.group(seed, h, &strings);
        i = end + 1;
    }
    entries.pop();
}
