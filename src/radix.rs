//! Sorting the trial's hash entries.
//!
//! A comparison sort covers modest sizes; above the cutoff an 8-pass
//! least-significant-byte radix sort takes over, linear in the input and
//! free of branchy comparisons.

use crate::arena::Arena;
use crate::detect::HashEntry;

/// Below this many entries `sort_unstable_by_key` wins; the radix sort's
/// fixed costs (scratch buffer, 16 KiB of count tables) only pay off at
/// scale.
const RADIX_CUTOFF: usize = 2048;

/// Sorts by hash ascending. Ties land in unspecified order; the detector
/// only cares that equal hashes end up adjacent.
pub fn sort_entries(entries: &mut Vec<HashEntry>, scratch: &mut Vec<HashEntry>) {
    if entries.len() < RADIX_CUTOFF {
        entries.sort_unstable_by_key(|e| e.hash);
        return;
    }
    radix_sort(entries, scratch);
}

/// Two-buffer LSB radix sort over the 64-bit hash, 256 buckets per byte
/// position. Exposed so tests can drive it at any size.
pub fn radix_sort(entries: &mut Vec<HashEntry>, scratch: &mut Vec<HashEntry>) {
    // Pad odd lengths so the scatter loops can walk pairs of entries.
    // Every pass is stable, so the max-keyed pad appended last also
    // leaves the sort in the final slot and is popped unconditionally.
    let padded = entries.len() % 2 != 0;
    if padded {
        entries.push(HashEntry {
            hash: u64::MAX,
            handle: Arena::NULL,
        });
    }
    let n = entries.len();
    scratch.resize(
        n,
        HashEntry {
            hash: 0,
            handle: Arena::NULL,
        },
    );

    // One linear pass fills the count tables for all eight byte
    // positions at once.
    let mut counts = [[0usize; 256]; 8];
    for pair in entries.as_chunks::<2>().0 {
        for e in pair {
            let h = e.hash;
            for (pass, table) in counts.iter_mut().enumerate() {
                table[(h >> (pass * 8)) as usize & 0xff] += 1;
            }
        }
    }

    let mut src: &mut [HashEntry] = &mut entries[..];
    let mut dst: &mut [HashEntry] = &mut scratch[..];
    let mut in_scratch = false;
    for (pass, table) in counts.iter().enumerate() {
        // A pass where every entry shares the byte would move nothing.
        if table.iter().any(|&c| c == n) {
            continue;
        }
        // Exclusive prefix sum: bucket i starts where the buckets below
        // it end. Bumping a head as it is consumed keeps the pass stable.
        let mut heads = [0usize; 256];
        let mut pos = 0;
        for (head, &count) in heads.iter_mut().zip(table) {
            *head = pos;
            pos += count;
        }
        let shift = pass * 8;
        for pair in src.as_chunks::<2>().0 {
            for &e in pair {
                let bucket = (e.hash >> shift) as usize & 0xff;
                // Safety: bucket is masked below 256, and heads stay
                // below n because the table's counts sum to n.
                unsafe {
                    let slot = heads.get_unchecked_mut(bucket);
                    *dst.get_unchecked_mut(*slot) = e;
                    *slot += 1;
                }
            }
        }
        std::mem::swap(&mut src, &mut dst);
        in_scratch = !in_scratch;
    }

    if in_scratch {
        // Odd number of executed passes: the result sits in the scratch
        // buffer. Hand it back through the caller's.
        entries.copy_from_slice(scratch);
    }
    if padded {
        let pad = entries.pop();
        debug_assert!(pad.is_some_and(|p| { p.handle } == Arena::NULL));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entries_from(pairs: &[(u64, u32)]) -> Vec<HashEntry> {
        pairs
            .iter()
            .map(|&(hash, handle)| HashEntry { hash, handle })
            .collect()
    }

    /// The radix sort must agree with a comparison sort: same multiset,
    /// hashes ascending.
    fn check_against_reference(mut entries: Vec<HashEntry>) {
        let mut reference: Vec<(u64, u32)> = entries.iter().map(|e| (e.hash, e.handle)).collect();
        reference.sort_unstable();

        let mut scratch = Vec::new();
        radix_sort(&mut entries, &mut scratch);

        assert_eq!(entries.len(), reference.len());
        let mut got: Vec<(u64, u32)> = entries.iter().map(|e| (e.hash, e.handle)).collect();
        for w in got.windows(2) {
            assert!(w[0].0 <= w[1].0, "hashes not ascending");
        }
        got.sort_unstable();
        assert_eq!(got, reference);
    }

    #[test]
    fn tiny_sizes() {
        check_against_reference(vec![]);
        check_against_reference(entries_from(&[(42, 1)]));
        check_against_reference(entries_from(&[(2, 1), (1, 2)]));
    }

    #[test]
    fn odd_length_exercises_the_pad() {
        let mut rng = fastrand::Rng::with_seed(1);
        let entries: Vec<HashEntry> = (0..4097u32)
            .map(|i| HashEntry {
                hash: rng.u64(..),
                handle: i + 1,
            })
            .collect();
        check_against_reference(entries);
    }

    #[test]
    fn max_keys_and_pad_coexist() {
        // Odd length with real max-valued keys: stability must pop the
        // pad, not a corpus entry.
        check_against_reference(entries_from(&[(u64::MAX, 1), (3, 2), (u64::MAX, 3)]));
    }

    #[test]
    fn single_spread_byte_skips_trivial_passes() {
        let mut rng = fastrand::Rng::with_seed(2);
        let entries: Vec<HashEntry> = (0..4096u32)
            .map(|i| HashEntry {
                hash: (rng.u64(..) & 0xff) << 24,
                handle: i + 1,
            })
            .collect();
        check_against_reference(entries);
    }

    #[test]
    fn all_equal_keys() {
        let entries: Vec<HashEntry> = (0..4096u32)
            .map(|i| HashEntry {
                hash: 7,
                handle: i + 1,
            })
            .collect();
        check_against_reference(entries);
    }

    #[test]
    fn a_million_random_entries() {
        let mut rng = fastrand::Rng::with_seed(3);
        let entries: Vec<HashEntry> = (0..1_000_000u32)
            .map(|i| HashEntry {
                hash: rng.u64(..),
                handle: i + 1,
            })
            .collect();
        check_against_reference(entries);
    }

    #[test]
    fn dispatch_agrees_around_the_cutoff() {
        let mut rng = fastrand::Rng::with_seed(4);
        for size in [RADIX_CUTOFF - 1, RADIX_CUTOFF, RADIX_CUTOFF + 1] {
            let mut entries: Vec<HashEntry> = (0..size as u32)
                .map(|i| HashEntry {
                    hash: rng.u64(..0x1000),
                    handle: i + 1,
                })
                .collect();
            let mut reference: Vec<u64> = entries.iter().map(|e| e.hash).collect();
            reference.sort_unstable();
            let mut scratch = Vec::new();
            sort_entries(&mut entries, &mut scratch);
            let got: Vec<u64> = entries.iter().map(|e| e.hash).collect();
            assert_eq!(got, reference);
        }
    }

    proptest! {
        #[test]
        fn matches_comparison_sort(pairs in prop::collection::vec((any::<u64>(), any::<u32>()), 0..1000)) {
            check_against_reference(entries_from(&pairs));
        }

        #[test]
        fn narrow_keys_with_heavy_ties(pairs in prop::collection::vec((0u64..512, any::<u32>()), 0..5000)) {
            check_against_reference(entries_from(&pairs));
        }
    }
}
