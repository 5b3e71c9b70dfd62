//! Compares strategies for finding equal-hash groups: the in-crate radix
//! sort against a comparison sort and voracious, plus map-based grouping
//! as the non-sorting baseline.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use collider::HashEntry;
use collider::radix;
use dashmap::DashMap;
use rayon::prelude::*;
use voracious_radix_sort::RadixSort;

fn benchmark(name: &str, repeats: usize, mut f: impl FnMut()) {
    // Warmup.
    for _ in 0..repeats {
        f();
    }
    let start = Instant::now();
    for _ in 0..repeats {
        f();
    }
    let duration = start.elapsed();
    println!("  {}: {}", name, human_time(repeats, duration));
}

fn human_time(repeats: usize, duration: Duration) -> String {
    let mut duration = duration.as_nanos() as f64 / repeats as f64;
    if duration < 1000.0 {
        return format!("{:.1}ns", duration);
    }
    duration /= 1000.0;
    if duration < 1000.0 {
        return format!("{:.1}us", duration);
    }
    duration /= 1000.0;
    if duration < 1000.0 {
        return format!("{:.1}ms", duration);
    }
    duration /= 1000.0;
    format!("{:.1}s", duration)
}

fn human_size(size: usize) -> String {
    if size < 1024 {
        return format!("{}B", size);
    }
    let mut size = size as f64;
    size /= 1024.0;
    if size < 1024.0 {
        return format!("{}KiB", size);
    }
    size /= 1024.0;
    if size < 1024.0 {
        return format!("{}MiB", size);
    }
    size /= 1024.0;
    format!("{}GiB", size)
}

fn count_groups_sorted(sorted: &[HashEntry]) -> usize {
    let mut groups = 0;
    let mut i = 1;
    while i < sorted.len() {
        let h = sorted[i - 1].hash;
        if sorted[i].hash == h {
            let mut j = i + 1;
            while j < sorted.len() && sorted[j].hash == h {
                j += 1;
            }
            groups += 1;
            i = j + 1;
        } else {
            i += 1;
        }
    }
    groups
}

fn main() {
    let mut rng = fastrand::Rng::with_seed(0);
    for lg_size in [10, 15, 20, 22] {
        let n = 1usize << lg_size;
        // Mask the keys into an n-sized space so there is a small but
        // nonzero number of duplicates to group.
        let mask = (1u64 << lg_size) - 1;
        let base: Vec<HashEntry> = (0..n)
            .map(|i| HashEntry {
                hash: rng.u64(..) & mask,
                handle: i as u32 + 1,
            })
            .collect();
        let repeats = 1usize << 22usize.saturating_sub(lg_size);
        println!(
            "size: {}",
            human_size(std::mem::size_of::<HashEntry>() * base.len())
        );

        let mut buf = base.clone();
        let mut scratch: Vec<HashEntry> = Vec::new();

        benchmark("sort_unstable_by_key", repeats, || {
            buf.copy_from_slice(&base);
            buf.sort_unstable_by_key(|e| e.hash);
            let _ = count_groups_sorted(&buf);
        });

        benchmark("radix (in-crate)", repeats, || {
            buf.copy_from_slice(&base);
            radix::radix_sort(&mut buf, &mut scratch);
            let _ = count_groups_sorted(&buf);
        });

        benchmark("voracious", repeats, || {
            buf.copy_from_slice(&base);
            buf.voracious_sort();
            let _ = count_groups_sorted(&buf);
        });

        benchmark("voracious_mt", repeats, || {
            buf.copy_from_slice(&base);
            buf.voracious_mt_sort(rayon::current_num_threads());
            let _ = count_groups_sorted(&buf);
        });

        benchmark("HashMap", repeats, || {
            let mut map: HashMap<u64, u32> = HashMap::with_capacity(base.len());
            for e in &base {
                *map.entry(e.hash).or_insert(0) += 1;
            }
            let _ = map.values().filter(|&&c| c >= 2).count();
        });

        benchmark("DashMap (par)", repeats, || {
            let map: DashMap<u64, u32> = DashMap::with_capacity(base.len());
            base.par_chunks(4096).for_each(|chunk| {
                for e in chunk {
                    *map.entry(e.hash).or_insert(0) += 1;
                }
            });
            let _ = map.iter().filter(|kv| *kv.value() >= 2).count();
        });

        benchmark("scc::HashMap (par)", repeats, || {
            let map: scc::HashMap<u64, u32> = scc::HashMap::with_capacity(base.len());
            base.par_chunks(4096).for_each(|chunk| {
                for e in chunk {
                    map.entry(e.hash).and_modify(|c| *c += 1).or_insert(1);
                }
            });
            let mut groups = 0usize;
            map.scan(|_, &c| {
                if c >= 2 {
                    groups += 1;
                }
            });
            let _ = groups;
        });
    }
}
