//! The seed-space search: many independent trials pulled off a shared
//! counter by a fixed pool of workers.

use parking_lot::Mutex;

use crate::corpus::Corpus;
use crate::detect::{self, CollisionSink, HashEntry};
use crate::error::Error;
use crate::hashers::SeedHasher;
use crate::seed::SeedStream;

/// Hard ceiling on the worker pool; anything larger is a configuration
/// mistake, not a workload.
pub const MAX_THREADS: usize = 256;

#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Total trials across all workers.
    pub trials: u64,
    /// Worker thread count.
    pub threads: usize,
}

/// The only mutable state trials share. Drawing decrements the
/// remaining-trial count and advances the seed stream in one locked
/// step, so no two workers can observe the same seed.
struct SeedCounter {
    remaining: u64,
    stream: SeedStream,
}

impl SeedCounter {
    fn draw(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.stream.next_seed())
    }
}

/// One trial: hash every corpus string under `seed`, then sort and scan
/// for collision groups. Runs entirely on worker-owned buffers plus
/// read-only corpus access.
pub fn run_trial<H: SeedHasher, S: CollisionSink + ?Sized>(
    corpus: &Corpus,
    hasher: &H,
    seed: u64,
    entries: &mut Vec<HashEntry>,
    scratch: &mut Vec<HashEntry>,
    sink: &S,
) {
    let arena = corpus.arena();
    entries.clear();
    for &handle in corpus.handles() {
        let hash = hasher.hash(arena.get(handle), seed);
        entries.push(HashEntry { hash, handle });
    }
    detect::find_collisions(entries, scratch, arena, seed, sink);
}

/// Runs `config.trials` trials over `config.threads` workers and joins
/// them all before returning. Workers pull seeds from the shared counter
/// until it is exhausted; a worker panic propagates out of the pool.
pub fn run<H, S>(
    corpus: &Corpus,
    hasher: &H,
    sink: &S,
    config: &SearchConfig,
    stream: SeedStream,
) -> Result<(), Error>
where
    H: SeedHasher + Sync,
    S: CollisionSink,
{
    if config.trials == 0 {
        return Err(Error::NoTrials);
    }
    if config.threads == 0 || config.threads > MAX_THREADS {
        return Err(Error::BadThreadCount(config.threads));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;
    let counter = Mutex::new(SeedCounter {
        remaining: config.trials,
        stream,
    });

    pool.broadcast(|_| {
        // Allocated once per worker and reused for every one of its
        // trials; room for the radix pad and the scan sentinel.
        let mut entries: Vec<HashEntry> = Vec::with_capacity(corpus.len() + 2);
        let mut scratch: Vec<HashEntry> = Vec::with_capacity(corpus.len() + 1);
        loop {
            let Some(seed) = counter.lock().draw() else {
                break;
            };
            run_trial(corpus, hasher, seed, &mut entries, &mut scratch, sink);
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashers::ZrHa;

    struct NullSink;

    impl CollisionSink for NullSink {
        fn group(&self, _seed: u64, _hash: u64, _strings: &[&[u8]]) {}
    }

    fn tiny_corpus() -> Corpus {
        let mut corpus = Corpus::with_arena_capacity(0);
        corpus.push(b"one string").unwrap();
        corpus
    }

    #[test]
    fn zero_trials_is_rejected() {
        let config = SearchConfig { trials: 0, threads: 1 };
        let err = run(&tiny_corpus(), &ZrHa, &NullSink, &config, SeedStream::new(1));
        assert!(matches!(err, Err(Error::NoTrials)));
    }

    #[test]
    fn zero_threads_is_rejected() {
        let config = SearchConfig { trials: 1, threads: 0 };
        let err = run(&tiny_corpus(), &ZrHa, &NullSink, &config, SeedStream::new(1));
        assert!(matches!(err, Err(Error::BadThreadCount(0))));
    }

    #[test]
    fn oversized_pool_is_rejected() {
        let config = SearchConfig { trials: 1, threads: MAX_THREADS + 1 };
        let err = run(&tiny_corpus(), &ZrHa, &NullSink, &config, SeedStream::new(1));
        assert!(matches!(err, Err(Error::BadThreadCount(_))));
    }

    #[test]
    fn empty_corpus_runs_to_completion() {
        let corpus = Corpus::with_arena_capacity(0);
        let config = SearchConfig { trials: 8, threads: 2 };
        run(&corpus, &ZrHa, &NullSink, &config, SeedStream::new(7)).unwrap();
    }
}
