use crate::search::MAX_THREADS;

/// Everything that can abort a run. There is no recovery anywhere: the
/// binary logs the error and exits non-zero.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("arena exhausted: string storage would exceed the 32-bit handle space")]
    ArenaExhausted,

    #[error("reading input: {0}")]
    Io(#[from] std::io::Error),

    #[error("entropy source failed: {0}")]
    Entropy(#[from] getrandom::Error),

    #[error("thread count must be between 1 and {MAX_THREADS}, got {0}")]
    BadThreadCount(usize),

    #[error("trial count must be positive")]
    NoTrials,

    #[error("building worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
