//! An empirical collision-search harness for small seeded hash
//! constructions.
//!
//! A corpus of strings is read once into an append-only arena, then
//! re-hashed under many random 64-bit seeds. For each seed, every group
//! of corpus entries sharing a digest is reported. High collision counts
//! point at weaknesses in the construction's mixing step; the engine
//! itself is agnostic to which construction is plugged in.

pub mod arena;
pub mod corpus;
pub mod detect;
pub mod error;
pub mod hashers;
pub mod radix;
pub mod search;
pub mod seed;

pub use arena::Arena;
pub use corpus::{Corpus, read_corpus};
pub use detect::{CollisionSink, HashEntry, StdoutSink};
pub use error::Error;
pub use hashers::{Folded, MIN_INPUT_LEN, SeedHasher, ZrHa, ZrHaWide};
pub use search::{MAX_THREADS, SearchConfig};
pub use seed::SeedStream;
