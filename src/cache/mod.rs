//! Result cache for catalog reads.
//!
//! The catalog service talks to an injected [`CacheStore`]; the production
//! store is [`LocalCache`], and tests drive expiry with [`ManualClock`].

pub mod backend;
pub mod clock;

pub use backend::{CacheStore, CachedEntry, LocalCache};
pub use clock::{Clock, ManualClock, SystemClock};
