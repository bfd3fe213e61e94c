//! Caching subsystem.
//!
//! - [`rotation`]: the pure deduplicating rotation cache used to assemble
//!   the "For You" discovery section.
//! - [`discovery::DiscoveryCacheStore`]: per-user holder for rotation
//!   state. Bounded and idle-expiring (moka); callers replace the state
//!   wholesale with the output of the pure functions.

pub mod discovery;
pub mod rotation;

pub use discovery::{DiscoveryCacheStore, DiscoveryConfig};
pub use rotation::{
    CacheEntry, CacheState, IdentityKey, expire_fresh_slots, get_all_items, is_fresh_slot_expired,
    needs_more_items, rotate_cache, rotate_cache_at,
};
