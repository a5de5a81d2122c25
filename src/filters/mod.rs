//! Filter state, its URL codec and persistence

pub mod debounce;
pub mod store;
pub mod sync;
pub mod url;

pub use debounce::Debouncer;
pub use store::FilterStore;
pub use sync::{FilterSynchronizer, LoadSource, LoadedState, LocationSink, MemoryLocation};
pub use url::{decode_state, encode_state, DecodedState};
