// ── Reactive data store ──
//
// Node inventory and live status, published through `watch` channels.

mod collection;
mod data_store;
mod query;

pub use data_store::{DataStore, group_names, online_set};
pub use query::NodeQuery;
