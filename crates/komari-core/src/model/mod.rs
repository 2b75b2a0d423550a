// ── Domain model ──
//
// Canonical types built from the raw `komari_api` wire models by
// `crate::convert`. Timestamps are parsed, tags are split, and every
// node-keyed map uses the node uuid as key.

pub mod node;
pub mod record;
pub mod status;

pub use node::{Node, NodeSort};
pub use record::{PingHistory, PingRecord, PingTask, Record};
pub use status::LiveStatus;
