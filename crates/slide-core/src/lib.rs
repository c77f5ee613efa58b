pub mod classify;
pub mod css;
pub mod emitter;
pub mod id;
pub mod layout;
pub mod metrics;
pub mod model;
pub mod parser;
pub mod transient;

pub use classify::{Capabilities, CapabilityCache, classify};
pub use emitter::{emit_markup, emit_subtree};
pub use id::NodeId;
pub use layout::{effective_style, resolve_layout};
pub use metrics::{ApproxMetrics, TextMetrics};
pub use model::*;
pub use parser::{ParseError, parse_slide};
pub use transient::{CleanReport, clean_for_save, settle_snapshot, strip_transients};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
