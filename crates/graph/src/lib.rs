pub mod export;
pub mod model;
pub mod sink;

pub use export::{EXPORT_FILE_NAME, ExportError, export_triplets, triplets_json};
pub use model::{Edge, GraphModel, build_graph};
pub use sink::{DotSink, NullSink, RenderSink, to_dot};
