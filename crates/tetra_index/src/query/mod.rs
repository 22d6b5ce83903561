//! Query engines over a built tree: spatial (point, box, segment) and
//! topological (VT, TT, distortion, borders).

pub mod border;
pub mod spatial;
pub mod stats;
pub mod topological;

pub use border::compute_borders;
pub use spatial::{box_query, line_query, locate_point};
pub use stats::{MinAvgMax, QueryStats, QuerySummary};
pub use topological::{
  batched_tt, batched_vt, linearized_tt, windowed_distortion, windowed_tt, windowed_vt, BatchedTt,
  BatchedVt,
};
