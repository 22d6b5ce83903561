//! ASCII I/O: mesh loading, tree serialization and query-input files.

pub mod filename;
pub mod reader;
pub mod writer;

pub use filename::{parse_tree_filename, tree_filename, TreeFileConfig};
pub use reader::{read_boxes, read_mesh, read_points, read_segments, read_tree};
pub use writer::{write_points, write_segments, write_tree};
