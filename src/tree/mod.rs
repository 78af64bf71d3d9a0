//! Filesystem tree: node model, scanner, and expand/collapse state.

pub mod node;
pub mod scanner;
pub mod state;

pub use node::{join_path, DirectoryNode, FileNode, Node, TreeSnapshot};
pub use scanner::{DirectoryScanner, ScanErrorPolicy, ScanReport};
pub use state::TreeState;
