//! Build graph construction.
//!
//! Each specification contributes a generate → compile → package chain. An
//! aggregator (`generateAllOpenApi`) fans in every generate node, the root
//! compile node (`compileJava`) waits on the aggregator, and the root build
//! node (`build`) waits on every package node.

mod builder;
mod dag;
mod types;

pub use builder::{build_graph, generator_options};
pub use dag::BuildGraph;
pub use types::*;
