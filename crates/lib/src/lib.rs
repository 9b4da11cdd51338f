//! specbuild-lib: Core types and logic for specbuild
//!
//! This crate turns a directory of OpenAPI specifications into a build graph
//! and drives it:
//! - `discovery`: finds specification files
//! - `naming`: derives package names and task ids, rejects collisions
//! - `graph`: builds the generate → compile → package DAG with fan-in nodes
//! - `execute`: runs the graph wave by wave against a `Toolchain`
//! - `publish`: resolves credentials and artifacts, uploads to a Maven repository
//! - `pipeline`: ties the configuration and execution phases together

pub mod config;
pub mod consts;
pub mod discovery;
pub mod execute;
pub mod graph;
pub mod naming;
pub mod pipeline;
pub mod publish;
pub mod toolchain;
pub mod util;
