// Stage-per-module structure for the tracetail pipeline.

// Pipeline stages, in stream order
pub mod group;
pub mod chunk;
pub mod frame;
pub mod parser;

// Records and analysis
pub mod record;
pub mod tree;
pub mod filter;
pub mod engine;

// Host side
pub mod conf;
pub mod source;
pub mod runtime;
