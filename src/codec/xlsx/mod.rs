//! Zip/XML container codec
//!
//! The only kind with true streaming in both directions: the source
//! decompresses worksheet XML on demand and scans it row by row, the sink
//! emits row XML straight into the output zip entry.

pub mod read;
pub mod write;
pub mod xml;
