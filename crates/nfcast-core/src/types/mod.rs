//! Pipeline data types.
//!
//! Each pipeline stage has its own tagged structure: header and raw records
//! out of the decoder, depth records out of the decompressor, quotes out of
//! the normalizer. A raw paise-scaled value can thus never be confused with a
//! normalized rupee-scaled one.

pub mod packet;
pub mod quote;

pub use packet::*;
pub use quote::*;
