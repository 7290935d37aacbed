//! # LZW Pack Library
//!
//! Compress or expand byte streams with the Lempel-Ziv-Welch algorithm.
//! Codes are packed MSB first with variable widths, 9 bits to start and
//! growing to 12 bits as the dictionary fills.  Code 256 clears the
//! dictionary and resets the width, code 257 stops the stream, so the
//! compressed format is self-delimiting with no header or checksum.
//!
//! The compression/expansion functions are generics that operate on trait
//! objects with bounds `Read` or `Write`.  There are convenience functions
//! for working directly with buffers.
//!
//! ## File Example
//!
//! ```rs
//! let mut in_file = std::fs::File::open("some_input_path").expect("open failed");
//! let mut out_file = std::fs::File::create("some_output_path").expect("create failed");
//! let (in_size,out_size) = lzwpack::lzw::compress(&mut in_file,&mut out_file)
//!     .expect("compression failed");
//! eprintln!("compressed {} into {}",in_size,out_size);
//! ```
//!
//! ## Buffer Example
//!
//! ```rs
//! let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
//! let compressed = lzwpack::lzw::compress_slice(test_data).expect("compression failed");
//! ```

mod tools;
pub mod lzw;

type DYNERR = Box<dyn std::error::Error>;

/// Codec Errors
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("invalid code in stream")]
    InvalidCode,
    #[error("stream ended before the stop code")]
    TruncatedStream,
    #[error("dictionary is full")]
    DictionaryFull
}
