//! ahf-core: single-pass adaptive Huffman compression
//!
//! This library compresses a byte stream in one pass, without collecting
//! statistics first. The code tree starts with only two control leaves and
//! grows and rebalances as bytes are seen:
//! - an unseen byte is sent as the ESCAPE code plus an 8-bit literal
//! - every coded byte bumps its leaf weight and restores the sibling property
//! - when the root weight nears its ceiling, all weights are halved and the
//!   tree is rebuilt
//!
//! # Architecture
//!
//! - `bitio`: MSB-first bit reading/writing over `Read`/`Write`
//! - `tree`: the self-adjusting code tree (insert, update, swap, rebuild)
//! - `codec`: symbol-level encoder/decoder and whole-stream encode/decode
//! - `container`: the `.ahf` layout (extension header + coded body)
//! - `progress`: injectable progress observers
//! - `metrics`: run statistics and reporting
//!
//! # Example
//! ```
//! let packed = ahf_core::container::encode_bytes("txt", b"abracadabra").unwrap();
//! let (ext, data) = ahf_core::container::decode_bytes(&packed).unwrap();
//! assert_eq!(ext, "txt");
//! assert_eq!(data, b"abracadabra");
//! ```

pub mod bitio;
pub mod codec;
pub mod container;
pub mod error;
pub mod metrics;
pub mod progress;
pub mod tree;

// Re-export commonly used types
pub use codec::{decode, encode, CodecStats, Decoder, Encoder, Summary};
pub use error::{Error, Result};
pub use progress::{NoProgress, Progress};
pub use tree::{CodeTree, Symbol, MAX_WEIGHT};
