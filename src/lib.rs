//! Streaming search-and-replace engine
//!
//! Splits a byte stream into parts on a configurable separator, applies
//! ordered substitution rules to each completed part, and writes results
//! out incrementally, so inputs never need to fit in memory.
//!
//! ```no_run
//! use std::io::Cursor;
//! use stredit::{process_streaming, EditOptions, RuleSpec};
//!
//! let opts = EditOptions::new().rule(RuleSpec::pattern(r"v(\d+)", "2"));
//! let mut input = Cursor::new(b"version v1\n".to_vec());
//! let mut output = Vec::new();
//! process_streaming(&mut input, &mut output, &opts).unwrap();
//! assert_eq!(output, b"version v2\n");
//! ```

pub mod cli;
pub mod decoder;
pub mod error;
pub mod logger;
pub mod options;
pub mod pattern;
pub mod placeholder;
pub mod processor;
pub mod rule;
pub mod streams;
pub mod transform;

pub use decoder::InputEncoding;
pub use error::{EditError, EditResult};
pub use options::{AbortHandle, EditOptions, Separator};
pub use processor::{Join, PostProcessFn};
pub use rule::{MatchContext, ReplacementSpec, RuleSpec, Search};
pub use streams::{
    edit_file, edit_files, for_each_part, merge_sources, process_streaming, tee_stream,
};
pub use transform::{ChunkOutcome, StreamTransform};
