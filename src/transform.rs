//! The chunk-level transform: reassembles arbitrary byte chunks into
//! separator-delimited parts, feeds each completed part through the rule
//! processor, and handles the limit transition
//!
//! Chunks arrive cut at arbitrary byte positions, so the trailing
//! fragment of every chunk is buffered until the next chunk (or EOF)
//! completes it. Once the stream-wide replacement limit fires the
//! transform either truncates the stream or stops editing and passes the
//! remainder through verbatim.

use crate::decoder::IncrementalDecoder;
use crate::error::{EditError, EditResult};
use crate::options::{EditOptions, Separator};
use crate::processor::{PartProcessor, PostProcessing};
use crate::rule::RuleSet;

/// What the caller should do after feeding a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// Keep feeding chunks.
    Continue,
    /// The stream was truncated; stop reading the source.
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Normal operation: buffering fragments, editing completed parts.
    Editing,
    /// Limit fired mid-chunk; the current buffer still needs to be
    /// re-emitted verbatim before plain pass-through starts.
    PassthroughArmed,
    /// Limit fired and the buffer was flushed; chunks now pass through
    /// decoded but unedited.
    Passthrough,
    /// Limit fired with truncation on; nothing more is emitted.
    Truncated,
}

/// One stream's worth of transform state.
///
/// Feed it chunks with `push_chunk`, finish with `finish`, then call
/// `finalize_rules` to run the post-completion match-count assertions.
pub struct StreamTransform {
    state: State,
    decoder: IncrementalDecoder,
    separator: Separator,
    processor: PartProcessor,
    buffer: String,
    max_length: usize,
    truncate: bool,
}

impl StreamTransform {
    pub fn new(options: &EditOptions) -> EditResult<Self> {
        options.validate()?;
        let rules = RuleSet::compile(&options.rules, options.limit)?;
        let post = match &options.post_processing {
            Some(f) => PostProcessing::Custom(f.clone()),
            None => PostProcessing::Join(options.join.clone()),
        };
        Ok(Self {
            state: State::Editing,
            decoder: IncrementalDecoder::new(options.encoding),
            separator: options.separator.clone(),
            processor: PartProcessor::new(rules, post),
            buffer: String::new(),
            max_length: options.max_length,
            truncate: options.truncate,
        })
    }

    /// Feed one chunk of bytes; processed output lands in `out`.
    pub fn push_chunk(&mut self, bytes: &[u8], out: &mut Vec<String>) -> EditResult<ChunkOutcome> {
        match self.state {
            State::Truncated => Ok(ChunkOutcome::Ended),
            State::Passthrough => {
                let text = self.decoder.write(bytes);
                if !text.is_empty() {
                    out.push(text);
                }
                Ok(ChunkOutcome::Continue)
            }
            State::PassthroughArmed => {
                // flush the held fragment untouched, then pass through
                if !self.buffer.is_empty() {
                    out.push(std::mem::take(&mut self.buffer));
                }
                self.state = State::Passthrough;
                let text = self.decoder.write(bytes);
                if !text.is_empty() {
                    out.push(text);
                }
                Ok(ChunkOutcome::Continue)
            }
            State::Editing => self.push_editing(bytes, out),
        }
    }

    fn push_editing(&mut self, bytes: &[u8], out: &mut Vec<String>) -> EditResult<ChunkOutcome> {
        let text = self.decoder.write(bytes);
        let parts = self.separator.split(&text);

        if parts.len() == 1 {
            // no separator in this chunk: the fragment just grows
            self.buffer.push_str(parts[0]);
            if self.max_length > 0 && self.buffer.len() > self.max_length {
                return Err(EditError::buffer_overflow(self.max_length, &self.buffer));
            }
            return Ok(ChunkOutcome::Continue);
        }

        let mut first = std::mem::take(&mut self.buffer);
        first.push_str(parts[0]);
        let last_fragment = parts[parts.len() - 1].to_string();

        let mut armed = false;
        for i in 0..parts.len() - 1 {
            let part: &str = if i == 0 { &first } else { parts[i] };
            out.push(self.processor.process(part, false));

            if !armed && self.processor.limit_reached() {
                if self.truncate {
                    self.state = State::Truncated;
                    self.buffer.clear();
                    return Ok(ChunkOutcome::Ended);
                }
                armed = true;
            }
        }

        self.buffer = last_fragment;
        if armed {
            self.state = State::PassthroughArmed;
        }
        Ok(ChunkOutcome::Continue)
    }

    /// End of stream: flush the decoder and process the final part.
    pub fn finish(&mut self, out: &mut Vec<String>) -> EditResult<()> {
        match self.state {
            State::Truncated => Ok(()),
            State::Passthrough | State::PassthroughArmed => {
                let mut tail = std::mem::take(&mut self.buffer);
                tail.push_str(&self.decoder.finish());
                if !tail.is_empty() {
                    out.push(tail);
                }
                Ok(())
            }
            State::Editing => {
                let mut final_part = std::mem::take(&mut self.buffer);
                final_part.push_str(&self.decoder.finish());
                let processed = self.processor.process(&final_part, true);
                if !processed.is_empty() {
                    out.push(processed);
                }
                Ok(())
            }
        }
    }

    /// Post-completion assertions (required/min-times rules).
    pub fn finalize_rules(&self) -> EditResult<()> {
        self.processor.finalize()
    }
}
