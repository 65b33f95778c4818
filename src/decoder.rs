//! Incremental byte-to-text decoding
//!
//! Stream chunks can split a multi-byte sequence anywhere, so the
//! decoder keeps the incomplete tail of each chunk and prepends it to
//! the next. Invalid sequences decode to U+FFFD rather than failing the
//! stream.

/// Input byte encodings the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputEncoding {
    #[default]
    Utf8,
    /// Each byte maps directly to U+0000..U+00FF.
    Latin1,
}

/// Stateful decoder fed one chunk at a time.
#[derive(Debug)]
pub struct IncrementalDecoder {
    encoding: InputEncoding,
    pending: Vec<u8>,
}

impl IncrementalDecoder {
    pub fn new(encoding: InputEncoding) -> Self {
        Self {
            encoding,
            pending: Vec::new(),
        }
    }

    /// Decode one chunk, carrying any incomplete trailing sequence over
    /// to the next call.
    pub fn write(&mut self, bytes: &[u8]) -> String {
        match self.encoding {
            InputEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            InputEncoding::Utf8 => {
                self.pending.extend_from_slice(bytes);
                let mut out = String::with_capacity(self.pending.len());
                let mut rest: &[u8] = &self.pending;
                loop {
                    match std::str::from_utf8(rest) {
                        Ok(s) => {
                            out.push_str(s);
                            rest = &[];
                            break;
                        }
                        Err(e) => {
                            let valid = e.valid_up_to();
                            // SAFETY: valid_up_to marks a verified prefix
                            out.push_str(unsafe {
                                std::str::from_utf8_unchecked(&rest[..valid])
                            });
                            match e.error_len() {
                                Some(bad) => {
                                    out.push('\u{FFFD}');
                                    rest = &rest[valid + bad..];
                                }
                                None => {
                                    // incomplete tail, wait for more bytes
                                    rest = &rest[valid..];
                                    break;
                                }
                            }
                        }
                    }
                }
                let tail = rest.to_vec();
                self.pending = tail;
                out
            }
        }
    }

    /// Flush the decoder at end of stream. A dangling partial sequence
    /// becomes a single replacement character.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            "\u{FFFD}".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        let mut d = IncrementalDecoder::new(InputEncoding::Utf8);
        assert_eq!(d.write(b"hello"), "hello");
        assert_eq!(d.finish(), "");
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let bytes = "héllo".as_bytes();
        // split in the middle of the two-byte é
        let mut d = IncrementalDecoder::new(InputEncoding::Utf8);
        let mut out = d.write(&bytes[..2]);
        out.push_str(&d.write(&bytes[2..]));
        out.push_str(&d.finish());
        assert_eq!(out, "héllo");
    }

    #[test]
    fn test_four_byte_sequence_byte_by_byte() {
        let bytes = "𝄞".as_bytes();
        let mut d = IncrementalDecoder::new(InputEncoding::Utf8);
        let mut out = String::new();
        for b in bytes {
            out.push_str(&d.write(std::slice::from_ref(b)));
        }
        out.push_str(&d.finish());
        assert_eq!(out, "𝄞");
    }

    #[test]
    fn test_invalid_byte_becomes_replacement_char() {
        let mut d = IncrementalDecoder::new(InputEncoding::Utf8);
        assert_eq!(d.write(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_truncated_sequence_at_eof() {
        let mut d = IncrementalDecoder::new(InputEncoding::Utf8);
        assert_eq!(d.write(&[0xE2, 0x82]), "");
        assert_eq!(d.finish(), "\u{FFFD}");
    }

    #[test]
    fn test_latin1_maps_bytes_directly() {
        let mut d = IncrementalDecoder::new(InputEncoding::Latin1);
        assert_eq!(d.write(&[0x63, 0x61, 0x66, 0xE9]), "café");
        assert_eq!(d.finish(), "");
    }
}
