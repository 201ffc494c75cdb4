// Copyright (c) 2025 SCTG Development
// This file is part of the rust-scale-gateway project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Line framing codec for the scale's serial stream
//!
//! The scale terminates every transmission with the exact two-byte delimiter
//! `\r\n`. This codec buffers partial lines until the delimiter arrives and
//! yields one event per completed line. A bare `\n` or `\r` inside a line is
//! not a delimiter and stays part of the line text.
//!
//! A malformed stream that never emits the delimiter would otherwise grow the
//! buffer without bound, so the codec enforces a maximum buffered-line
//! length. On overflow the buffer is cleared, an [`LineEvent::Overflow`] is
//! emitted once, and everything up to the next delimiter is discarded before
//! decoding resumes.

use bytes::{Buf, BytesMut};
use std::io;
use tokio_util::codec::Decoder;

/// The scale's line delimiter
pub const LINE_DELIMITER: &[u8] = b"\r\n";

/// One decoded event from the serial stream
#[derive(Debug, Clone, PartialEq)]
pub enum LineEvent {
    /// A complete line, delimiter stripped
    Line(String),
    /// An over-length line was dropped; `dropped` counts the discarded bytes
    Overflow { dropped: usize },
}

/// Splits the raw byte stream into lines on the `\r\n` delimiter
#[derive(Debug, Clone)]
pub struct LineCodec {
    max_line_length: usize,
    /// True while dropping the remainder of an over-length line
    discarding: bool,
}

impl LineCodec {
    /// Create a codec that refuses to buffer more than `max_line_length`
    /// bytes of a single line
    pub fn new(max_line_length: usize) -> Self {
        Self {
            max_line_length,
            discarding: false,
        }
    }
}

/// Position of the first `\r\n` in `buf`, if any
fn find_delimiter(buf: &[u8]) -> Option<usize> {
    buf.windows(LINE_DELIMITER.len())
        .position(|window| window == LINE_DELIMITER)
}

/// Buffered length of the incomplete line. A trailing `\r` may be the first
/// delimiter byte, so it counts neither toward the line length nor as
/// droppable data.
fn buffered_line_len(buf: &[u8]) -> usize {
    buf.len() - usize::from(buf.last() == Some(&b'\r'))
}

/// Drop buffered bytes, keeping a trailing `\r` so a delimiter split across
/// two reads is still recognized. Returns the number of bytes dropped.
fn drop_buffered(buf: &mut BytesMut) -> usize {
    let dropped = buffered_line_len(buf);
    buf.advance(dropped);
    dropped
}

impl Decoder for LineCodec {
    type Item = LineEvent;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<LineEvent>, io::Error> {
        loop {
            match find_delimiter(buf) {
                Some(position) => {
                    let frame = buf.split_to(position + LINE_DELIMITER.len());
                    if self.discarding {
                        // Tail of an over-length line; drop it and look for
                        // the next complete line in the same buffer.
                        self.discarding = false;
                        continue;
                    }
                    let line = String::from_utf8_lossy(&frame[..position]).into_owned();
                    return Ok(Some(LineEvent::Line(line)));
                }
                None if self.discarding => {
                    drop_buffered(buf);
                    return Ok(None);
                }
                None if buffered_line_len(buf) > self.max_line_length => {
                    self.discarding = true;
                    let dropped = drop_buffered(buf);
                    return Ok(Some(LineEvent::Overflow { dropped }));
                }
                None => return Ok(None),
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<LineEvent>, io::Error> {
        match self.decode(buf)? {
            Some(event) => Ok(Some(event)),
            None => {
                // The stream closed mid-line; the partial never parses.
                buf.clear();
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(codec: &mut LineCodec, buf: &mut BytesMut) -> Vec<LineEvent> {
        let mut events = Vec::new();
        while let Some(event) = codec.decode(buf).unwrap() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_decodes_complete_line() {
        let mut codec = LineCodec::new(512);
        let mut buf = BytesMut::from(&b"2717.5 g\r\n"[..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(LineEvent::Line("2717.5 g".to_string()))
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_buffers_partial_line_across_reads() {
        let mut codec = LineCodec::new(512);
        let mut buf = BytesMut::from(&b"2717"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b".5 g\r\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(LineEvent::Line("2717.5 g".to_string()))
        );
    }

    #[test]
    fn test_decodes_multiple_lines_from_one_read() {
        let mut codec = LineCodec::new(512);
        let mut buf = BytesMut::from(&b"100 lb\r\n200 lb\r\n"[..]);
        let events = decode_all(&mut codec, &mut buf);
        assert_eq!(
            events,
            vec![
                LineEvent::Line("100 lb".to_string()),
                LineEvent::Line("200 lb".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_line_is_a_line() {
        let mut codec = LineCodec::new(512);
        let mut buf = BytesMut::from(&b"\r\n"[..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(LineEvent::Line(String::new()))
        );
    }

    #[test]
    fn test_bare_newline_is_not_a_delimiter() {
        let mut codec = LineCodec::new(512);
        let mut buf = BytesMut::from(&b"100\nlb\r\n"[..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(LineEvent::Line("100\nlb".to_string()))
        );
    }

    #[test]
    fn test_delimiter_split_across_reads() {
        let mut codec = LineCodec::new(512);
        let mut buf = BytesMut::from(&b"13 kg\r"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(LineEvent::Line("13 kg".to_string()))
        );
    }

    #[test]
    fn test_overflow_drops_line_and_resumes() {
        let mut codec = LineCodec::new(8);
        let mut buf = BytesMut::from(&b"0123456789abcdef"[..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(LineEvent::Overflow { dropped: 16 })
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        // Remainder of the runaway line is discarded up to the delimiter,
        // then decoding resumes with the next line.
        buf.extend_from_slice(b"tail of junk\r\n5 g\r\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(LineEvent::Line("5 g".to_string()))
        );
    }

    #[test]
    fn test_line_at_the_limit_survives_a_split_delimiter() {
        // 8 bytes of content against a limit of 8, delimiter in one chunk
        let mut codec = LineCodec::new(8);
        let mut buf = BytesMut::from(&b"2717.5 g\r\n"[..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(LineEvent::Line("2717.5 g".to_string()))
        );

        // The same line must not be dropped as overflow just because the
        // read boundary falls between the `\r` and the `\n`
        let mut buf = BytesMut::from(&b"2717.5 g\r"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(LineEvent::Line("2717.5 g".to_string()))
        );
    }

    #[test]
    fn test_overflow_recovery_with_split_delimiter() {
        let mut codec = LineCodec::new(4);
        let mut buf = BytesMut::from(&b"too long\r"[..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(LineEvent::Overflow { dropped: 8 })
        );
        // The trailing carriage return is retained so the delimiter is still
        // seen when the line feed arrives in the next read.
        buf.extend_from_slice(b"\n42 g\r\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(LineEvent::Line("42 g".to_string()))
        );
    }

    #[test]
    fn test_eof_discards_partial_line() {
        let mut codec = LineCodec::new(512);
        let mut buf = BytesMut::from(&b"half a rea"[..]);
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }
}
