//! Length-prefixed frame codec for the command channel.
//!
//! A frame is a fixed-width ASCII-decimal byte count, right-padded with
//! spaces, followed by exactly that many bytes of UTF-8 payload. The sender
//! writes the header synchronously before the payload; the codec never
//! buffers across frames. One connection carries exactly one command frame
//! plus one disconnect frame, then the sender closes.

use std::io::{ErrorKind, Read};
use std::str;

use crate::core::error::{Error, Result};

/// Width of the length header in bytes.
pub const HEADER_WIDTH: usize = 64;

pub fn encode_frame(payload: &str) -> Vec<u8> {
    let bytes = payload.as_bytes();
    let mut frame =
        format!("{:<width$}", bytes.len(), width = HEADER_WIDTH).into_bytes();
    frame.extend_from_slice(bytes);
    frame
}

/// Blocking-reads one frame and returns its payload.
///
/// Fails with [`Error::TruncatedFrame`] if the stream ends before the header
/// or the advertised payload is complete; a truncation right at a frame
/// boundary is simply the peer hanging up.
pub fn decode_frame(reader: &mut impl Read) -> Result<String> {
    let mut header = [0u8; HEADER_WIDTH];
    read_exact_or_truncated(reader, &mut header)?;

    let header = str::from_utf8(&header)
        .map_err(|_| Error::MalformedFrame("header is not ASCII".into()))?;
    let length: usize = header.trim().parse().map_err(|_| {
        Error::MalformedFrame(format!(
            "header {:?} is not a decimal length",
            header.trim_end()
        ))
    })?;

    let mut payload = vec![0u8; length];
    read_exact_or_truncated(reader, &mut payload)?;

    String::from_utf8(payload)
        .map_err(|_| Error::MalformedFrame("payload is not UTF-8".into()))
}

fn read_exact_or_truncated(
    reader: &mut impl Read,
    buf: &mut [u8],
) -> Result<()> {
    let expected = buf.len();
    let mut filled = 0;

    while filled < expected {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(Error::TruncatedFrame {
                    expected,
                    actual: filled,
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
