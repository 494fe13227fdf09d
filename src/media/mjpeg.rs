//! Motion-JPEG marker scanning
//!
//! The stream socket carries JPEG images back to back with no length prefix
//! and no delimiter. Consumers (and the looping file decoder) recover frame
//! boundaries by scanning for the codec's own markers:
//!
//! ```text
//! ┌──────┬──────────────────────┬──────┐┌──────┬─────────────┬──────┐
//! │FF D8 │  segments + scan     │FF D9 ││FF D8 │     ...     │FF D9 │
//! └──────┴──────────────────────┴──────┘└──────┴─────────────┴──────┘
//!   SOI                            EOI     SOI                   EOI
//! ```
//!
//! Entropy-coded data byte-stuffs every `0xFF`, so `FF D9` never appears
//! inside a scan. Marker segments are length-prefixed and are skipped by
//! length, since their payload (an EXIF thumbnail for instance) may hold
//! marker bytes of its own.

use std::ops::Range;

use bytes::{Buf, Bytes, BytesMut};

/// Start-of-image marker
pub const SOI: [u8; 2] = [0xFF, 0xD8];

/// End-of-image marker
pub const EOI: [u8; 2] = [0xFF, 0xD9];

fn find_marker(buf: &[u8], marker: [u8; 2]) -> Option<usize> {
    buf.windows(2).position(|w| w == marker)
}

/// Locate the first complete image in `buf`
///
/// Returns the byte range from the start marker through the end marker
/// (inclusive). An end marker that precedes the first start marker is
/// ignored.
///
/// Length-prefixed segments are skipped whole, so an embedded thumbnail
/// (EXIF APP1 carries a complete JPEG of its own) does not end the frame.
pub fn find_frame(buf: &[u8]) -> Option<Range<usize>> {
    let start = find_marker(buf, SOI)?;
    let end = frame_end(&buf[start..])?;
    Some(start..start + end)
}

/// Offset just past the end marker of the image starting at `frame[0]`
///
/// `None` when the image is not complete yet.
fn frame_end(frame: &[u8]) -> Option<usize> {
    let mut pos = SOI.len();

    while pos + 1 < frame.len() {
        if frame[pos] != 0xFF {
            // Entropy-coded data
            pos += 1;
            continue;
        }

        match frame[pos + 1] {
            0xD9 => return Some(pos + EOI.len()),
            // Fill byte
            0xFF => pos += 1,
            // Stuffed 0xFF, restart markers, TEM, stray SOI: no payload
            0x00 | 0x01 | 0xD0..=0xD8 => pos += 2,
            _ => {
                let len = frame.get(pos + 2..pos + 4)?;
                let len = usize::from(u16::from_be_bytes([len[0], len[1]]));
                if len < 2 {
                    // Not a real segment header
                    pos += 2;
                    continue;
                }
                pos += 2 + len;
                if pos > frame.len() {
                    return None;
                }
            }
        }
    }

    None
}

/// Byte ranges of every complete image in `data`, in order
pub fn index_frames(data: &[u8]) -> Vec<Range<usize>> {
    let mut frames = Vec::new();
    let mut offset = 0;

    while let Some(range) = find_frame(&data[offset..]) {
        frames.push(offset + range.start..offset + range.end);
        offset += range.end;
    }

    frames
}

/// Incremental splitter for a raw JPEG byte stream
///
/// Bytes are pushed as they arrive from the socket; complete frames are
/// handed out in order. A frame may span any number of pushes and a single
/// push may complete several frames.
#[derive(Debug, Default)]
pub struct FrameSplitter {
    buffer: BytesMut,
}

impl FrameSplitter {
    /// Create an empty splitter
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Take the next complete frame, if one is buffered
    pub fn next_frame(&mut self) -> Option<Bytes> {
        match find_frame(&self.buffer) {
            Some(range) => {
                self.buffer.advance(range.start);
                Some(self.buffer.split_to(range.end - range.start).freeze())
            }
            None => {
                match find_marker(&self.buffer, SOI) {
                    Some(start) => self.buffer.advance(start),
                    None => {
                        // Keep a dangling 0xFF, it may open the next start marker
                        let keep = usize::from(self.buffer.last() == Some(&0xFF));
                        let drop = self.buffer.len() - keep;
                        self.buffer.advance(drop);
                    }
                }
                None
            }
        }
    }

    /// Number of buffered bytes not yet returned as a frame
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(body: &[u8]) -> Vec<u8> {
        let mut data = SOI.to_vec();
        data.extend_from_slice(body);
        data.extend_from_slice(&EOI);
        data
    }

    #[test]
    fn test_find_frame() {
        let data = jpeg(&[1, 2, 3]);
        assert_eq!(find_frame(&data), Some(0..7));
        assert_eq!(find_frame(&data[..6]), None);
    }

    #[test]
    fn test_find_frame_ignores_leading_end_marker() {
        let mut data = vec![0xFF, 0xD9, 0x00];
        data.extend(jpeg(&[7]));

        assert_eq!(find_frame(&data), Some(3..8));
    }

    #[test]
    fn test_two_frames_in_one_read() {
        let first = jpeg(&[1, 1]);
        let second = jpeg(&[2, 2, 2]);
        let mut wire = first.clone();
        wire.extend_from_slice(&second);

        let mut splitter = FrameSplitter::new();
        splitter.push(&wire);

        assert_eq!(splitter.next_frame().unwrap().as_ref(), first.as_slice());
        assert_eq!(splitter.next_frame().unwrap().as_ref(), second.as_slice());
        assert!(splitter.next_frame().is_none());
        assert_eq!(splitter.pending(), 0);
    }

    #[test]
    fn test_frame_split_across_reads() {
        let frame = jpeg(&[9, 8, 7, 6]);
        let mut splitter = FrameSplitter::new();

        // Split right between the two bytes of the end marker
        splitter.push(&frame[..frame.len() - 1]);
        assert!(splitter.next_frame().is_none());

        splitter.push(&frame[frame.len() - 1..]);
        assert_eq!(splitter.next_frame().unwrap().as_ref(), frame.as_slice());
    }

    #[test]
    fn test_garbage_before_start_is_dropped() {
        let mut splitter = FrameSplitter::new();
        splitter.push(&[0x00, 0x01, 0x02, 0xFF]);
        assert!(splitter.next_frame().is_none());
        assert_eq!(splitter.pending(), 1);

        // The dangling 0xFF completes a start marker
        splitter.push(&[0xD8, 0x05, 0xFF, 0xD9]);
        assert_eq!(
            splitter.next_frame().unwrap().as_ref(),
            &[0xFF, 0xD8, 0x05, 0xFF, 0xD9]
        );
    }

    /// APP1 segment wrapping a complete thumbnail image
    fn app1_with_thumbnail() -> Vec<u8> {
        let mut payload = b"Exif\0\0".to_vec();
        payload.extend(jpeg(&[0x42, 0x42]));
        let len = (payload.len() + 2) as u16;

        let mut segment = vec![0xFF, 0xE1];
        segment.extend_from_slice(&len.to_be_bytes());
        segment.extend(payload);
        segment
    }

    #[test]
    fn test_thumbnail_does_not_end_frame() {
        let mut body = app1_with_thumbnail();
        body.extend_from_slice(&[0x11, 0x22, 0xFF, 0x00, 0x33]);
        let frame = jpeg(&body);

        let mut clip = frame.clone();
        clip.extend(&frame);

        assert_eq!(find_frame(&frame), Some(0..frame.len()));
        assert_eq!(index_frames(&clip), vec![0..frame.len(), frame.len()..clip.len()]);
    }

    #[test]
    fn test_truncated_segment_waits_for_more() {
        let frame = jpeg(&app1_with_thumbnail());

        let mut splitter = FrameSplitter::new();
        splitter.push(&frame[..10]);
        assert!(splitter.next_frame().is_none());
        assert_eq!(splitter.pending(), 10);

        splitter.push(&frame[10..]);
        assert_eq!(splitter.next_frame().unwrap().as_ref(), frame.as_slice());
    }

    #[test]
    fn test_real_encoder_output_with_thumbnail() {
        use image::codecs::jpeg::JpegEncoder;
        use image::{Rgb, RgbImage};

        let encode = |w, h, shade| {
            let mut out = Vec::new();
            JpegEncoder::new_with_quality(&mut out, 80)
                .encode_image(&RgbImage::from_pixel(w, h, Rgb([shade, 90, 200])))
                .unwrap();
            out
        };

        // Splice an APP1 thumbnail in right after the main image's SOI
        let thumbnail = encode(8, 8, 10);
        let mut payload = b"Exif\0\0".to_vec();
        payload.extend(&thumbnail);
        let mut frame = SOI.to_vec();
        frame.extend_from_slice(&[0xFF, 0xE1]);
        frame.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        frame.extend(payload);
        frame.extend_from_slice(&encode(40, 30, 220)[2..]);
        assert!(image::load_from_memory(&frame).is_ok());

        let mut clip = frame.clone();
        clip.extend(&frame);
        let frames = index_frames(&clip);

        assert_eq!(frames.len(), 2);
        for range in frames {
            let decoded = image::load_from_memory(&clip[range]).unwrap();
            assert_eq!(decoded.width(), 40);
        }
    }

    #[test]
    fn test_index_frames() {
        let mut data = jpeg(&[1]);
        data.extend(jpeg(&[2, 2]));
        data.extend_from_slice(&[0xFF, 0xD8, 0x03]); // truncated tail

        let frames = index_frames(&data);
        assert_eq!(frames, vec![0..5, 5..11]);
    }
}
