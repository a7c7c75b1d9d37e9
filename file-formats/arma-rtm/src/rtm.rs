//! Decoder for the `RTM_0101` animation container.
//!
//! The layout is strictly sequential, little-endian:
//!
//! - 8-byte signature `RTM_0101`
//! - 3 x f32 motion offset
//! - u32 frame count, u32 bone count
//! - bone count x 32-byte bone-name records
//! - per frame: f32 time, then bone count x (32-byte name + 12 x f32 matrix)
//!
//! Bone names are NUL-truncated and lower-cased at decode time, so all name
//! comparisons downstream are case-insensitive by construction. Per-frame
//! matrices are keyed by the name read from the frame record itself, not by
//! position: the format does not guarantee that per-frame records follow the
//! header table order.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use glam::Vec3;
use log::{debug, trace};

use crate::error::{Result, RtmError};

/// Magic signature for RTM files
pub const RTM_MAGIC: [u8; 8] = *b"RTM_0101";

/// Magic prefix of the binarized RTM variant, which is not supported
pub const BMTR_MAGIC: [u8; 4] = *b"BMTR";

/// Size of a fixed bone-name record in bytes
const NAME_RECORD_LEN: usize = 32;

/// Raw 3x4 bone matrix in the RTM source layout (12 floats in file order)
///
/// The row/column assignment differs from the standard convention; use
/// [`crate::coordinate::remap_bone_matrix`] to obtain a homogeneous 4x4
/// transform in the target convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RtmMatrix(pub [f32; 12]);

/// A single time-stamped frame of per-bone matrices
#[derive(Debug, Clone, PartialEq)]
pub struct RtmFrame {
    /// Frame time in seconds
    pub time: f32,
    /// Source-layout matrices keyed by lower-cased bone name
    pub matrices: HashMap<String, RtmMatrix>,
}

/// A fully decoded RTM animation
#[derive(Debug, Clone, PartialEq)]
pub struct RtmFile {
    /// Global motion offset, in RTM source axes
    pub motion_offset: Vec3,
    /// Bone-name table in file order (defines the per-frame record order)
    pub bone_names: Vec<String>,
    /// Frames in playback order (frame index = position)
    pub frames: Vec<RtmFrame>,
}

impl RtmFile {
    /// Parse an RTM animation from a reader.
    ///
    /// The stream is consumed exactly up to the end of the last frame
    /// record. End-of-stream inside any field maps to
    /// [`RtmError::Truncated`] with the number of bytes consumed.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut reader = CountingReader::new(reader);

        let mut signature = [0u8; 8];
        reader.read_bytes(&mut signature[..4])?;
        if signature[..4] == BMTR_MAGIC {
            return Err(RtmError::UnsupportedVariant);
        }
        reader.read_bytes(&mut signature[4..])?;
        if signature != RTM_MAGIC {
            return Err(RtmError::UnrecognizedFormat {
                signature: String::from_utf8_lossy(&signature).into_owned(),
            });
        }

        let motion_offset = Vec3::new(
            reader.read_f32_le()?,
            reader.read_f32_le()?,
            reader.read_f32_le()?,
        );
        let frame_count = reader.read_u32_le()?;
        let bone_count = reader.read_u32_le()?;
        debug!("RTM header: {frame_count} frames, {bone_count} bones, motion offset {motion_offset}");

        let mut bone_names = Vec::with_capacity(bone_count as usize);
        for _ in 0..bone_count {
            bone_names.push(reader.read_bone_name()?);
        }
        trace!("bone table: {bone_names:?}");

        let mut frames = Vec::with_capacity(frame_count as usize);
        for _ in 0..frame_count {
            let time = reader.read_f32_le()?;
            let mut matrices = HashMap::with_capacity(bone_count as usize);
            for _ in 0..bone_count {
                let name = reader.read_bone_name()?;
                let mut values = [0f32; 12];
                for value in &mut values {
                    *value = reader.read_f32_le()?;
                }
                matrices.insert(name, RtmMatrix(values));
            }
            frames.push(RtmFrame { time, matrices });
        }

        Ok(Self {
            motion_offset,
            bone_names,
            frames,
        })
    }

    /// Load an RTM animation from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        Self::parse(&mut file)
    }

    /// Number of frames in the animation
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Number of bones declared in the header table
    pub fn bone_count(&self) -> usize {
        self.bone_names.len()
    }

    /// Exact on-disk size in bytes of an RTM file with these counts
    pub fn expected_len(&self) -> u64 {
        let bones = self.bone_names.len() as u64;
        let frames = self.frames.len() as u64;
        8 + 12 + 8 + 32 * bones + frames * (4 + bones * (32 + 48))
    }
}

/// Decode a fixed 32-byte name record: truncate at the first NUL byte and
/// lower-case the result.
fn decode_name(raw: &[u8; NAME_RECORD_LEN]) -> String {
    let end = memchr::memchr(0, raw).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).to_lowercase()
}

/// Reader wrapper that tracks bytes consumed and classifies end-of-stream
/// as [`RtmError::Truncated`].
struct CountingReader<R> {
    inner: R,
    consumed: u64,
}

impl<R: Read> CountingReader<R> {
    fn new(inner: R) -> Self {
        Self { inner, consumed: 0 }
    }

    fn classify(&self, err: io::Error) -> RtmError {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            RtmError::Truncated {
                offset: self.consumed,
            }
        } else {
            RtmError::Io(err)
        }
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf).map_err(|e| self.classify(e))?;
        self.consumed += buf.len() as u64;
        Ok(())
    }

    fn read_u32_le(&mut self) -> Result<u32> {
        let value = self
            .inner
            .read_u32::<LittleEndian>()
            .map_err(|e| self.classify(e))?;
        self.consumed += 4;
        Ok(value)
    }

    fn read_f32_le(&mut self) -> Result<f32> {
        let value = self
            .inner
            .read_f32::<LittleEndian>()
            .map_err(|e| self.classify(e))?;
        self.consumed += 4;
        Ok(value)
    }

    fn read_bone_name(&mut self) -> Result<String> {
        let mut raw = [0u8; NAME_RECORD_LEN];
        self.read_bytes(&mut raw)?;
        Ok(decode_name(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::io::Cursor;

    const IDENTITY_SOURCE: [f32; 12] =
        [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0];

    fn name_record(name: &str) -> [u8; 32] {
        let mut record = [0u8; 32];
        record[..name.len()].copy_from_slice(name.as_bytes());
        record
    }

    /// Serialize a synthetic RTM stream for fixture purposes.
    fn encode_rtm(
        motion_offset: [f32; 3],
        bones: &[&str],
        frames: &[(f32, Vec<(&str, [f32; 12])>)],
    ) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&RTM_MAGIC);
        for value in motion_offset {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out.extend_from_slice(&(frames.len() as u32).to_le_bytes());
        out.extend_from_slice(&(bones.len() as u32).to_le_bytes());
        for bone in bones {
            out.extend_from_slice(&name_record(bone));
        }
        for (time, records) in frames {
            out.extend_from_slice(&time.to_le_bytes());
            for (bone, matrix) in records {
                out.extend_from_slice(&name_record(bone));
                for value in matrix {
                    out.extend_from_slice(&value.to_le_bytes());
                }
            }
        }
        out
    }

    fn pelvis_stream() -> Vec<u8> {
        let mut matrix = IDENTITY_SOURCE;
        matrix[9] = 5.0;
        matrix[10] = 6.0;
        matrix[11] = 7.0;
        encode_rtm(
            [1.0, 2.0, 3.0],
            &["Pelvis"],
            &[(0.0, vec![("Pelvis", matrix)])],
        )
    }

    #[test]
    fn parses_single_bone_single_frame() {
        let bytes = pelvis_stream();
        let rtm = RtmFile::parse(&mut Cursor::new(&bytes)).unwrap();

        assert_eq!(rtm.motion_offset, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(rtm.bone_names, vec!["pelvis".to_string()]);
        assert_eq!(rtm.frame_count(), 1);
        assert_eq!(rtm.frames[0].time, 0.0);

        let matrix = &rtm.frames[0].matrices["pelvis"];
        assert_eq!(matrix.0[9..], [5.0, 6.0, 7.0]);
    }

    #[test]
    fn bone_names_are_nul_truncated_and_lowercased() {
        let mut raw = [0u8; 32];
        raw[..6].copy_from_slice(b"LeftUp");
        raw[6] = 0;
        raw[7] = b'X'; // garbage after the terminator is ignored
        assert_eq!(decode_name(&raw), "leftup");

        let full = [b'A'; 32];
        assert_eq!(decode_name(&full), "a".repeat(32));
    }

    #[test]
    fn bmtr_variant_is_rejected() {
        for stream in [b"BMTR".to_vec(), b"BMTR trailing garbage".to_vec()] {
            let err = RtmFile::parse(&mut Cursor::new(&stream)).unwrap_err();
            assert!(matches!(err, RtmError::UnsupportedVariant), "{err:?}");
        }
    }

    #[test]
    fn unknown_signature_is_rejected() {
        let err = RtmFile::parse(&mut Cursor::new(b"RTM_0102rest")).unwrap_err();
        match err {
            RtmError::UnrecognizedFormat { signature } => assert_eq!(signature, "RTM_0102"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn decoding_is_deterministic() {
        let bytes = encode_rtm(
            [0.5, -1.0, 2.0],
            &["spine", "head"],
            &[
                (0.0, vec![("spine", IDENTITY_SOURCE), ("head", IDENTITY_SOURCE)]),
                (0.25, vec![("head", IDENTITY_SOURCE), ("spine", IDENTITY_SOURCE)]),
            ],
        );
        let first = RtmFile::parse(&mut Cursor::new(&bytes)).unwrap();
        let second = RtmFile::parse(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.expected_len(), bytes.len() as u64);
        // name-keyed lookup tolerates per-frame reordering
        assert!(first.frames[1].matrices.contains_key("spine"));
        assert_eq!(first.frames[1].time, 0.25);
    }

    #[test]
    fn truncation_at_every_offset_is_detected() {
        let bytes = pelvis_stream();
        for cut in 0..bytes.len() {
            let err = RtmFile::parse(&mut Cursor::new(&bytes[..cut])).unwrap_err();
            match err {
                RtmError::Truncated { offset } => assert!(offset <= cut as u64),
                other => panic!("cut at {cut}: unexpected error {other:?}"),
            }
        }
    }

    proptest! {
        #[test]
        fn truncated_prefix_of_multi_frame_stream(index in any::<prop::sample::Index>()) {
            let bytes = encode_rtm(
                [0.0, 0.0, 0.0],
                &["pelvis", "spine", "head"],
                &[
                    (0.0, vec![
                        ("pelvis", IDENTITY_SOURCE),
                        ("spine", IDENTITY_SOURCE),
                        ("head", IDENTITY_SOURCE),
                    ]),
                    (0.5, vec![
                        ("pelvis", IDENTITY_SOURCE),
                        ("spine", IDENTITY_SOURCE),
                        ("head", IDENTITY_SOURCE),
                    ]),
                ],
            );
            let cut = index.index(bytes.len());
            let err = RtmFile::parse(&mut Cursor::new(&bytes[..cut])).unwrap_err();
            prop_assert!(matches!(err, RtmError::Truncated { .. }), "unexpected error: {:?}", err);
        }
    }
}
