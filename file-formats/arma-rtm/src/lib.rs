//! Parser and skeletal pose importer for Arma 2/3 RTM animation files.
//!
//! An RTM file contains a global motion vector, an ordered bone-name table,
//! and per-frame 3x4 transform matrices keyed by bone name. Decoding is a
//! single linear pass ([`RtmFile::parse`]); reconstruction walks a target
//! bone hierarchy in pre-order and emits local-transform keyframes through
//! the [`import::PoseSink`] interface ([`import_rtm`]).

pub mod coordinate;
pub mod error;
pub mod import;
pub mod rtm;
pub mod skeleton;

pub use error::{Result, RtmError};
pub use import::{
    ImportHooks, ImportOptions, ImportReport, PoseSink, import_rtm, import_rtm_file,
};
pub use rtm::{RtmFile, RtmFrame, RtmMatrix};
pub use skeleton::{ArmatureDef, BoneId, Skeleton};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
