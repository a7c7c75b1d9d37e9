//! Pose reconstruction: applies a decoded [`RtmFile`] to a target skeleton,
//! emitting local-transform keyframes through a host-provided pose sink.
//!
//! The engine walks the hierarchy in a fixed pre-order (computed once and
//! reused for every frame), matches decoded bone names case-insensitively,
//! remaps each source matrix into the target convention, composes it with
//! the bone's bind matrix and records translation/rotation/scale keys at
//! integer frame indices. Hierarchy nodes with no matching decoded bone are
//! skipped silently.
//!
//! Within a frame the sink's pose state is updated incrementally, so before
//! touching a bone whose parent was already updated this frame the engine
//! forces a hierarchy re-evaluation ([`PoseSink::evaluate`]); otherwise the
//! child's placement would be computed against the parent's stale
//! previous-frame transform.

use std::collections::HashSet;
use std::path::Path;

use glam::{Mat4, Quat, Vec3};
use log::trace;

use crate::coordinate::{remap_bone_matrix, remap_motion_vector};
use crate::error::Result;
use crate::rtm::RtmFile;
use crate::skeleton::{BoneId, Skeleton, traversal_order};

/// Destination for reconstructed poses and keyframes.
///
/// Keying methods carry insert-only-if-changed semantics: an implementation
/// should skip a key whose value equals the already-present value for that
/// channel, so constant channels do not accumulate redundant keys.
pub trait PoseSink {
    /// Create or select the output animation track, optionally named from a
    /// caller-supplied identifier, and return the track's identifier.
    fn select_track(&mut self, name: Option<&str>) -> String;

    /// Set the playback range of the destination timeline
    fn set_frame_range(&mut self, start: i32, end: i32);

    /// Set a bone's local transform for the current evaluation
    fn set_local_transform(&mut self, bone: &str, transform: Mat4);

    /// Force a hierarchy re-evaluation so subsequent reads and writes see
    /// all transforms set since the last call
    fn evaluate(&mut self);

    /// Insert a translation key at the given frame index
    fn key_translation(&mut self, bone: &str, frame: i32, value: Vec3);

    /// Insert a rotation key at the given frame index
    fn key_rotation(&mut self, bone: &str, frame: i32, value: Quat);

    /// Insert a scale key at the given frame index
    fn key_scale(&mut self, bone: &str, frame: i32, value: Vec3);
}

/// Disables transform-driving constraints on a bone so reconstructed
/// transforms are not fought by procedural rigging
pub trait ConstraintMuter {
    /// Mute all constraints attached to the named bone
    fn mute_constraints(&mut self, bone: &str);
}

/// Receiver for the animation's global motion offset
pub trait RootMotionSink {
    /// Accept the motion offset, already remapped to target axes
    fn set_motion_vector(&mut self, offset: Vec3);
}

/// Import progress notifications
pub trait ProgressReporter {
    /// Import is starting; frames will run from `start` to `end` inclusive
    fn begin(&mut self, start: i32, end: i32);
    /// The frame currently being applied
    fn update(&mut self, current: i32);
    /// Import finished
    fn end(&mut self);
}

/// Import behavior toggles
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Timeline frame index the first animation frame lands on
    pub frame_start: i32,
    /// Set the destination playback range to cover the imported frames
    pub set_frame_range: bool,
    /// Mute constraints on bones driven by the animation
    pub mute_bone_constraints: bool,
    /// Forward the motion offset to the root-motion collaborator
    pub import_motion_vector: bool,
    /// Name for the output track; `None` keeps the sink's current track
    pub track_name: Option<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            frame_start: 0,
            set_frame_range: true,
            mute_bone_constraints: true,
            import_motion_vector: true,
            track_name: None,
        }
    }
}

/// Optional host collaborators, all absent by default
#[derive(Default)]
pub struct ImportHooks<'a> {
    /// Constraint muting
    pub constraints: Option<&'a mut dyn ConstraintMuter>,
    /// Root motion offset
    pub root_motion: Option<&'a mut dyn RootMotionSink>,
    /// Progress notifications
    pub progress: Option<&'a mut dyn ProgressReporter>,
}

/// Outcome of a successful import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Number of frames applied
    pub frames: usize,
    /// Identifier of the track the keyframes were recorded into
    pub track: String,
}

/// Apply a decoded animation to a skeleton, recording keyframes through the
/// sink. A hierarchy with zero matching bones still succeeds and produces
/// zero keyframes.
pub fn import_rtm<S: Skeleton, P: PoseSink>(
    rtm: &RtmFile,
    skeleton: &S,
    sink: &mut P,
    options: &ImportOptions,
    mut hooks: ImportHooks<'_>,
) -> ImportReport {
    if options.import_motion_vector {
        if let Some(root_motion) = hooks.root_motion.as_deref_mut() {
            root_motion.set_motion_vector(remap_motion_vector(rtm.motion_offset));
        }
    }

    let track = sink.select_track(options.track_name.as_deref());

    let order = traversal_order(skeleton);
    let lowered: Vec<String> = order
        .iter()
        .map(|&bone| skeleton.name(bone).to_lowercase())
        .collect();

    if options.mute_bone_constraints {
        if let Some(muter) = hooks.constraints.as_deref_mut() {
            for (&bone, name) in order.iter().zip(&lowered) {
                if rtm.bone_names.iter().any(|decoded| decoded == name) {
                    muter.mute_constraints(skeleton.name(bone));
                }
            }
        }
    }

    let frame_count = rtm.frames.len();
    let frame_end = options.frame_start + frame_count as i32 - 1;
    if options.set_frame_range && frame_count > 0 {
        sink.set_frame_range(options.frame_start, frame_end);
    }
    if let Some(progress) = hooks.progress.as_deref_mut() {
        progress.begin(options.frame_start, frame_end);
    }

    let mut frame_num = options.frame_start;
    for frame in &rtm.frames {
        if let Some(progress) = hooks.progress.as_deref_mut() {
            progress.update(frame_num);
        }
        let mut updated: HashSet<BoneId> = HashSet::new();
        for (&bone, name) in order.iter().zip(&lowered) {
            let Some(matrix) = frame.matrices.get(name) else {
                trace!("frame {frame_num}: no sample for '{name}'");
                continue;
            };
            // the parent's local transform changed this frame; flush before
            // placing the child against it
            if skeleton.parent(bone).is_some_and(|p| updated.contains(&p)) {
                sink.evaluate();
                updated.clear();
            }
            let local = remap_bone_matrix(matrix) * skeleton.bind_matrix(bone);
            let host_name = skeleton.name(bone);
            sink.set_local_transform(host_name, local);
            updated.insert(bone);

            let (scale, rotation, translation) = local.to_scale_rotation_translation();
            sink.key_translation(host_name, frame_num, translation);
            sink.key_rotation(host_name, frame_num, rotation);
            sink.key_scale(host_name, frame_num, scale);
        }
        sink.evaluate();
        frame_num += 1;
    }

    if let Some(progress) = hooks.progress.as_deref_mut() {
        progress.end();
    }

    ImportReport {
        frames: frame_count,
        track,
    }
}

/// Decode an RTM file from disk and apply it in one step.
///
/// Decode failures surface before any sink mutation, so a malformed file
/// never leaves a partially imported pose behind.
pub fn import_rtm_file<S: Skeleton, P: PoseSink>(
    path: impl AsRef<Path>,
    skeleton: &S,
    sink: &mut P,
    options: &ImportOptions,
    hooks: ImportHooks<'_>,
) -> Result<ImportReport> {
    let rtm = RtmFile::load(path)?;
    Ok(import_rtm(&rtm, skeleton, sink, options, hooks))
}
