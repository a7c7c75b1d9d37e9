//! RTM animation file command implementations

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use std::path::PathBuf;

use arma_rtm::rtm::RtmFrame;
use arma_rtm::RtmFile;

#[derive(Subcommand)]
pub enum RtmCommands {
    /// Display information about an RTM animation file
    Info {
        /// Path to the RTM file
        file: PathBuf,

        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,
    },

    /// Dump per-bone matrices for one frame or the whole animation
    Dump {
        /// Path to the RTM file
        file: PathBuf,

        /// Frame index to dump; omit to dump every frame
        #[arg(short, long)]
        frame: Option<usize>,
    },
}

pub fn execute(cmd: RtmCommands) -> Result<()> {
    match cmd {
        RtmCommands::Info { file, detailed } => handle_info(file, detailed),
        RtmCommands::Dump { file, frame } => handle_dump(file, frame),
    }
}

fn handle_info(path: PathBuf, detailed: bool) -> Result<()> {
    let rtm = RtmFile::load(&path)
        .with_context(|| format!("Failed to load RTM animation from {}", path.display()))?;

    println!("=== RTM Animation Information ===");
    println!("File: {}", path.display());
    println!("Frames: {}", rtm.frame_count());
    println!("Bones: {}", rtm.bone_count());
    println!(
        "Motion offset: ({}, {}, {})",
        rtm.motion_offset.x, rtm.motion_offset.y, rtm.motion_offset.z
    );
    println!("Data size: {} bytes", rtm.expected_len());

    if detailed {
        println!("\n=== Bone Table ===");
        for name in &rtm.bone_names {
            println!("  {name}");
        }
        println!("\n=== Frame Times ===");
        for (index, frame) in rtm.frames.iter().enumerate() {
            println!("  frame {index}: t = {}", frame.time);
        }
    }

    Ok(())
}

fn handle_dump(path: PathBuf, frame: Option<usize>) -> Result<()> {
    let rtm = RtmFile::load(&path)
        .with_context(|| format!("Failed to load RTM animation from {}", path.display()))?;

    match frame {
        Some(index) => {
            let Some(frame) = rtm.frames.get(index) else {
                bail!(
                    "frame {index} out of range: animation has {} frames",
                    rtm.frame_count()
                );
            };
            dump_frame(&rtm, index, frame);
        }
        None => {
            for (index, frame) in rtm.frames.iter().enumerate() {
                dump_frame(&rtm, index, frame);
            }
        }
    }

    Ok(())
}

fn dump_frame(rtm: &RtmFile, index: usize, frame: &RtmFrame) {
    println!("Frame {index} (t = {}):", frame.time);
    // header-table order; bones absent from this frame are skipped
    for name in &rtm.bone_names {
        let Some(matrix) = frame.matrices.get(name) else {
            continue;
        };
        let m = &matrix.0;
        println!("  {name}");
        println!("    {:?}", &m[0..4]);
        println!("    {:?}", &m[4..8]);
        println!("    {:?}", &m[8..12]);
    }
}
