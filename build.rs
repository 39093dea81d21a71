//! Emits hints for locating FFmpeg on Windows.
//!
//! `ffmpeg-sys-next` finds FFmpeg through `pkg-config` on Unix-like systems.
//! On Windows it needs `FFMPEG_DIR`; this script points at a vcpkg install
//! when one is present and the variable is missing.

use std::{env, path::PathBuf};

const WATCHED_VARIABLES: [&str; 4] = ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"];

fn warn(message: &str) {
    println!("cargo:warning={message}");
}

fn vcpkg_ffmpeg_dir() -> Option<PathBuf> {
    let Ok(root) = env::var("VCPKG_ROOT") else {
        warn("FFMPEG_DIR is not set. Install FFmpeg with vcpkg and set VCPKG_ROOT or FFMPEG_DIR.");
        return None;
    };
    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    Some(PathBuf::from(root).join("installed").join(triplet))
}

fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    let windows = env::var("CARGO_CFG_TARGET_OS").is_ok_and(|os| os == "windows");
    if !windows || env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Some(ffmpeg_dir) = vcpkg_ffmpeg_dir() else {
        return;
    };

    if !ffmpeg_dir.exists() {
        warn(&format!(
            "VCPKG_ROOT is set but {} does not contain an FFmpeg install.",
            ffmpeg_dir.display(),
        ));
        return;
    }

    warn(&format!(
        "Found vcpkg FFmpeg at {0}; set FFMPEG_DIR={0} to use it explicitly.",
        ffmpeg_dir.display(),
    ));
    if env::var_os("VCPKGRS_DYNAMIC").is_none() {
        warn("Set VCPKGRS_DYNAMIC=1 when linking a dynamic vcpkg FFmpeg build.");
    }
}
