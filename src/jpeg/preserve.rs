// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Metadata segments carried from source to destination.
//!
//! APPn and COM segments are saved verbatim while the header is read, then
//! filtered by a [`CopyMarkers`] policy before the destination is written.
//! JFIF APP0 and Adobe APP14 describe how the samples are to be interpreted
//! rather than what the image is about, so they survive every policy.

use serde::{Deserialize, Serialize};

use super::marker::{is_app, APP0, COM};

/// APP2, where ICC profiles live.
const APP2: u8 = 0xE2;
/// APP14, used by Adobe for the color transform flag.
const APP14: u8 = 0xEE;

/// A metadata segment saved from the source stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedMarker {
    /// Marker byte without the 0xFF prefix.
    pub marker: u8,
    /// Segment body without the length field.
    pub data: Vec<u8>,
}

impl SavedMarker {
    pub fn is_jfif(&self) -> bool {
        self.marker == APP0 && self.data.starts_with(b"JFIF\0")
    }

    pub fn is_adobe(&self) -> bool {
        self.marker == APP14 && self.data.starts_with(b"Adobe")
    }

    pub fn is_icc(&self) -> bool {
        self.marker == APP2 && self.data.starts_with(b"ICC_PROFILE\0")
    }

    pub fn is_comment(&self) -> bool {
        self.marker == COM
    }
}

/// Which metadata segments are copied to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyMarkers {
    /// Only the JFIF/Adobe segments needed to interpret the image.
    None,
    /// Comments (COM) only.
    Comments,
    /// Every APPn and COM segment.
    #[default]
    All,
    /// Every segment except ICC profiles.
    AllExceptIcc,
    /// ICC profiles only.
    Icc,
}

impl CopyMarkers {
    /// Whether this policy copies the given segment.
    pub fn keeps(self, segment: &SavedMarker) -> bool {
        if segment.is_jfif() || segment.is_adobe() {
            return true;
        }
        match self {
            Self::None => false,
            Self::Comments => segment.is_comment(),
            Self::All => true,
            Self::AllExceptIcc => !segment.is_icc(),
            Self::Icc => segment.is_icc(),
        }
    }
}

/// True for segments worth saving at all (APPn and COM).
pub fn is_metadata_marker(marker: u8) -> bool {
    is_app(marker) || marker == COM
}

/// Select the segments to write to the destination.
///
/// `grayscale_output` drops Adobe APP14, whose color transform flag would
/// otherwise describe components that are no longer there.
pub fn select_markers(saved: &[SavedMarker], policy: CopyMarkers, grayscale_output: bool) -> Vec<SavedMarker> {
    let selected: Vec<SavedMarker> = saved
        .iter()
        .filter(|s| policy.keeps(s))
        .filter(|s| !(grayscale_output && s.is_adobe()))
        .cloned()
        .collect();
    log::debug!(
        "copying {} of {} metadata segments ({:?})",
        selected.len(),
        saved.len(),
        policy
    );
    selected
}
