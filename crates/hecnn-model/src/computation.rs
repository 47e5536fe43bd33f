// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};

/// Optimization level, threaded through the compiler as part of
/// `ComputationParams`. Ordinal values match spec.md §6's CLI encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OptLevel {
    None = 0,
    FuseConvBN = 1,
    OptActivation = 2,
    OptPooling = 3,
    All = 4,
}

impl OptLevel {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::FuseConvBN),
            2 => Some(Self::OptActivation),
            3 => Some(Self::OptPooling),
            4 => Some(Self::All),
            _ => None,
        }
    }

    pub fn fuse_conv_bn(self) -> bool {
        matches!(self, Self::FuseConvBN | Self::All)
    }

    pub fn opt_activation(self) -> bool {
        matches!(self, Self::OptActivation | Self::All)
    }

    pub fn opt_pooling(self) -> bool {
        matches!(self, Self::OptPooling | Self::All)
    }
}

/// Polynomial activation family selector. `Square` is exact (no
/// approximation range); the rest are degree-4 least-squares fits over a
/// symmetric input range, see `hecnn-layers::activation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationFamily {
    Square,
    SwishRg4Deg4,
    SwishRg6Deg4,
    MishRg4Deg4,
    MishRg6Deg4,
}

impl ActivationFamily {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "square" => Some(Self::Square),
            "swish_rg4_deg4" => Some(Self::SwishRg4Deg4),
            "swish_rg6_deg4" => Some(Self::SwishRg6Deg4),
            "mish_rg4_deg4" => Some(Self::MishRg4Deg4),
            "mish_rg6_deg4" => Some(Self::MishRg6Deg4),
            _ => None,
        }
    }

    /// Derives the default activation family from a model name containing
    /// `CKKS-<family>`, per spec.md §6.
    pub fn from_model_name(model_name: &str) -> Option<Self> {
        let marker = "CKKS-";
        let idx = model_name.find(marker)?;
        let rest = &model_name[idx + marker.len()..];
        for candidate in [
            Self::SwishRg4Deg4,
            Self::SwishRg6Deg4,
            Self::MishRg4Deg4,
            Self::MishRg6Deg4,
            Self::Square,
        ] {
            if rest.starts_with(candidate.descriptor_name()) {
                return Some(candidate);
            }
        }
        None
    }

    pub fn descriptor_name(self) -> &'static str {
        match self {
            Self::Square => "square",
            Self::SwishRg4Deg4 => "swish_rg4_deg4",
            Self::SwishRg6Deg4 => "swish_rg6_deg4",
            Self::MishRg4Deg4 => "mish_rg4_deg4",
            Self::MishRg6Deg4 => "mish_rg6_deg4",
        }
    }
}

/// Per-query computation request, named in spec.md §3. Identifies both the
/// shape of the input and which trained topology/weight store to compile
/// against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationParams {
    pub img_height: u32,
    pub img_width: u32,
    pub img_channels: u32,
    pub label_count: u32,
    pub dataset: String,
    pub model: String,
    pub opt_level: OptLevel,
    pub activation: ActivationFamily,
}

impl ComputationParams {
    pub fn input_len(&self) -> usize {
        (self.img_height * self.img_width * self.img_channels) as usize
    }
}
