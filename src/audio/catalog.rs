//! Static catalog of every focus sound.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCategory {
    Noise,
    Brainwave,
    Nature,
    Ambient,
    Off,
}

impl SoundCategory {
    pub fn display_name(self) -> &'static str {
        match self {
            SoundCategory::Noise => "Noise",
            SoundCategory::Brainwave => "Brainwave",
            SoundCategory::Nature => "Nature",
            SoundCategory::Ambient => "Ambient",
            SoundCategory::Off => "Off",
        }
    }
}

/// Plain tag identifying a sound. All attributes live in [`CATALOG`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SoundType {
    White = 0,
    Brown,
    Pink,
    BinauralAlpha,
    BinauralBeta,
    SoftRain,
    OceanWaves,
    Wind,
    LoFiDrone,
    DeepHum,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SoundInfo {
    pub sound: SoundType,
    pub id: &'static str,
    pub display_name: &'static str,
    pub category: SoundCategory,
    pub requires_stereo: bool,
    pub is_premium: bool,
}

const fn entry(
    sound: SoundType,
    id: &'static str,
    display_name: &'static str,
    category: SoundCategory,
    requires_stereo: bool,
    is_premium: bool,
) -> SoundInfo {
    SoundInfo {
        sound,
        id,
        display_name,
        category,
        requires_stereo,
        is_premium,
    }
}

/// Indexed by `SoundType as usize`.
pub static CATALOG: [SoundInfo; SoundType::COUNT] = [
    entry(SoundType::White, "white", "White Noise", SoundCategory::Noise, false, false),
    entry(SoundType::Brown, "brown", "Brown Noise", SoundCategory::Noise, false, false),
    entry(SoundType::Pink, "pink", "Pink Noise", SoundCategory::Noise, false, false),
    entry(SoundType::BinauralAlpha, "binaural_alpha", "Alpha Waves", SoundCategory::Brainwave, true, true),
    entry(SoundType::BinauralBeta, "binaural_beta", "Beta Waves", SoundCategory::Brainwave, true, true),
    entry(SoundType::SoftRain, "soft_rain", "Soft Rain", SoundCategory::Nature, false, true),
    entry(SoundType::OceanWaves, "ocean_waves", "Ocean Waves", SoundCategory::Nature, false, true),
    entry(SoundType::Wind, "wind", "Wind", SoundCategory::Nature, false, true),
    entry(SoundType::LoFiDrone, "lofi_drone", "Lo-Fi Drone", SoundCategory::Ambient, false, true),
    entry(SoundType::DeepHum, "deep_hum", "Deep Hum", SoundCategory::Ambient, false, true),
    entry(SoundType::Off, "off", "Off", SoundCategory::Off, false, false),
];

impl SoundType {
    pub const COUNT: usize = 11;

    pub const ALL: [SoundType; SoundType::COUNT] = [
        SoundType::White,
        SoundType::Brown,
        SoundType::Pink,
        SoundType::BinauralAlpha,
        SoundType::BinauralBeta,
        SoundType::SoftRain,
        SoundType::OceanWaves,
        SoundType::Wind,
        SoundType::LoFiDrone,
        SoundType::DeepHum,
        SoundType::Off,
    ];

    pub fn info(self) -> &'static SoundInfo {
        &CATALOG[self as usize]
    }

    pub fn id(self) -> &'static str {
        self.info().id
    }

    pub fn display_name(self) -> &'static str {
        self.info().display_name
    }

    pub fn category(self) -> SoundCategory {
        self.info().category
    }

    pub fn requires_stereo(self) -> bool {
        self.info().requires_stereo
    }

    pub fn is_premium(self) -> bool {
        self.info().is_premium
    }

    pub fn channels(self) -> u16 {
        if self.requires_stereo() {
            2
        } else {
            1
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<SoundType> {
        SoundType::ALL.get(tag as usize).copied()
    }

    /// Look up by identifier or display name, ignoring case, `-` and spaces.
    pub fn from_name(name: &str) -> Option<SoundType> {
        let wanted = normalize(name);
        CATALOG
            .iter()
            .find(|info| normalize(info.id) == wanted || normalize(info.display_name) == wanted)
            .map(|info| info.sound)
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Every playable sound grouped by category, in catalog order. `Off` is excluded.
pub fn grouped_by_category() -> Vec<(SoundCategory, Vec<SoundType>)> {
    let mut groups: Vec<(SoundCategory, Vec<SoundType>)> = Vec::new();
    for info in CATALOG.iter().filter(|info| info.sound != SoundType::Off) {
        match groups.iter_mut().find(|(category, _)| *category == info.category) {
            Some((_, sounds)) => sounds.push(info.sound),
            None => groups.push((info.category, vec![info.sound])),
        }
    }
    groups
}

/// Playable sounds a listener with the given entitlement may select.
pub fn available(premium: bool) -> impl Iterator<Item = SoundType> {
    SoundType::ALL
        .into_iter()
        .filter(move |sound| *sound != SoundType::Off && (premium || !sound.is_premium()))
}
