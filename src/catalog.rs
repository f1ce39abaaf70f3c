//! Effect catalog
//!
//! The catalog is an ordered, immutable list of effects built once at startup.
//! Every index in `0..len()` resolves to a definition for the lifetime of the
//! controller, which is what lets the selector hand out plain indices.

use embassy_time::Duration;
use heapless::Vec;

use crate::Rgb;
use crate::error::CatalogError;
use crate::light::AnimationParams;

/// Maximum number of effects a catalog can hold.
pub const MAX_EFFECTS: usize = 16;

const ANIMATION_NAME_PURPLE_FADE: &str = "purple_fade";
const ANIMATION_NAME_STROBE_WHITE: &str = "strobe_white";
const ANIMATION_NAME_ORANGE_WAVE: &str = "orange_wave";

const ANIMATION_ID_PURPLE_FADE: u8 = 0;
const ANIMATION_ID_STROBE_WHITE: u8 = 1;
const ANIMATION_ID_ORANGE_WAVE: u8 = 2;

/// Brightness used by the built-in effects (out of 255).
const DEFAULT_BRIGHTNESS: u8 = 250;

/// Light animations the light driver knows how to render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum AnimationId {
    PurpleFade = ANIMATION_ID_PURPLE_FADE,
    StrobeWhite = ANIMATION_ID_STROBE_WHITE,
    OrangeWave = ANIMATION_ID_ORANGE_WAVE,
}

impl AnimationId {
    pub fn from_raw(value: u8) -> Option<Self> {
        Some(match value {
            ANIMATION_ID_PURPLE_FADE => Self::PurpleFade,
            ANIMATION_ID_STROBE_WHITE => Self::StrobeWhite,
            ANIMATION_ID_ORANGE_WAVE => Self::OrangeWave,
            _ => return None,
        })
    }

    pub const fn as_raw(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PurpleFade => ANIMATION_NAME_PURPLE_FADE,
            Self::StrobeWhite => ANIMATION_NAME_STROBE_WHITE,
            Self::OrangeWave => ANIMATION_NAME_ORANGE_WAVE,
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        match s {
            ANIMATION_NAME_PURPLE_FADE => Some(Self::PurpleFade),
            ANIMATION_NAME_STROBE_WHITE => Some(Self::StrobeWhite),
            ANIMATION_NAME_ORANGE_WAVE => Some(Self::OrangeWave),
            _ => None,
        }
    }
}

/// Track number on the audio module's storage
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackRef(pub u16);

/// A paired sound and light effect
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectDefinition {
    pub id: u8,
    /// Friendly label for logs and telemetry
    pub label: &'static str,
    pub sound: TrackRef,
    pub light: AnimationId,
    pub params: AnimationParams,
}

/// Ordered list of effects, never empty
#[derive(Debug, Clone)]
pub struct EffectCatalog {
    effects: Vec<EffectDefinition, MAX_EFFECTS>,
}

impl EffectCatalog {
    /// Build a catalog from a static table
    pub fn new(definitions: &[EffectDefinition]) -> Result<Self, CatalogError> {
        if definitions.is_empty() {
            return Err(CatalogError::Empty);
        }
        let effects = Vec::from_slice(definitions).map_err(|()| CatalogError::CapacityExceeded {
            capacity: MAX_EFFECTS,
        })?;
        Ok(Self { effects })
    }

    /// Number of effects
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Always `false`, a catalog holds at least one effect
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&EffectDefinition> {
        self.effects.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectDefinition> {
        self.effects.iter()
    }
}

impl Default for EffectCatalog {
    /// The three effects the prop ships with
    fn default() -> Self {
        Self {
            effects: Vec::from_slice(&DEFAULT_EFFECTS).unwrap_or_default(),
        }
    }
}

const _: () = assert!(!DEFAULT_EFFECTS.is_empty() && DEFAULT_EFFECTS.len() <= MAX_EFFECTS);

/// Built-in effect table behind [`EffectCatalog::default`]
pub const DEFAULT_EFFECTS: [EffectDefinition; 3] = [
    EffectDefinition {
        id: 0,
        label: "Creepy Laugh",
        sound: TrackRef(1),
        light: AnimationId::PurpleFade,
        params: AnimationParams {
            color: Rgb { r: 128, g: 0, b: 160 },
            brightness: DEFAULT_BRIGHTNESS,
            duration: Duration::from_millis(4_000),
        },
    },
    EffectDefinition {
        id: 1,
        label: "Ghoul Growl",
        sound: TrackRef(2),
        light: AnimationId::StrobeWhite,
        params: AnimationParams {
            color: Rgb { r: 255, g: 255, b: 255 },
            brightness: DEFAULT_BRIGHTNESS,
            duration: Duration::from_millis(3_000),
        },
    },
    EffectDefinition {
        id: 2,
        label: "Witch Cackle",
        sound: TrackRef(3),
        light: AnimationId::OrangeWave,
        params: AnimationParams {
            color: Rgb { r: 255, g: 100, b: 0 },
            brightness: DEFAULT_BRIGHTNESS,
            duration: Duration::from_millis(5_000),
        },
    },
];
