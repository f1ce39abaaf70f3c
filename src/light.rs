//! Light collaborator interface.
//!
//! Rendering is owned by the light driver; the controller only says which
//! animation to start and with what parameters.

use embassy_time::Duration;

use crate::Rgb;
use crate::catalog::AnimationId;
use crate::channel::{Channel, Sender};

/// Parameters handed to the light driver together with the animation id
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationParams {
    /// Base color of the animation
    pub color: Rgb,
    /// Peak brightness (0-255)
    pub brightness: u8,
    /// How long the animation runs before the strip returns to idle
    pub duration: Duration,
}

/// Abstract light driver
///
/// Activation is fire-and-forget: the controller does not wait for, or react
/// to, anything the driver does afterwards.
pub trait LightDriver {
    fn activate(&mut self, animation: AnimationId, params: AnimationParams);
}

/// A queued request to start an animation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightActivation {
    pub animation: AnimationId,
    pub params: AnimationParams,
}

/// Type alias for the activation channel
pub type LightChannel<const SIZE: usize> = Channel<LightActivation, SIZE>;

/// Light driver that forwards activations to a rendering task over a channel.
///
/// When the channel is full the activation is dropped.
pub struct ChannelLightDriver<'a, const SIZE: usize> {
    activations: Sender<'a, LightActivation, SIZE>,
}

impl<'a, const SIZE: usize> ChannelLightDriver<'a, SIZE> {
    pub const fn new(activations: Sender<'a, LightActivation, SIZE>) -> Self {
        Self { activations }
    }
}

impl<const SIZE: usize> LightDriver for ChannelLightDriver<'_, SIZE> {
    fn activate(&mut self, animation: AnimationId, params: AnimationParams) {
        if self
            .activations
            .try_send(LightActivation { animation, params })
            .is_err()
        {
            warn!("Light queue full, dropping {}", animation.as_str());
        }
    }
}
