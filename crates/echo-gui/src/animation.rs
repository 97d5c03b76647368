// SPDX-License-Identifier: Apache-2.0
//! Per-node property animation: the `pending_delay -> active ->
//! (completed | cancelled)` state machine (the animation update
//! contract).

use crate::easing::EasingCurve;
use crate::node::{NodeHandle, Property};
use crate::scene::Scene;

/// How an animation's normalized time maps to the final interpolation
/// phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Play once, `from -> to`.
    OnceForward,
    /// Play once, `to -> from`.
    OnceBackward,
    /// Play once, a full up-and-back triangle wave.
    OncePingpong,
    /// Loop indefinitely, `from -> to` each cycle.
    LoopForward,
    /// Loop indefinitely, `to -> from` each cycle.
    LoopBackward,
    /// Loop indefinitely, a triangle wave each cycle.
    LoopPingpong,
}

impl PlaybackMode {
    fn is_looping(self) -> bool {
        matches!(
            self,
            Self::LoopForward | Self::LoopBackward | Self::LoopPingpong
        )
    }

    /// Maps `t in [0, 1]` (elapsed / duration) to the raw interpolation
    /// phase, before easing.
    fn phase(self, t: f32) -> f32 {
        match self {
            Self::OnceForward | Self::LoopForward => t,
            Self::OnceBackward | Self::LoopBackward => 1.0 - t,
            Self::OncePingpong | Self::LoopPingpong => 1.0 - (2.0 * t - 1.0).abs(),
        }
    }
}

/// The reason an animation finished, passed to its completion callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Ran to the end of its duration.
    Finished,
    /// Cancelled before completion.
    Cancelled,
}

type CompleteCallback = Box<dyn FnOnce(NodeHandle, Property, u8, Completion) + Send>;

/// A live property animation.
pub struct Animation {
    pub(crate) target: NodeHandle,
    property: Property,
    component: u8,
    from: f32,
    to: f32,
    elapsed: f32,
    delay: f32,
    duration: f32,
    easing: EasingCurve,
    playback: PlaybackMode,
    first_update: bool,
    pub(crate) cancelled: bool,
    complete_callback: Option<CompleteCallback>,
}

impl std::fmt::Debug for Animation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animation")
            .field("target", &self.target)
            .field("property", &self.property)
            .field("component", &self.component)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("elapsed", &self.elapsed)
            .field("delay", &self.delay)
            .field("duration", &self.duration)
            .field("playback", &self.playback)
            .field("cancelled", &self.cancelled)
            .finish_non_exhaustive()
    }
}

fn is_disabled_by_ancestor(scene: &Scene, target: NodeHandle) -> bool {
    let mut cursor = scene.slot(target).and_then(|n| n.parent);
    while let Some(handle) = cursor {
        match scene.slot(handle) {
            Some(n) if !n.enabled() => return true,
            Some(n) => cursor = n.parent,
            None => return false,
        }
    }
    false
}

impl Scene {
    /// Starts (or replaces) an animation of `target`'s `property`
    /// component `component` (0=x,1=y,2=z,3=w) toward `to`.
    ///
    /// Replacing an existing animation for the same `(target, property,
    /// component)` overwrites the record in place; per the animation
    /// contract, the caller is responsible for any resources owned by a
    /// replaced callback's captured state.
    pub fn animate(
        &mut self,
        target: NodeHandle,
        property: Property,
        component: u8,
        to: f32,
        playback: PlaybackMode,
        duration: f32,
        delay: f32,
        easing: EasingCurve,
        complete_callback: Option<CompleteCallback>,
    ) {
        let record = Animation {
            target,
            property,
            component,
            from: 0.0,
            to,
            elapsed: 0.0,
            delay,
            duration,
            easing,
            playback,
            first_update: true,
            cancelled: false,
            complete_callback,
        };
        if let Some(existing) = self
            .animations
            .iter_mut()
            .find(|a| a.target == target && a.property == property && a.component == component)
        {
            *existing = record;
        } else {
            self.animations.push(record);
        }
    }

    /// Cancels every live animation matching `(target, property,
    /// component)`. The record is removed on the next [`update_animations`](Self::update_animations) pass.
    pub fn cancel_animations(&mut self, target: NodeHandle, property: Property, component: u8) {
        for a in &mut self.animations {
            if a.target == target && a.property == property && a.component == component {
                a.cancelled = true;
            }
        }
    }

    /// Advances every live animation by `dt` seconds: the per-frame
    /// animation update.
    #[allow(clippy::too_many_lines)]
    pub fn update_animations(&mut self, dt: f32) {
        let mut finished = Vec::new();
        let mut cancelled = Vec::new();
        for index in 0..self.animations.len() {
            let target = self.animations[index].target;
            if self.animations[index].cancelled {
                cancelled.push(index);
                continue;
            }
            if is_disabled_by_ancestor(self, target) {
                continue;
            }

            if self.animations[index].delay > 0.0 {
                if self.animations[index].delay > dt {
                    self.animations[index].delay -= dt;
                    continue;
                }
                self.animations[index].delay = 0.0;
            }

            if self.animations[index].first_update {
                let property = self.animations[index].property;
                let component = self.animations[index].component;
                let current = self
                    .slot(target)
                    .map(|n| n.property_component(property, component))
                    .unwrap_or(0.0);
                self.animations[index].from = current;
                self.animations[index].first_update = false;
            }

            let duration = self.animations[index].duration;
            self.animations[index].elapsed += dt;
            if duration > 0.0 && duration - self.animations[index].elapsed < dt * 0.5 {
                self.animations[index].elapsed = duration;
            }
            let elapsed = self.animations[index].elapsed;
            let t = if duration > 0.0 {
                (elapsed / duration).clamp(0.0, 1.0)
            } else {
                1.0
            };
            let phase = self.animations[index].playback.phase(t);
            let x = self.animations[index].easing.apply(phase);
            let from = self.animations[index].from;
            let to = self.animations[index].to;
            let value = from + (to - from) * x;

            let property = self.animations[index].property;
            let component = self.animations[index].component;
            if let Some(n) = self.slot_mut(target) {
                *n.property_component_mut(property, component) = value;
            }

            if duration <= 0.0 || self.animations[index].elapsed >= duration {
                let playback = self.animations[index].playback;
                if playback.is_looping() {
                    self.animations[index].elapsed -= duration;
                } else {
                    self.animations[index].cancelled = true;
                    finished.push(index);
                }
            }
        }

        for index in finished {
            if let Some(cb) = self.animations[index].complete_callback.take() {
                let a = &self.animations[index];
                let (target, property, component) = (a.target, a.property, a.component);
                cb(target, property, component, Completion::Finished);
            }
        }
        for index in cancelled {
            if let Some(cb) = self.animations[index].complete_callback.take() {
                let a = &self.animations[index];
                let (target, property, component) = (a.target, a.property, a.component);
                cb(target, property, component, Completion::Cancelled);
            }
        }

        self.animations.retain(|a| !a.cancelled);
    }
}
