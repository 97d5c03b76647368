// SPDX-License-Identifier: Apache-2.0
//! Texture-set flipbook animation: a node bound to a named animation
//! within a texture atlas advances a normalized frame position over
//! `frame_count / fps` seconds (the texture-set flipbook contract).

use crate::animation::PlaybackMode;

/// Looks up the UV rectangle (`u0, v0, u1, v1`) for a given frame of a
/// named flipbook animation within a texture set.
pub trait FlipbookUvLookup {
    /// Returns the UV rectangle for `animation_hash`'s frame
    /// `frame_index`, or `None` if the animation or frame is unknown.
    fn uv_rect(&self, animation_hash: u64, frame_index: u32) -> Option<[f32; 4]>;
}

/// A live flipbook playback: the normalized position within a named
/// animation's frame sequence.
#[derive(Debug, Clone, Copy)]
pub struct FlipbookPlayer {
    animation_hash: u64,
    frame_count: u32,
    fps: f32,
    elapsed: f32,
    playback: PlaybackMode,
    done: bool,
}

impl FlipbookPlayer {
    /// Starts playback of `animation_hash`, a sequence of `frame_count`
    /// frames played at `fps` frames per second.
    #[must_use]
    pub fn new(animation_hash: u64, frame_count: u32, fps: f32, playback: PlaybackMode) -> Self {
        Self {
            animation_hash,
            frame_count,
            fps,
            elapsed: 0.0,
            playback,
            done: false,
        }
    }

    /// Advances playback by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if self.done || self.frame_count == 0 || self.fps <= 0.0 {
            return;
        }
        let duration = f32::from(u16::try_from(self.frame_count).unwrap_or(u16::MAX)) / self.fps;
        self.elapsed += dt;
        let looping = matches!(
            self.playback,
            PlaybackMode::LoopForward | PlaybackMode::LoopBackward | PlaybackMode::LoopPingpong
        );
        if self.elapsed >= duration {
            if looping {
                if duration > 0.0 {
                    self.elapsed %= duration;
                }
            } else {
                self.elapsed = duration;
                self.done = true;
            }
        }
    }

    /// Returns the current frame index, resolved through `playback`'s
    /// direction.
    #[must_use]
    pub fn frame_index(&self) -> u32 {
        if self.frame_count == 0 {
            return 0;
        }
        let duration = f32::from(u16::try_from(self.frame_count).unwrap_or(u16::MAX)) / self.fps;
        let t = if duration > 0.0 {
            (self.elapsed / duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let phase = match self.playback {
            PlaybackMode::OnceForward | PlaybackMode::LoopForward => t,
            PlaybackMode::OnceBackward | PlaybackMode::LoopBackward => 1.0 - t,
            PlaybackMode::OncePingpong | PlaybackMode::LoopPingpong => 1.0 - (2.0 * t - 1.0).abs(),
        };
        let last = self.frame_count - 1;
        (phase * f32::from(u16::try_from(last).unwrap_or(u16::MAX))).round() as u32
    }

    /// The animation hash this player is advancing through.
    #[must_use]
    pub fn animation_hash(&self) -> u64 {
        self.animation_hash
    }

    /// Whether a non-looping playback has reached its final frame.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }
}
