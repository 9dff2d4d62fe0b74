//! Cyclic flow-offset animation for the two normal-map samples.
//!
//! Both samples scroll along the flow direction at the same rate, half a
//! cycle apart. Each offset wraps back to zero exactly when the blend weight
//! gives its sample zero influence, so the restart is never visible:
//!
//! ```text
//! offset_a   0 ───────── half ───────── cycle(=0)
//! offset_b  half ─── cycle(=0) ──────── half
//! weight     1 ────────── 0 ──────────── 1      (weight of sample B)
//! ```

use bevy::math::Vec4;

use crate::constants::FLOW_CYCLE;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowCycleState {
    offset_a: f32,
    offset_b: f32,
    half_cycle: f32,
    cycle: f32,
}

impl Default for FlowCycleState {
    fn default() -> Self {
        Self::new(FLOW_CYCLE)
    }
}

impl FlowCycleState {
    /// Starts a cycle of the given length at offsets `(0, cycle / 2)`.
    ///
    /// Non-positive or non-finite lengths fall back to [`FLOW_CYCLE`].
    pub fn new(cycle: f32) -> Self {
        let cycle = if cycle.is_finite() && cycle > 0.0 {
            cycle
        } else {
            FLOW_CYCLE
        };
        let half_cycle = cycle * 0.5;
        Self {
            offset_a: 0.0,
            offset_b: half_cycle,
            half_cycle,
            cycle,
        }
    }

    /// Advances both offsets by elapsed time.
    ///
    /// Driven by a clock rather than a frame counter so the scroll speed does
    /// not depend on the frame rate. Negative or non-finite deltas are ignored.
    pub fn advance(&mut self, delta_seconds: f32) {
        if !delta_seconds.is_finite() || delta_seconds <= 0.0 {
            return;
        }
        self.offset_a = (self.offset_a + delta_seconds).rem_euclid(self.cycle);
        self.offset_b = (self.offset_a + self.half_cycle).rem_euclid(self.cycle);
    }

    pub fn offset_a(&self) -> f32 {
        self.offset_a
    }

    pub fn offset_b(&self) -> f32 {
        self.offset_b
    }

    pub fn half_cycle(&self) -> f32 {
        self.half_cycle
    }

    pub fn cycle(&self) -> f32 {
        self.cycle
    }

    /// Weight of sample B in the normal blend.
    pub fn blend_weight(&self) -> f32 {
        flow_blend_weight(self.offset_a, self.half_cycle)
    }

    /// Packs `(offset_a, offset_b, half_cycle, scale)` the way the shader reads it.
    pub fn config(&self, scale: f32) -> Vec4 {
        Vec4::new(self.offset_a, self.offset_b, self.half_cycle, scale)
    }
}

/// `|half_cycle - offset_a| / half_cycle`: 0 at `offset_a == half_cycle`,
/// 1 at either end of the cycle.
pub fn flow_blend_weight(offset_a: f32, half_cycle: f32) -> f32 {
    (half_cycle - offset_a).abs() / half_cycle
}
