// src/control.rs
//! PI assist controller with hysteresis latch, ramp limit and saturation

use serde::{Deserialize, Serialize};

use crate::config::AssistConfig;

/// Controller memory carried across cycles
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControllerState {
    /// Integrated deficit; not clamped
    pub integral: f64,
    pub last_output: f64,
    pub engaged: bool,
}

#[derive(Debug, Clone)]
pub struct AssistController {
    kp: f64,
    ki: f64,
    ramp_max: f64,
    min: f64,
    max: f64,
    hysteresis: f64,
    state: ControllerState,
}

impl AssistController {
    pub fn new(config: &AssistConfig) -> Self {
        Self {
            kp: config.assist_kp,
            ki: config.assist_ki,
            ramp_max: config.assist_ramp_max,
            min: config.assist_min,
            max: config.assist_max,
            hysteresis: config.hysteresis,
            state: ControllerState::default(),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Advance one cycle with the measured deficit and elapsed seconds
    pub fn step(&mut self, deficit: f64, dt: f64) -> f64 {
        self.state.integral += deficit * dt;
        let raw = self.kp * deficit + self.ki * self.state.integral;

        if !self.state.engaged && raw > self.hysteresis {
            self.state.engaged = true;
        } else if self.state.engaged && raw < self.hysteresis / 2.0 {
            self.state.engaged = false;
        }

        let target = if self.state.engaged { raw } else { 0.0 };
        let max_step = (self.ramp_max * dt).max(0.0);
        let last = self.state.last_output;
        let output = target
            .max(last - max_step)
            .min(last + max_step)
            .max(self.min)
            .min(self.max);

        self.state.last_output = output;
        tracing::debug!(deficit, raw, output, engaged = self.state.engaged, "controller step");
        output
    }

    /// Clear the integrated deficit
    pub fn reset_integral(&mut self) {
        self.state.integral = 0.0;
    }

    /// Record that the actuator was commanded to zero outside of `step`
    pub fn hold_zero(&mut self) {
        self.state.last_output = 0.0;
    }
}
