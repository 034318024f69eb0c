// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains trapezoidal velocity profiles.
use tracing::debug;

use crate::model::limits::CartesianLimits;

/// Distances below this value are treated as no motion at all.
pub static DISTANCE_EPS: f64 = 1e-9;

/// Moves from `start` to `end` with a constant acceleration phase, a constant velocity phase
/// and a constant deceleration phase.
///
/// Acceleration and deceleration may differ. If the maximum velocity cannot be reached, the
/// cruise phase vanishes and the profile becomes triangular.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TrapezoidalProfile {
    start: f64,
    end: f64,
    direction: f64,
    distance: f64,
    peak_velocity: f64,
    t_acc: f64,
    t_cruise: f64,
    t_dec: f64,
}

impl TrapezoidalProfile {
    /// Creates the fastest profile from `start` to `end` which respects the limits.
    /// # Arguments
    /// * `start` - Start position.
    /// * `end` - End position.
    /// * `max_velocity` - Maximum velocity, has to be positive.
    /// * `max_acceleration` - Maximum acceleration, has to be positive.
    /// * `max_deceleration` - Maximum deceleration, only the magnitude is used.
    pub fn new(
        start: f64,
        end: f64,
        max_velocity: f64,
        max_acceleration: f64,
        max_deceleration: f64,
    ) -> Self {
        let distance = (end - start).abs();
        let acceleration = max_acceleration.abs();
        let deceleration = max_deceleration.abs();
        if distance <= DISTANCE_EPS {
            return TrapezoidalProfile::with_phase_durations(start, end, 0., 0., 0.);
        }

        let d_acc = max_velocity.powi(2) / (2. * acceleration);
        let d_dec = max_velocity.powi(2) / (2. * deceleration);
        if d_acc + d_dec >= distance {
            let peak_velocity =
                f64::sqrt(2. * distance * acceleration * deceleration / (acceleration + deceleration));
            TrapezoidalProfile::with_phase_durations(
                start,
                end,
                peak_velocity / acceleration,
                0.,
                peak_velocity / deceleration,
            )
        } else {
            TrapezoidalProfile::with_phase_durations(
                start,
                end,
                max_velocity / acceleration,
                (distance - d_acc - d_dec) / max_velocity,
                max_velocity / deceleration,
            )
        }
    }

    /// Creates the profile from `start` to `end` with the given phase durations.
    ///
    /// Used to synchronize several profiles to the phases of the slowest one.
    pub fn with_phase_durations(start: f64, end: f64, t_acc: f64, t_cruise: f64, t_dec: f64) -> Self {
        let distance = (end - start).abs();
        let ramp_time = 0.5 * t_acc + t_cruise + 0.5 * t_dec;
        let (peak_velocity, t_acc, t_cruise, t_dec) = if distance <= DISTANCE_EPS || ramp_time <= 0. {
            (0., 0., 0., 0.)
        } else {
            (distance / ramp_time, t_acc, t_cruise, t_dec)
        };
        TrapezoidalProfile {
            start,
            end,
            direction: if end >= start { 1. } else { -1. },
            distance,
            peak_velocity,
            t_acc,
            t_cruise,
            t_dec,
        }
    }

    pub fn duration(&self) -> f64 {
        self.t_acc + self.t_cruise + self.t_dec
    }
    pub fn start(&self) -> f64 {
        self.start
    }
    pub fn end(&self) -> f64 {
        self.end
    }
    /// Absolute distance between start and end.
    pub fn distance(&self) -> f64 {
        self.distance
    }
    /// Durations of the acceleration, cruise and deceleration phase.
    pub fn phase_durations(&self) -> (f64, f64, f64) {
        (self.t_acc, self.t_cruise, self.t_dec)
    }
    /// Highest velocity magnitude reached by the profile.
    pub fn peak_velocity(&self) -> f64 {
        self.peak_velocity
    }

    fn travelled(&self, t: f64) -> f64 {
        let t_2 = self.t_acc + self.t_cruise;
        if t <= 0. {
            0.
        } else if t < self.t_acc {
            0.5 * self.peak_velocity / self.t_acc * t * t
        } else if t < t_2 {
            0.5 * self.peak_velocity * self.t_acc + self.peak_velocity * (t - self.t_acc)
        } else if t < self.duration() {
            let tau = t - t_2;
            0.5 * self.peak_velocity * self.t_acc
                + self.peak_velocity * self.t_cruise
                + self.peak_velocity * tau
                - 0.5 * self.peak_velocity / self.t_dec * tau * tau
        } else {
            self.distance
        }
    }

    /// Position at time `t`, clamped to start and end outside of the profile.
    pub fn position(&self, t: f64) -> f64 {
        if t >= self.duration() {
            return self.end;
        }
        self.start + self.direction * self.travelled(t)
    }

    pub fn velocity(&self, t: f64) -> f64 {
        let t_2 = self.t_acc + self.t_cruise;
        let speed = if t <= 0. || t >= self.duration() {
            0.
        } else if t < self.t_acc {
            self.peak_velocity / self.t_acc * t
        } else if t < t_2 {
            self.peak_velocity
        } else {
            self.peak_velocity - self.peak_velocity / self.t_dec * (t - t_2)
        };
        self.direction * speed
    }

    pub fn acceleration(&self, t: f64) -> f64 {
        let t_2 = self.t_acc + self.t_cruise;
        let acceleration = if t < 0. || t > self.duration() || self.peak_velocity == 0. {
            0.
        } else if t < self.t_acc {
            self.peak_velocity / self.t_acc
        } else if t < t_2 {
            0.
        } else if self.t_dec > 0. {
            -self.peak_velocity / self.t_dec
        } else {
            0.
        };
        self.direction * acceleration
    }
}

/// Builds the Cartesian velocity profile of a path.
///
/// The rotation is converted into a path length with the equivalent radius
/// `max_trans_vel / max_rot_vel` and the longer of the translational and the rotational length
/// is used. The profile therefore respects the scaled translational velocity, acceleration and
/// deceleration as well as the scaled rotational velocity.
/// # Arguments
/// * `max_velocity_scaling_factor` - Scales the velocity limits.
/// * `max_acceleration_scaling_factor` - Scales the acceleration and deceleration limits.
/// * `cartesian_limits` - Cartesian limits of the link.
/// * `translational_length` - Translational length of the path in \[m\].
/// * `rotational_length` - Angle the link rotates along the path in \[rad\].
/// # Return
/// Profile from zero to the path length. A path without motion yields a profile of duration
/// zero.
pub fn cartesian_trap_velocity_profile(
    max_velocity_scaling_factor: f64,
    max_acceleration_scaling_factor: f64,
    cartesian_limits: &CartesianLimits,
    translational_length: f64,
    rotational_length: f64,
) -> TrapezoidalProfile {
    let equivalent_radius = cartesian_limits.max_trans_vel / cartesian_limits.max_rot_vel;
    let path_length = f64::max(translational_length, equivalent_radius * rotational_length);
    debug!(
        "Cartesian path length {} (translation {}, rotation {})",
        path_length, translational_length, rotational_length
    );
    TrapezoidalProfile::new(
        0.,
        path_length,
        max_velocity_scaling_factor * cartesian_limits.max_trans_vel,
        max_acceleration_scaling_factor * cartesian_limits.max_trans_acc,
        max_acceleration_scaling_factor * cartesian_limits.max_trans_dec,
    )
}

#[cfg(test)]
mod tests {
    use crate::model::limits::CartesianLimits;
    use crate::trajectory::velocity_profile::{cartesian_trap_velocity_profile, TrapezoidalProfile};

    fn float_compare(a: f64, b: f64, thresh: f64) {
        assert!((a - b).abs() < thresh, "{} != {}", a, b);
    }

    fn limits() -> CartesianLimits {
        CartesianLimits {
            max_trans_vel: 1.0,
            max_trans_acc: 2.0,
            max_trans_dec: -4.0,
            max_rot_vel: 0.5,
        }
    }

    #[test]
    fn trapezoidal_profile() {
        let profile = TrapezoidalProfile::new(0., 2., 1., 2., 4.);
        let (t_acc, t_cruise, t_dec) = profile.phase_durations();
        float_compare(t_acc, 0.5, 1e-12);
        float_compare(t_dec, 0.25, 1e-12);
        // 0.25 m accelerating, 0.125 m decelerating
        float_compare(t_cruise, 1.625, 1e-12);
        float_compare(profile.duration(), 2.375, 1e-12);
        float_compare(profile.position(0.5), 0.25, 1e-12);
        float_compare(profile.velocity(1.0), 1.0, 1e-12);
        float_compare(profile.acceleration(0.1), 2.0, 1e-12);
        float_compare(profile.acceleration(2.3), -4.0, 1e-12);
        float_compare(profile.position(profile.duration()), 2., 1e-12);
        float_compare(profile.velocity(profile.duration()), 0., 1e-12);
    }

    #[test]
    fn triangular_profile() {
        let profile = TrapezoidalProfile::new(1., 0., 10., 1., 1.);
        let (t_acc, t_cruise, t_dec) = profile.phase_durations();
        float_compare(t_acc, 1., 1e-12);
        float_compare(t_cruise, 0., 1e-12);
        float_compare(t_dec, 1., 1e-12);
        float_compare(profile.peak_velocity(), 1., 1e-12);
        float_compare(profile.position(1.), 0.5, 1e-12);
        float_compare(profile.velocity(1.), -1., 1e-12);
        float_compare(profile.position(5.), 0., 1e-12);
    }

    #[test]
    fn position_is_continuous() {
        let profile = TrapezoidalProfile::new(-0.3, 0.7, 0.8, 1.5, 0.9);
        let steps = 1000;
        let dt = profile.duration() / steps as f64;
        let mut last = profile.position(0.);
        for i in 1..=steps {
            let position = profile.position(i as f64 * dt);
            assert!(position >= last - 1e-12);
            assert!((position - last) / dt <= 0.8 + 1e-6);
            last = position;
        }
        float_compare(last, 0.7, 1e-9);
    }

    #[test]
    fn synchronized_profile() {
        let leading = TrapezoidalProfile::new(0., 1., 1., 2., 2.);
        let (t_acc, t_cruise, t_dec) = leading.phase_durations();
        let synced = TrapezoidalProfile::with_phase_durations(0., 0.5, t_acc, t_cruise, t_dec);
        float_compare(synced.duration(), leading.duration(), 1e-12);
        float_compare(synced.peak_velocity(), 0.5, 1e-12);
        float_compare(synced.position(synced.duration() / 2.), 0.25, 1e-12);
    }

    #[test]
    fn zero_distance() {
        let profile = TrapezoidalProfile::new(0.4, 0.4, 1., 1., 1.);
        assert_eq!(profile.duration(), 0.);
        assert_eq!(profile.position(0.), 0.4);
        assert_eq!(profile.velocity(0.), 0.);
        assert_eq!(profile.acceleration(0.), 0.);
        let profile = cartesian_trap_velocity_profile(1., 1., &limits(), 0., 0.);
        assert_eq!(profile.duration(), 0.);
    }

    #[test]
    fn cartesian_profile_uses_longer_distance() {
        // equivalent radius is 2 m, rotating by 0.5 rad is like moving 1 m
        let translational = cartesian_trap_velocity_profile(1., 1., &limits(), 0.2, 0.05);
        float_compare(translational.distance(), 0.2, 1e-12);
        let rotational = cartesian_trap_velocity_profile(1., 1., &limits(), 0.2, 0.5);
        float_compare(rotational.distance(), 1.0, 1e-12);

        let slow = cartesian_trap_velocity_profile(0.5, 0.5, &limits(), 2., 0.);
        let fast = cartesian_trap_velocity_profile(1., 1., &limits(), 2., 0.);
        assert!(slow.duration() > fast.duration());
        float_compare(slow.peak_velocity(), 0.5, 1e-12);
    }
}
