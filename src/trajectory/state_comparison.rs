// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains tolerance based comparisons of group states.
use nalgebra::DVector;
use tracing::debug;

use crate::trajectory::Waypoint;

/// Epsilon used to decide whether two waypoints describe the same state.
pub static ROBOT_STATE_EQUALITY_EPSILON: f64 = 1e-4;

fn vectors_equal(first: &DVector<f64>, second: &DVector<f64>, epsilon: f64) -> bool {
    first.len() == second.len() && (first - second).norm() <= epsilon
}

/// Determines whether two states have the same positions, velocities and accelerations.
///
/// Each of the three vectors is compared by the Euclidean norm of its difference.
pub fn is_robot_state_equal(state1: &Waypoint, state2: &Waypoint, epsilon: f64) -> bool {
    if !vectors_equal(&state1.positions, &state2.positions, epsilon) {
        debug!(
            "Joint positions of the two states are different. state1: {:?} state2: {:?}",
            state1.positions.as_slice(),
            state2.positions.as_slice()
        );
        return false;
    }
    if !vectors_equal(&state1.velocities, &state2.velocities, epsilon) {
        debug!(
            "Joint velocities of the two states are different. state1: {:?} state2: {:?}",
            state1.velocities.as_slice(),
            state2.velocities.as_slice()
        );
        return false;
    }
    if !vectors_equal(&state1.accelerations, &state2.accelerations, epsilon) {
        debug!(
            "Joint accelerations of the two states are different. state1: {:?} state2: {:?}",
            state1.accelerations.as_slice(),
            state2.accelerations.as_slice()
        );
        return false;
    }
    true
}

/// Determines whether the velocities and accelerations of a state are zero.
pub fn is_robot_state_stationary(state: &Waypoint, epsilon: f64) -> bool {
    if state.velocities.norm() > epsilon {
        debug!("Joint velocities are not zero.");
        return false;
    }
    if state.accelerations.norm() > epsilon {
        debug!("Joint accelerations are not zero.");
        return false;
    }
    true
}
