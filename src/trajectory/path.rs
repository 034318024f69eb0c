// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the geometric Cartesian paths and their time parameterization.
use nalgebra::{Isometry3, Unit, UnitQuaternion, Vector3};
use std::f64::consts::PI;
use tracing::error;

use crate::exception::PlanningException;
use crate::trajectory::velocity_profile::{TrapezoidalProfile, DISTANCE_EPS};
use crate::utils::{angular_distance, pose_from_parts, translational_distance};
use crate::PlanningResult;

/// Maximum difference between the start radius and the goal radius of a circle defined by its
/// center in \[m\].
pub static MAX_RADIUS_DEVIATION: f64 = 1e-4;
/// Smallest cross product norm of two circle vectors before the points count as collinear.
pub static COLLINEARITY_THRESHOLD: f64 = 1e-8;

/// Time parameterized path of a link.
pub trait ContinuousPath {
    /// Duration of the path in \[s\].
    fn duration(&self) -> f64;
    /// Pose of the link at time `t`, clamped to the start and end of the path.
    fn pose_at(&self, t: f64) -> Isometry3<f64>;
}

/// Geometry of a path which is parameterized by the travelled fraction in \[0, 1\].
pub trait PathGeometry {
    fn pose_at_fraction(&self, fraction: f64) -> Isometry3<f64>;
    /// Length of the path of the origin in \[m\].
    fn translational_length(&self) -> f64;
    /// Total angle the orientation turns by in \[rad\].
    fn rotational_length(&self) -> f64;
}

fn interpolate_orientation(
    start: &UnitQuaternion<f64>,
    goal: &UnitQuaternion<f64>,
    fraction: f64,
) -> UnitQuaternion<f64> {
    start
        .try_slerp(goal, fraction, f64::EPSILON)
        .unwrap_or(if fraction < 0.5 { *start } else { *goal })
}

/// Straight line between two poses, the orientation is interpolated spherically.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearPath {
    start: Isometry3<f64>,
    goal: Isometry3<f64>,
}

impl LinearPath {
    pub fn new(start: Isometry3<f64>, goal: Isometry3<f64>) -> Self {
        LinearPath { start, goal }
    }
}

impl PathGeometry for LinearPath {
    fn pose_at_fraction(&self, fraction: f64) -> Isometry3<f64> {
        let fraction = fraction.clamp(0., 1.);
        let position = self
            .start
            .translation
            .vector
            .lerp(&self.goal.translation.vector, fraction);
        let orientation =
            interpolate_orientation(&self.start.rotation, &self.goal.rotation, fraction);
        pose_from_parts(&position, &orientation)
    }
    fn translational_length(&self) -> f64 {
        translational_distance(&self.start, &self.goal)
    }
    fn rotational_length(&self) -> f64 {
        angular_distance(&self.start, &self.goal)
    }
}

/// Arc of a circle from a start pose to a goal pose, the orientation is interpolated
/// spherically.
#[derive(Debug, Clone, PartialEq)]
pub struct CircularPath {
    center: Vector3<f64>,
    start_radius_vector: Vector3<f64>,
    axis: Unit<Vector3<f64>>,
    angle: f64,
    start_orientation: UnitQuaternion<f64>,
    goal_orientation: UnitQuaternion<f64>,
}

fn path_constraint_error(message: String) -> PlanningException {
    error!("{}", message);
    PlanningException::InvalidPathConstraints { message }
}

impl CircularPath {
    /// Creates the shorter arc around `center` from `start` to `goal`.
    /// # Errors
    /// * InvalidPathConstraints if start and goal have a different distance to the center or
    /// if the three points are collinear, which leaves the circle plane undefined.
    pub fn from_center(
        start: &Isometry3<f64>,
        goal: &Isometry3<f64>,
        center: &Vector3<f64>,
    ) -> PlanningResult<Self> {
        let start_radius_vector = start.translation.vector - center;
        let goal_radius_vector = goal.translation.vector - center;
        let start_radius = start_radius_vector.norm();
        let goal_radius = goal_radius_vector.norm();
        if (start_radius - goal_radius).abs() > MAX_RADIUS_DEVIATION {
            return Err(path_constraint_error(format!(
                "Distances of start ({}) and goal ({}) to the center point differ",
                start_radius, goal_radius
            )));
        }
        let normal = start_radius_vector.cross(&goal_radius_vector);
        let axis = Unit::try_new(normal, COLLINEARITY_THRESHOLD).ok_or_else(|| {
            path_constraint_error(
                "Start, goal and center point are collinear, the circle is not unique".to_string(),
            )
        })?;
        Ok(CircularPath {
            center: *center,
            start_radius_vector,
            axis,
            angle: start_radius_vector.angle(&goal_radius_vector),
            start_orientation: start.rotation,
            goal_orientation: goal.rotation,
        })
    }

    /// Creates the arc from `start` through `interim` to `goal`.
    /// # Errors
    /// * InvalidPathConstraints if the three points are collinear.
    pub fn from_interim(
        start: &Isometry3<f64>,
        goal: &Isometry3<f64>,
        interim: &Vector3<f64>,
    ) -> PlanningResult<Self> {
        let p0 = start.translation.vector;
        let p1 = goal.translation.vector;
        let a = p0 - p1;
        let b = interim - p1;
        let a_cross_b = a.cross(&b);
        let normal = (interim - p0).cross(&(p1 - interim));
        let axis = match Unit::try_new(normal, COLLINEARITY_THRESHOLD) {
            Some(axis) if a_cross_b.norm() > COLLINEARITY_THRESHOLD => axis,
            _ => {
                return Err(path_constraint_error(
                    "Start, interim and goal point are collinear, the circle is not unique"
                        .to_string(),
                ))
            }
        };
        // circumcenter of the triangle
        let center = p1
            + (b * a.norm_squared() - a * b.norm_squared()).cross(&a_cross_b)
                / (2. * a_cross_b.norm_squared());

        let start_radius_vector = p0 - center;
        let goal_radius_vector = p1 - center;
        // the arc runs counterclockwise around the axis and passes the interim point
        let mut angle = f64::atan2(
            axis.dot(&start_radius_vector.cross(&goal_radius_vector)),
            start_radius_vector.dot(&goal_radius_vector),
        );
        if angle <= 0. {
            angle += 2. * PI;
        }
        Ok(CircularPath {
            center,
            start_radius_vector,
            axis,
            angle,
            start_orientation: start.rotation,
            goal_orientation: goal.rotation,
        })
    }

    pub fn center(&self) -> &Vector3<f64> {
        &self.center
    }
    pub fn radius(&self) -> f64 {
        self.start_radius_vector.norm()
    }
    /// Angle of the arc in \[rad\].
    pub fn angle(&self) -> f64 {
        self.angle
    }
}

impl PathGeometry for CircularPath {
    fn pose_at_fraction(&self, fraction: f64) -> Isometry3<f64> {
        let fraction = fraction.clamp(0., 1.);
        let rotation = UnitQuaternion::from_axis_angle(&self.axis, fraction * self.angle);
        let position = self.center + rotation * self.start_radius_vector;
        let orientation =
            interpolate_orientation(&self.start_orientation, &self.goal_orientation, fraction);
        pose_from_parts(&position, &orientation)
    }
    fn translational_length(&self) -> f64 {
        self.radius() * self.angle
    }
    fn rotational_length(&self) -> f64 {
        self.start_orientation.angle_to(&self.goal_orientation)
    }
}

/// Moves along a [`PathGeometry`] following a [`TrapezoidalProfile`] over the path length.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfiledPath<G: PathGeometry> {
    geometry: G,
    profile: TrapezoidalProfile,
}

impl<G: PathGeometry> ProfiledPath<G> {
    /// `profile` has to run from zero to the path length.
    pub fn new(geometry: G, profile: TrapezoidalProfile) -> Self {
        ProfiledPath { geometry, profile }
    }
    pub fn geometry(&self) -> &G {
        &self.geometry
    }
    pub fn profile(&self) -> &TrapezoidalProfile {
        &self.profile
    }
}

impl<G: PathGeometry> ContinuousPath for ProfiledPath<G> {
    fn duration(&self) -> f64 {
        self.profile.duration()
    }
    fn pose_at(&self, t: f64) -> Isometry3<f64> {
        let length = self.profile.distance();
        let fraction = if length > DISTANCE_EPS {
            self.profile.position(t) / length
        } else {
            1.
        };
        self.geometry.pose_at_fraction(fraction)
    }
}
