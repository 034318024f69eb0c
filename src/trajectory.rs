// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the trajectory types and everything needed to generate, check and combine them.
use nalgebra::{DVector, Isometry3};
use std::time::Duration;

use crate::utils::JointValues;

pub mod appender;
pub mod generation;
pub mod intersection;
pub mod limit_check;
pub mod path;
pub mod sampling;
pub mod state_comparison;
pub mod velocity_profile;

/// One sample of a [`JointTrajectory`].
///
/// The values are ordered like the `joint_names` of the trajectory.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JointTrajectoryPoint {
    pub time_from_start: Duration,
    pub positions: Vec<f64>,
    pub velocities: Vec<f64>,
    pub accelerations: Vec<f64>,
}

/// Time-parameterized sequence of joint positions, velocities and accelerations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JointTrajectory {
    pub joint_names: Vec<String>,
    pub points: Vec<JointTrajectoryPoint>,
}

impl JointTrajectory {
    pub fn new(joint_names: Vec<String>) -> Self {
        JointTrajectory {
            joint_names,
            points: Vec::new(),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    pub fn len(&self) -> usize {
        self.points.len()
    }
    /// Positions of a point keyed by joint name.
    pub fn positions_at(&self, index: usize) -> Option<JointValues> {
        self.points.get(index).map(|point| {
            self.joint_names
                .iter()
                .cloned()
                .zip(point.positions.iter().copied())
                .collect()
        })
    }
    /// Total duration, zero for an empty trajectory.
    pub fn duration(&self) -> Duration {
        self.points
            .last()
            .map_or(Duration::ZERO, |point| point.time_from_start)
    }
}

/// Pose of a link at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSample {
    pub pose: Isometry3<f64>,
    pub time_from_start: Duration,
}

/// Cartesian trajectory which is already discretized, e.g. a blend between two motions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartesianTrajectory {
    pub link_name: String,
    /// Samples ordered by increasing time from start.
    pub points: Vec<PoseSample>,
}

/// State of a planning group at one waypoint of a [`RobotTrajectory`].
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub positions: DVector<f64>,
    pub velocities: DVector<f64>,
    pub accelerations: DVector<f64>,
}

impl Waypoint {
    /// Creates a waypoint at rest.
    pub fn at_rest(positions: DVector<f64>) -> Self {
        let dof = positions.len();
        Waypoint {
            positions,
            velocities: DVector::zeros(dof),
            accelerations: DVector::zeros(dof),
        }
    }
    pub fn new(
        positions: DVector<f64>,
        velocities: DVector<f64>,
        accelerations: DVector<f64>,
    ) -> Self {
        Waypoint {
            positions,
            velocities,
            accelerations,
        }
    }
    /// Positions keyed by `joint_names`.
    pub fn joint_positions<S: AsRef<str>>(&self, joint_names: &[S]) -> JointValues {
        joint_names
            .iter()
            .map(|name| name.as_ref().to_string())
            .zip(self.positions.iter().copied())
            .collect()
    }
}

/// Sequence of group states where each waypoint knows its duration from the previous one.
///
/// This is the representation used to hand trajectories to a caller and to combine the
/// trajectories of consecutive motions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RobotTrajectory {
    group_name: String,
    joint_names: Vec<String>,
    waypoints: Vec<Waypoint>,
    durations_from_previous: Vec<f64>,
}

impl RobotTrajectory {
    pub fn new<S: Into<String>>(group_name: S, joint_names: Vec<String>) -> Self {
        RobotTrajectory {
            group_name: group_name.into(),
            joint_names,
            waypoints: Vec::new(),
            durations_from_previous: Vec::new(),
        }
    }

    /// Converts a [`JointTrajectory`]. The duration of the first waypoint is its time from start.
    pub fn from_joint_trajectory<S: Into<String>>(
        group_name: S,
        joint_trajectory: &JointTrajectory,
    ) -> Self {
        let mut trajectory = RobotTrajectory::new(group_name, joint_trajectory.joint_names.clone());
        let mut last_time = 0.;
        for point in &joint_trajectory.points {
            let time = point.time_from_start.as_secs_f64();
            trajectory.add_suffix_waypoint(
                Waypoint::new(
                    DVector::from_column_slice(&point.positions),
                    DVector::from_column_slice(&point.velocities),
                    DVector::from_column_slice(&point.accelerations),
                ),
                time - last_time,
            );
            last_time = time;
        }
        trajectory
    }

    /// Converts back into a [`JointTrajectory`] by accumulating the durations.
    pub fn to_joint_trajectory(&self) -> JointTrajectory {
        let mut joint_trajectory = JointTrajectory::new(self.joint_names.clone());
        let mut time = 0.;
        for (waypoint, duration) in self.waypoints.iter().zip(self.durations_from_previous.iter()) {
            time += duration;
            joint_trajectory.points.push(JointTrajectoryPoint {
                time_from_start: Duration::from_secs_f64(time.max(0.)),
                positions: waypoint.positions.iter().copied().collect(),
                velocities: waypoint.velocities.iter().copied().collect(),
                accelerations: waypoint.accelerations.iter().copied().collect(),
            });
        }
        joint_trajectory
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }
    pub fn joint_names(&self) -> &[String] {
        &self.joint_names
    }
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
    pub fn waypoint_count(&self) -> usize {
        self.waypoints.len()
    }
    pub fn waypoint(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }
    pub fn first_waypoint(&self) -> Option<&Waypoint> {
        self.waypoints.first()
    }
    pub fn last_waypoint(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }
    /// Duration between the waypoint and its predecessor in \[s\].
    pub fn duration_from_previous(&self, index: usize) -> Option<f64> {
        self.durations_from_previous.get(index).copied()
    }
    /// Time from start of a waypoint in \[s\].
    pub fn time_from_start(&self, index: usize) -> Option<f64> {
        if index >= self.durations_from_previous.len() {
            return None;
        }
        Some(self.durations_from_previous[..=index].iter().sum())
    }
    /// Total duration in \[s\].
    pub fn duration(&self) -> f64 {
        self.durations_from_previous.iter().sum()
    }
    pub fn add_suffix_waypoint(&mut self, waypoint: Waypoint, duration_from_previous: f64) {
        self.waypoints.push(waypoint);
        self.durations_from_previous.push(duration_from_previous);
    }
    /// Appends all waypoints of `source`. `dt` is added to the duration of the first appended
    /// waypoint.
    pub fn append(&mut self, source: &RobotTrajectory, dt: f64) {
        let index = self.durations_from_previous.len();
        self.waypoints.extend(source.waypoints.iter().cloned());
        self.durations_from_previous
            .extend(source.durations_from_previous.iter().copied());
        if let Some(duration) = self.durations_from_previous.get_mut(index) {
            *duration += dt;
        }
    }
    pub fn clear(&mut self) {
        self.waypoints.clear();
        self.durations_from_previous.clear();
    }
}
