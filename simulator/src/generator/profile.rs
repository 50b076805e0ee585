use crate::generator::template::{move_data, planner_start_data, render, LogFormat};
use anyhow::Context;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Configuration for generating a synthetic fleet log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub robots: usize,
    /// Every n-th robot is a drone; 0 disables drones.
    pub drone_every: usize,
    pub tasks_per_robot: usize,
    pub max_moves_per_task: usize,
    pub map_width: u32,
    pub map_height: u32,
    pub seed: u64,
    pub format: LogFormat,
    pub description: Option<String>,
    pub scenario: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            robots: 3,
            drone_every: 3,
            tasks_per_robot: 2,
            max_moves_per_task: 12,
            map_width: 20,
            map_height: 20,
            seed: 0,
            format: LogFormat::Text,
            description: None,
            scenario: None,
        }
    }
}

impl GeneratorConfig {
    fn normalized_map(&self) -> (u32, u32) {
        (self.map_width.max(1), self.map_height.max(1))
    }
}

fn robot_identity(index: usize, drone_every: usize) -> (String, String) {
    let is_drone = drone_every > 0 && (index + 1) % drone_every == 0;
    if is_drone {
        (format!("d{}", index + 1), format!("Drone {}", index + 1))
    } else {
        (format!("r{}", index + 1), format!("Rover {}", index + 1))
    }
}

fn step_toward(from: (i32, i32), to: (i32, i32)) -> (i32, i32) {
    if from.0 != to.0 {
        (from.0 + (to.0 - from.0).signum(), from.1)
    } else {
        (from.0, from.1 + (to.1 - from.1).signum())
    }
}

/// One robot's entries in order: a planner start per task, each followed by
/// grid steps toward the task goal.
fn robot_entries(
    config: &GeneratorConfig,
    index: usize,
    rng: &mut StdRng,
) -> VecDeque<(&'static str, String)> {
    let (width, height) = config.normalized_map();
    let (robot_id, robot_name) = robot_identity(index, config.drone_every);
    let mut position = (
        rng.gen_range(0..width as i32),
        rng.gen_range(0..height as i32),
    );
    let mut entries = VecDeque::new();

    for _ in 0..config.tasks_per_robot.max(1) {
        let goal = (
            rng.gen_range(0..width as i32),
            rng.gen_range(0..height as i32),
        );
        entries.push_back((
            "PLANNER_START",
            planner_start_data(&robot_id, &robot_name, position, goal, (width, height)),
        ));
        for _ in 0..config.max_moves_per_task {
            if position == goal {
                break;
            }
            position = step_toward(position, goal);
            entries.push_back(("MOVE_EXECUTED", move_data(&robot_id, position)));
        }
    }

    entries
}

/// Interleaves every robot's entries round-robin, as concurrent execution
/// would log them.
pub fn build_log_from_config(config: &GeneratorConfig) -> anyhow::Result<String> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut queues: Vec<_> = (0..config.robots)
        .map(|index| robot_entries(config, index, &mut rng))
        .collect();

    let mut entries = Vec::new();
    while queues.iter().any(|queue| !queue.is_empty()) {
        for queue in &mut queues {
            if let Some(entry) = queue.pop_front() {
                entries.push(entry);
            }
        }
    }

    render(&entries, config.format).context("rendering synthetic log")
}

#[cfg(test)]
pub fn build_log(robots: usize, seed: u64) -> anyhow::Result<String> {
    let config = GeneratorConfig {
        robots,
        seed,
        ..Default::default()
    };
    build_log_from_config(&config)
}
