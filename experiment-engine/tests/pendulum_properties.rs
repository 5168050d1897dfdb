use approx::assert_relative_eq;
use experiment_engine::engine::simulation::pendulum::{
    DampingModel, PendulumParams, PendulumSimulation,
};

const FRAME: f32 = 1.0 / 60.0;

fn running(length: f32, gravity: f32, initial_angle: f32) -> PendulumSimulation {
    let params = PendulumParams::new(length, gravity, initial_angle).unwrap();
    let mut sim = PendulumSimulation::new(params).unwrap();
    assert!(sim.start());
    sim
}

/// Peak |angle| of each half swing, found at velocity sign changes.
fn swing_peaks(sim: &mut PendulumSimulation, steps: usize, dt: f32) -> Vec<f32> {
    let mut peaks = Vec::new();
    let mut previous_velocity = sim.angular_velocity();
    for _ in 0..steps {
        sim.step(dt).unwrap();
        let velocity = sim.angular_velocity();
        if previous_velocity != 0.0 && velocity.signum() != previous_velocity.signum() {
            peaks.push(sim.angle().abs());
        }
        previous_velocity = velocity;
    }
    peaks
}

#[test]
fn damped_swing_never_grows() {
    for initial_angle in [0.1, 0.5236, 1.0, 2.5] {
        let mut sim = running(2.0, 9.8, initial_angle);
        let peaks = swing_peaks(&mut sim, 60 * 30, FRAME);

        assert!(peaks.len() > 4, "too few swings for {initial_angle}");
        assert!(peaks[0] <= initial_angle);
        for pair in peaks.windows(2) {
            assert!(
                pair[1] <= pair[0],
                "peak grew from {} to {} (initial angle {initial_angle})",
                pair[0],
                pair[1]
            );
        }
    }
}

#[test]
fn damped_swing_decays_towards_rest() {
    let mut sim = running(1.0, 9.8, 0.5236);
    for _ in 0..60 * 120 {
        sim.step(FRAME).unwrap();
    }
    assert!(sim.angle().abs() < 1e-3);
    assert!(sim.energy_per_unit_mass() < 1e-4);
}

#[test]
fn small_angle_period_matches_linear_theory() {
    let dt = 0.001;
    let mut sim = running(2.0, 9.8, 0.05).with_damping(DampingModel::PerStep(1.0));

    let mut crossings = Vec::new();
    let mut time = 0.0_f32;
    let mut previous_angle = sim.angle();
    while crossings.len() < 3 && time < 20.0 {
        sim.step(dt).unwrap();
        time += dt;
        let angle = sim.angle();
        if previous_angle.signum() != angle.signum() {
            // Linear interpolation of the crossing inside this step.
            let fraction = previous_angle / (previous_angle - angle);
            crossings.push(time - dt + fraction * dt);
        }
        previous_angle = angle;
    }

    assert_eq!(crossings.len(), 3);
    let measured = crossings[2] - crossings[0];
    let expected = sim.params().small_angle_period();
    assert_relative_eq!(measured, expected, max_relative = 0.02);
}

#[test]
fn reset_after_running_restores_release() {
    let mut sim = running(1.5, 9.8, 0.4);
    for _ in 0..90 {
        sim.step(FRAME).unwrap();
    }
    sim.reset();
    sim.reset();
    assert_eq!(sim.angle(), 0.4);
    assert_eq!(sim.angular_velocity(), 0.0);
    assert!(!sim.is_running());
}
