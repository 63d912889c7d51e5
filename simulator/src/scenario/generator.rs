use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skywatchcore::anomaly::{AccessEvent, SpectrumFrame};
use skywatchcore::contact::{Detection, Position, SensorKind, Velocity};
use skywatchcore::CycleInput;

use super::config::ScenarioConfig;

/// Seeded synthetic feed: deterministic per seed, so a scenario replays
/// bit-for-bit across runs.
pub struct SimulationContext {
    config: ScenarioConfig,
    rng: StdRng,
    cycle: u64,
}

impl SimulationContext {
    /// Raid ingress speed; fast enough to classify hostile on kinematics.
    const RAID_SPEED_MPS: f64 = 350.0;
    const RAID_START_RANGE_M: f64 = 150_000.0;

    pub fn new(config: ScenarioConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            cycle: 0,
        }
    }

    pub fn cycle_secs(&self) -> f64 {
        self.config.cycle_secs
    }

    /// Builds the next cycle's worth of sensor input.
    pub fn next_cycle(&mut self, now: f64) -> CycleInput {
        let mut detections = Vec::new();
        self.civilian_transits(now, &mut detections);
        self.raid(now, &mut detections);
        self.corrupt_some(&mut detections);

        let input = CycleInput {
            detections,
            spectrum: Some(self.spectrum_frame()),
            access_events: self.access_events(now),
        };
        self.cycle += 1;
        input
    }

    fn civilian_transits(&mut self, now: f64, out: &mut Vec<Detection>) {
        for lane in 0..self.config.civilian_count {
            // Each lane orbits at a fixed radius, crossing the extended zone.
            let radius = 60_000.0 + 12_000.0 * lane as f64;
            let angular = 80.0 / radius;
            let phase = lane as f64 * 1.3 + self.cycle as f64 * self.config.cycle_secs * angular;
            let position = Position::new(
                radius * phase.cos(),
                radius * phase.sin(),
                9_000.0 + self.rng.gen_range(-200.0..200.0),
            );
            let velocity = Velocity::new(
                -80.0 * phase.sin(),
                80.0 * phase.cos(),
                self.rng.gen_range(-2.0..2.0),
            );
            out.push(
                Detection::new(
                    format!("radar-{}", lane % 2 + 1),
                    SensorKind::Radar,
                    now,
                    position,
                    self.rng.gen_range(0.85..0.97),
                )
                .with_velocity(velocity)
                .with_metadata("iff_code", "civilian"),
            );
        }
    }

    fn raid(&mut self, now: f64, out: &mut Vec<Detection>) {
        let Some(start) = self.config.raid_after_cycle else {
            return;
        };
        if self.cycle < start {
            return;
        }
        let elapsed = (self.cycle - start) as f64 * self.config.cycle_secs;
        let range = (Self::RAID_START_RANGE_M - Self::RAID_SPEED_MPS * elapsed).max(3_000.0);
        for raider in 0..self.config.raid_size {
            let offset = raider as f64 * 2_000.0;
            let position = Position::new(range + offset, offset, 500.0);
            // Straight ingress toward the site, no IFF response.
            let velocity = Velocity::new(-Self::RAID_SPEED_MPS, 0.0, 0.0);
            out.push(
                Detection::new(
                    "radar-1",
                    SensorKind::Radar,
                    now,
                    position,
                    self.rng.gen_range(0.88..0.98),
                )
                .with_velocity(velocity),
            );
        }
    }

    fn corrupt_some(&mut self, detections: &mut Vec<Detection>) {
        for det in detections.iter_mut() {
            if self.rng.gen_bool(self.config.malformed_rate) {
                if self.rng.gen_bool(0.5) {
                    det.position.x = f64::NAN;
                } else {
                    det.confidence = 1.0 + self.rng.gen_range(0.1..5.0);
                }
            }
        }
    }

    fn spectrum_frame(&mut self) -> SpectrumFrame {
        let jamming = self
            .config
            .jamming_after_cycle
            .map_or(false, |start| self.cycle >= start);
        let base = if jamming { -52.0 } else { -80.0 };
        let power_db = Array2::from_shape_fn((4, 8), |_| base + self.rng.gen_range(-1.5..1.5));
        SpectrumFrame {
            power_db,
            noise_floor_db: -90.0,
        }
    }

    fn access_events(&mut self, now: f64) -> Vec<AccessEvent> {
        let mut events = Vec::new();
        let routine = self.rng.gen_range(3..6);
        for i in 0..routine {
            events.push(AccessEvent {
                timestamp: now + i as f64 * 0.05,
                subsystem: if i % 2 == 0 { "tracks" } else { "spectrum" }.into(),
                resource: "snapshot".into(),
                granted: true,
            });
        }

        let probing = self
            .config
            .probe_after_cycle
            .map_or(false, |start| self.cycle >= start);
        if probing {
            for i in 0..15 {
                events.push(AccessEvent {
                    timestamp: now + 0.5 + i as f64 * 0.01,
                    subsystem: "command".into(),
                    resource: "override".into(),
                    granted: false,
                });
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_seeds_replay_identically() {
        let mut a = SimulationContext::new(ScenarioConfig::default());
        let mut b = SimulationContext::new(ScenarioConfig::default());
        for cycle in 0..5 {
            let now = 1_000.0 + cycle as f64;
            let left = a.next_cycle(now);
            let right = b.next_cycle(now);
            assert_eq!(left.detections.len(), right.detections.len());
            for (l, r) in left.detections.iter().zip(&right.detections) {
                assert_eq!(l.confidence, r.confidence);
                assert_eq!(l.position.x.to_bits(), r.position.x.to_bits());
            }
        }
    }

    #[test]
    fn raid_appears_only_after_its_start_cycle() {
        let config = ScenarioConfig {
            civilian_count: 0,
            malformed_rate: 0.0,
            raid_after_cycle: Some(3),
            raid_size: 2,
            ..Default::default()
        };
        let mut sim = SimulationContext::new(config);
        for cycle in 0..3 {
            assert!(sim.next_cycle(cycle as f64).detections.is_empty());
        }
        let input = sim.next_cycle(3.0);
        assert_eq!(input.detections.len(), 2);
        assert!(input.detections[0].velocity.unwrap().speed() > 300.0);
        assert!(input.detections[0].metadata.get("iff_code").is_none());
    }

    #[test]
    fn raiders_close_on_the_site() {
        let config = ScenarioConfig {
            civilian_count: 0,
            malformed_rate: 0.0,
            raid_after_cycle: Some(0),
            raid_size: 1,
            ..Default::default()
        };
        let mut sim = SimulationContext::new(config);
        let first = sim.next_cycle(0.0).detections[0].position.range_from_origin();
        for cycle in 1..10 {
            sim.next_cycle(cycle as f64);
        }
        let later = sim.next_cycle(10.0).detections[0].position.range_from_origin();
        assert!(later < first);
    }

    #[test]
    fn jamming_raises_mean_power() {
        let config = ScenarioConfig {
            jamming_after_cycle: Some(2),
            ..Default::default()
        };
        let mut sim = SimulationContext::new(config);
        let quiet = sim.next_cycle(0.0).spectrum.unwrap().mean_power_db().unwrap();
        sim.next_cycle(1.0);
        let jammed = sim.next_cycle(2.0).spectrum.unwrap().mean_power_db().unwrap();
        assert!(jammed > quiet + 20.0);
    }

    #[test]
    fn probe_emits_denial_runs() {
        let config = ScenarioConfig {
            probe_after_cycle: Some(0),
            ..Default::default()
        };
        let mut sim = SimulationContext::new(config);
        let events = sim.next_cycle(0.0).access_events;
        let denials = events.iter().filter(|e| !e.granted).count();
        assert!(denials >= 15);
    }
}
