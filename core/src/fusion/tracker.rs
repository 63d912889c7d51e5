use std::collections::{HashMap, VecDeque};

use log::{debug, info};

use crate::config::PipelineConfig;
use crate::contact::Detection;

use super::track::{Classification, Track};

/// Slab-style track arena.
///
/// Tracks live in fixed slots; eviction frees the slot for reuse without
/// shifting survivors, and the id map stays valid across removals.
#[derive(Debug, Default)]
pub struct TrackStore {
    slots: Vec<Option<Track>>,
    by_id: HashMap<String, usize>,
    free: Vec<usize>,
}

impl TrackStore {
    pub fn insert(&mut self, track: Track) {
        let id = track.id.clone();
        let slot = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(track);
                idx
            }
            None => {
                self.slots.push(Some(track));
                self.slots.len() - 1
            }
        };
        self.by_id.insert(id, slot);
    }

    pub fn get(&self, id: &str) -> Option<&Track> {
        self.by_id.get(id).and_then(|&i| self.slots[i].as_ref())
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Track> {
        let idx = *self.by_id.get(id)?;
        self.slots[idx].as_mut()
    }

    pub fn remove(&mut self, id: &str) -> Option<Track> {
        let idx = self.by_id.remove(id)?;
        let track = self.slots[idx].take();
        self.free.push(idx);
        track
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        self.slots.iter_mut().filter_map(|s| s.as_mut())
    }
}

/// Associates validated detections into tracks and ages the track set.
pub struct Tracker {
    store: TrackStore,
    next_id: u64,
    gate_m: f64,
    decay_per_sec: f64,
    stale_after_secs: f64,
    evict_after_secs: f64,
    min_updates_for_active: u32,
    history_len: usize,
    hostile_speed_mps: f64,
    civilian_speed_mps: f64,
}

impl Tracker {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            store: TrackStore::default(),
            next_id: 1,
            gate_m: config.association_gate_m,
            decay_per_sec: config.confidence_decay_per_sec,
            stale_after_secs: config.stale_after_secs,
            evict_after_secs: config.evict_after_secs,
            min_updates_for_active: config.min_updates_for_active,
            history_len: config.track_history_len,
            hostile_speed_mps: config.hostile_speed_mps,
            civilian_speed_mps: config.civilian_speed_mps,
        }
    }

    pub fn track_count(&self) -> usize {
        self.store.len()
    }

    /// Folds a batch of validated detections into the track set.
    pub fn ingest(&mut self, detections: &[Detection], now: f64) {
        for detection in detections {
            match self.nearest_track_id(detection) {
                Some(id) => self.refresh(&id, detection, now),
                None => self.spawn(detection, now),
            }
        }
    }

    fn nearest_track_id(&self, detection: &Detection) -> Option<String> {
        let mut best: Option<(&Track, f64)> = None;
        for track in self.store.iter() {
            let dist = track.position.distance_to(&detection.position);
            if dist <= self.gate_m && best.map_or(true, |(_, d)| dist < d) {
                best = Some((track, dist));
            }
        }
        best.map(|(t, _)| t.id.clone())
    }

    fn refresh(&mut self, id: &str, detection: &Detection, now: f64) {
        let decay = self.decay_per_sec;
        let history_len = self.history_len;
        let classification =
            self.classify(detection, self.store.get(id).map(|t| t.classification));
        if let Some(track) = self.store.get_mut(id) {
            let decayed = track.effective_confidence(now, decay);
            track.confidence = (0.7 * detection.confidence + 0.3 * decayed).clamp(0.0, 1.0);
            track.position = detection.position;
            if let Some(vel) = detection.velocity {
                track.velocity = vel;
            }
            track.last_updated = detection.timestamp;
            track.last_sensor = detection.sensor_kind;
            track.update_count += 1;
            track.classification = classification;
            if track.history.len() == history_len {
                track.history.pop_front();
            }
            track.history.push_back(detection.clone());
            debug!(
                "refreshed track {} (updates {}, confidence {:.2})",
                track.id, track.update_count, track.confidence
            );
        }
    }

    fn spawn(&mut self, detection: &Detection, _now: f64) {
        let id = format!("TRK-{:04}", self.next_id);
        self.next_id += 1;
        let classification = self.classify(detection, None);
        let mut history = VecDeque::with_capacity(self.history_len);
        history.push_back(detection.clone());
        info!("new track {id} from sensor {}", detection.sensor_id);
        self.store.insert(Track {
            id,
            position: detection.position,
            velocity: detection.velocity.unwrap_or(crate::contact::Velocity::ZERO),
            classification,
            confidence: detection.confidence,
            first_seen: detection.timestamp,
            last_updated: detection.timestamp,
            update_count: 1,
            last_sensor: detection.sensor_kind,
            history,
        });
    }

    /// IFF metadata wins; otherwise kinematics. A hostile call never
    /// downgrades on later evidence.
    fn classify(&self, detection: &Detection, previous: Option<Classification>) -> Classification {
        if previous == Some(Classification::Hostile) {
            return Classification::Hostile;
        }
        match detection.metadata.get("iff_code").map(String::as_str) {
            Some("friendly") => Classification::Friendly,
            Some("civilian") => Classification::Civilian,
            Some("hostile") => Classification::Hostile,
            _ => {
                let speed = detection.velocity.map_or(0.0, |v| v.speed());
                if speed >= self.hostile_speed_mps {
                    Classification::Hostile
                } else if speed > 0.0 && speed <= self.civilian_speed_mps {
                    Classification::Civilian
                } else {
                    previous.unwrap_or(Classification::Unknown)
                }
            }
        }
    }

    /// Drops tracks that have gone twice the stale window without a refresh.
    pub fn maintain(&mut self, now: f64) {
        let evict_after = self.evict_after_secs;
        let doomed: Vec<String> = self
            .store
            .iter()
            .filter(|t| t.time_since_update(now) > evict_after)
            .map(|t| t.id.clone())
            .collect();
        for id in doomed {
            info!("evicting stale track {id}");
            self.store.remove(&id);
        }
    }

    /// Materialized view of the live track set with decay applied, for
    /// downstream stages that must all see the same numbers.
    pub fn snapshot(&self, now: f64) -> Vec<Track> {
        let mut tracks: Vec<Track> = self
            .store
            .iter()
            .map(|t| {
                let mut copy = t.clone();
                copy.confidence = t.effective_confidence(now, self.decay_per_sec);
                copy
            })
            .collect();
        tracks.sort_by(|a, b| a.id.cmp(&b.id));
        tracks
    }

    /// Tracks with enough supporting updates to act on. Stale tracks are
    /// excluded here but stay in the store until eviction, so a refresh
    /// within the grace window revives them.
    pub fn established(&self, now: f64) -> Vec<Track> {
        self.snapshot(now)
            .into_iter()
            .filter(|t| {
                t.update_count >= self.min_updates_for_active
                    && !t.is_stale(now, self.stale_after_secs)
            })
            .collect()
    }

    pub fn stale_after_secs(&self) -> f64 {
        self.stale_after_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::{Position, SensorKind, Velocity};

    fn detection(x: f64, y: f64, timestamp: f64, confidence: f64) -> Detection {
        Detection::new(
            "radar-1",
            SensorKind::Radar,
            timestamp,
            Position::new(x, y, 1_000.0),
            confidence,
        )
    }

    fn tracker() -> Tracker {
        Tracker::new(&PipelineConfig::default())
    }

    #[test]
    fn close_detections_fuse_into_one_track() {
        let mut trk = tracker();
        trk.ingest(&[detection(10_000.0, 0.0, 100.0, 0.8)], 100.0);
        trk.ingest(&[detection(11_000.0, 0.0, 101.0, 0.9)], 101.0);
        assert_eq!(trk.track_count(), 1);
        let tracks = trk.snapshot(101.0);
        assert_eq!(tracks[0].update_count, 2);
    }

    #[test]
    fn detections_outside_the_gate_spawn_new_tracks() {
        let mut trk = tracker();
        trk.ingest(&[detection(10_000.0, 0.0, 100.0, 0.8)], 100.0);
        trk.ingest(&[detection(20_000.0, 0.0, 101.0, 0.8)], 101.0);
        assert_eq!(trk.track_count(), 2);
    }

    #[test]
    fn refresh_blends_confidence_with_decayed_prior() {
        let mut trk = tracker();
        trk.ingest(&[detection(10_000.0, 0.0, 100.0, 0.6)], 100.0);
        // 10s later: decayed prior = 0.6 - 0.1 = 0.5; blend with 0.9 update.
        trk.ingest(&[detection(10_100.0, 0.0, 110.0, 0.9)], 110.0);
        let tracks = trk.snapshot(110.0);
        assert!((tracks[0].confidence - (0.7 * 0.9 + 0.3 * 0.5)).abs() < 1e-9);
    }

    #[test]
    fn stale_tracks_leave_the_active_set_but_survive_the_grace_window() {
        let mut trk = tracker();
        for t in 100..103 {
            trk.ingest(&[detection(10_000.0, 0.0, t as f64, 0.8)], t as f64);
        }
        assert_eq!(trk.established(102.0).len(), 1);

        // 35s unrefreshed: past stale (30s), inside the eviction grace (60s).
        trk.maintain(137.0);
        assert!(trk.established(137.0).is_empty());
        assert_eq!(trk.track_count(), 1);

        // A refresh inside the grace window puts it back in the active set.
        trk.ingest(&[detection(10_200.0, 0.0, 140.0, 0.8)], 140.0);
        assert_eq!(trk.established(140.0).len(), 1);
    }

    #[test]
    fn tracks_evict_after_twice_the_stale_window() {
        let mut trk = tracker();
        trk.ingest(&[detection(10_000.0, 0.0, 100.0, 0.8)], 100.0);
        trk.maintain(150.0);
        assert_eq!(trk.track_count(), 1, "stale but within grace");
        trk.maintain(161.0);
        assert_eq!(trk.track_count(), 0);
    }

    #[test]
    fn iff_metadata_drives_classification() {
        let mut trk = tracker();
        let det = detection(10_000.0, 0.0, 100.0, 0.8).with_metadata("iff_code", "friendly");
        trk.ingest(&[det], 100.0);
        assert_eq!(trk.snapshot(100.0)[0].classification, Classification::Friendly);
    }

    #[test]
    fn fast_unidentified_contact_classifies_hostile_and_sticks() {
        let mut trk = tracker();
        let det = detection(10_000.0, 0.0, 100.0, 0.8)
            .with_velocity(Velocity::new(400.0, 0.0, 0.0));
        trk.ingest(&[det], 100.0);
        assert_eq!(trk.snapshot(100.0)[0].classification, Classification::Hostile);

        // A later slow return does not clear the hostile call.
        let slow = detection(10_500.0, 0.0, 101.0, 0.8)
            .with_velocity(Velocity::new(50.0, 0.0, 0.0));
        trk.ingest(&[slow], 101.0);
        assert_eq!(trk.snapshot(101.0)[0].classification, Classification::Hostile);
    }

    #[test]
    fn store_reuses_freed_slots() {
        let mut trk = tracker();
        trk.ingest(&[detection(10_000.0, 0.0, 100.0, 0.8)], 100.0);
        trk.maintain(200.0);
        assert_eq!(trk.track_count(), 0);
        trk.ingest(&[detection(50_000.0, 0.0, 200.0, 0.8)], 200.0);
        assert_eq!(trk.track_count(), 1);
        assert_eq!(trk.snapshot(200.0)[0].id, "TRK-0002");
    }

    #[test]
    fn history_is_capped() {
        let mut trk = tracker();
        for i in 0..15 {
            trk.ingest(&[detection(10_000.0 + i as f64, 0.0, 100.0 + i as f64, 0.8)], 100.0 + i as f64);
        }
        let tracks = trk.snapshot(115.0);
        assert_eq!(tracks[0].history.len(), 10);
    }
}
