//! Writes a detection CSV the dashboard can open: the demo track plus
//! jittered follow-up detections near each school.
//!
//! Usage: `generate_sample [OUTPUT]` (default `sample_detections.csv`).

use anyhow::{Context, Result};
use chrono::{DateTime, Duration};
use survey_scope::data::loader::synthetic_detections;
use survey_scope::data::model::DetectionRecord;

/// Follow-up detections per demo school.
const REVISITS: usize = 3;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// A detection some minutes after `school`, with drifted position and density.
fn revisit(school: &DetectionRecord, n: usize, rng: &mut SimpleRng) -> Result<DetectionRecord> {
    let seen = DateTime::parse_from_rfc3339(&school.timestamp)
        .with_context(|| format!("bad demo timestamp {}", school.timestamp))?;
    let at = seen + Duration::minutes(20 * (n as i64 + 1) + rng.gauss(0.0, 3.0).round() as i64);
    let density = (school.sardine_density + rng.gauss(0.0, 0.08)).clamp(0.05, 1.0);
    let confidence = (school.confidence + rng.gauss(0.0, 0.05)).clamp(0.3, 1.0);

    Ok(DetectionRecord {
        filename: format!(
            "2107RL_{}-D{}-T{}.raw",
            if n % 2 == 0 { "CW" } else { "FM" },
            at.format("%Y%m%d"),
            at.format("%H%M%S")
        ),
        timestamp: at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        sardine_density: (density * 100.0).round() / 100.0,
        confidence: (confidence * 100.0).round() / 100.0,
        latitude: school.latitude.map(|v| v + rng.gauss(0.0, 0.02)),
        longitude: school.longitude.map(|v| v + rng.gauss(0.0, 0.02)),
        depth: school.depth.map(|v| (v + rng.gauss(0.0, 8.0)).max(5.0).round()),
        notes: Some(format!("Revisit {} of school from {}", n + 1, school.filename)),
    })
}

fn main() -> Result<()> {
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_detections.csv".to_string());
    let mut rng = SimpleRng::new(42);

    let schools = synthetic_detections();
    let mut rows = schools.clone();
    for school in &schools {
        for n in 0..REVISITS {
            rows.push(revisit(school, n, &mut rng)?);
        }
    }
    rows.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {output_path}"))?;
    for row in &rows {
        writer.serialize(row).context("writing detection row")?;
    }
    writer.flush().context("flushing CSV")?;

    println!("Wrote {} detections to {output_path}", rows.len());
    Ok(())
}
