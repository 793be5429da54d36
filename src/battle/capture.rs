//! Capture resolution with shake counts.
//!
//! The catch rate itself is the Gen 1 formula:
//! `(species_rate * status_mult * ball_mult * hp_mult) / 3`, capped at 255.
//! That rate is converted into a per-shake percentile threshold (the 4th
//! root of the capture probability) and rolled up to four times; four
//! passed shakes is a capture. A critical capture rolls a single shake.

use crate::battle::state::TurnRng;
use crate::pokemon::{Combatant, StatusCondition};
use schema::BallKind;

const CRITICAL_CAPTURE_CHANCE: u8 = 25;
const CRITICAL_CAPTURE_FLOOR: f32 = 0.70;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOutcome {
    /// Completed shakes, 0..=4
    pub shakes: u8,
    /// True exactly when `shakes == 4` (or the single critical shake held)
    pub success: bool,
    pub critical: bool,
}

fn status_multiplier(status: &Option<StatusCondition>) -> f32 {
    match status {
        Some(StatusCondition::Sleep(_)) | Some(StatusCondition::Freeze) => 2.0,
        Some(StatusCondition::Paralysis)
        | Some(StatusCondition::Burn)
        | Some(StatusCondition::Poison) => 1.5,
        None => 1.0,
    }
}

/// Gen 1 catch rate for the target with the given ball, capped at 255.
pub fn calculate_catch_rate(target: &Combatant, species_rate: u8, ball: BallKind) -> f32 {
    let max_hp = target.max_hp() as f32;
    let current_hp = target.current_hp as f32;
    let hp_multiplier = (max_hp * 3.0 - current_hp * 2.0) / (max_hp * 3.0);

    let rate =
        (species_rate as f32 * status_multiplier(&target.status) * ball.modifier() * hp_multiplier)
            / 3.0;
    rate.min(255.0)
}

/// Capture probability in [0, 1] for one throw.
pub fn capture_probability(catch_rate: f32) -> f32 {
    (catch_rate / 255.0).clamp(0.0, 1.0)
}

/// Percentile threshold a single shake roll must stay within. The 4th
/// root spreads the overall probability across four independent checks.
fn shake_threshold(probability: f32) -> u8 {
    (probability.max(0.0).sqrt().sqrt() * 100.0).round().min(100.0) as u8
}

/// Resolve one ball throw. The Master Ball bypasses the rolls entirely.
pub fn resolve_capture(
    target: &Combatant,
    species_rate: u8,
    ball: BallKind,
    rng: &mut TurnRng,
) -> CaptureOutcome {
    if ball == BallKind::Master {
        return CaptureOutcome { shakes: 4, success: true, critical: false };
    }

    let probability = capture_probability(calculate_catch_rate(target, species_rate, ball));
    let threshold = shake_threshold(probability);

    let critical = probability > CRITICAL_CAPTURE_FLOOR
        && rng.next_outcome("critical capture check") <= CRITICAL_CAPTURE_CHANCE;

    if critical {
        // A critical capture resolves on a single shake.
        let held = rng.next_outcome("critical capture shake") <= threshold;
        return CaptureOutcome {
            shakes: if held { 4 } else { 1 },
            success: held,
            critical: true,
        };
    }

    let mut shakes = 0;
    for shake in 1..=4u8 {
        if rng.next_outcome("capture shake") <= threshold {
            shakes = shake;
        } else {
            break;
        }
    }
    CaptureOutcome { shakes, success: shakes == 4, critical: false }
}
