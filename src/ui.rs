//! Text shown around the canvas: HUD fields, toasts and result lines

use crate::leaderboard::format_score;
use crate::profile::{DailyBonus, Settlement, ShopReceipt};
use crate::sim::{GameEvent, HudSnapshot, PickupKind, RunStatus};

pub fn format_multiplier(multiplier: f32) -> String {
    format!("x{:.2}", multiplier)
}

/// Filled and empty hearts, e.g. `♥♥♥♡♡`
pub fn lives_text(lives: u8, max_lives: u8) -> String {
    let filled = lives.min(max_lives) as usize;
    let empty = max_lives as usize - filled;
    format!("{}{}", "♥".repeat(filled), "♡".repeat(empty))
}

/// Short status line under the score
pub fn status_line(hud: &HudSnapshot) -> String {
    match hud.status {
        RunStatus::Idle => "Tap to start".to_string(),
        RunStatus::GameOver => "Liquidated".to_string(),
        RunStatus::Running => {
            let mut parts = Vec::new();
            if hud.speed_boost_active {
                parts.push("Speed".to_string());
            }
            if hud.shield_charges > 0 {
                parts.push("Shield".to_string());
            }
            if hud.combo > 0 {
                parts.push(format!("Combo x{}", hud.combo));
            }
            if parts.is_empty() {
                "-".to_string()
            } else {
                parts.join(" · ")
            }
        }
    }
}

/// Toast for an event; routine events stay silent
pub fn toast_message(event: &GameEvent) -> Option<String> {
    let text = match event {
        GameEvent::ShieldAbsorbed => "Shield absorbed the hit.".to_string(),
        GameEvent::Hit { lives_left } if *lives_left > 0 => {
            "Ouch. -1 life. Multiplier reset.".to_string()
        }
        GameEvent::Healed { .. } => "+1 life".to_string(),
        GameEvent::LivesFull => "Lives already full".to_string(),
        GameEvent::ComboMilestone { multiplier, .. } => {
            format!("Combo up! {}", format_multiplier(*multiplier))
        }
        GameEvent::PowerUp { kind } => match kind {
            PickupKind::SpeedBoost => "Speed boost!".to_string(),
            PickupKind::Shield => "Shield up!".to_string(),
            PickupKind::ComboPower => "Combo power-up!".to_string(),
            PickupKind::Coin | PickupKind::Heart => return None,
        },
        GameEvent::GameOver { score } => format!("Rekt! Final PnL {}", format_score(*score)),
        _ => return None,
    };
    Some(text)
}

pub fn daily_message(bonus: &DailyBonus) -> String {
    format!("Daily bonus: +{} credits (streak {})", bonus.credits, bonus.streak)
}

/// Toast listing shop items that were not bought
pub fn receipt_message(receipt: &ShopReceipt) -> Option<String> {
    if receipt.skipped.is_empty() {
        return None;
    }
    let names: Vec<_> = receipt.skipped.iter().map(|i| i.label()).collect();
    Some(format!("Not enough credits for: {}", names.join(", ")))
}

pub fn settlement_line(score: f64, settlement: &Settlement) -> String {
    format!(
        "PnL: {}  •  Earned: +{} credits",
        format_score(score),
        settlement.earned
    )
}
