//! Player profile: credits, characters, shop and daily streak
//!
//! Persisted to LocalStorage. Everything here runs between runs; the
//! simulation only ever sees the resulting [`RunModifiers`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::{CharacterBonus, RunModifiers, ShopModifiers};

/// Score needed per credit earned at settlement
pub const SCORE_PER_CREDIT: f64 = 120.0;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("not enough credits: need {needed}, have {available}")]
    InsufficientCredits { needed: u64, available: u64 },
    #[error("unknown character `{0}`")]
    UnknownCharacter(String),
    #[error("save data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Playable characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterId {
    Bull,
    Mega,
    Cyber,
    Diamond,
}

/// Static description of a character
#[derive(Debug, Clone, Copy)]
pub struct CharacterDef {
    pub id: CharacterId,
    pub name: &'static str,
    pub description: &'static str,
    pub cost: u64,
    pub bonus: CharacterBonus,
}

impl CharacterId {
    pub const ALL: [CharacterId; 4] = [Self::Bull, Self::Mega, Self::Cyber, Self::Diamond];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bull => "bull",
            Self::Mega => "mega",
            Self::Cyber => "cyber",
            Self::Diamond => "diamond",
        }
    }

    pub fn def(self) -> CharacterDef {
        let neutral = CharacterBonus::default();
        match self {
            Self::Bull => CharacterDef {
                id: self,
                name: "Default Bull",
                description: "Balanced.",
                cost: 0,
                bonus: neutral,
            },
            Self::Mega => CharacterDef {
                id: self,
                name: "Mega Bull",
                description: "+5% base speed.",
                cost: 2500,
                bonus: CharacterBonus {
                    speed_multiplier: 1.05,
                    ..neutral
                },
            },
            Self::Cyber => CharacterDef {
                id: self,
                name: "Cyber Bull",
                description: "-10% power-up cooldowns.",
                cost: 4000,
                bonus: CharacterBonus {
                    cooldown_multiplier: 0.9,
                    ..neutral
                },
            },
            Self::Diamond => CharacterDef {
                id: self,
                name: "Diamond Bull",
                description: "+8% score multiplier.",
                cost: 6000,
                bonus: CharacterBonus {
                    score_multiplier: 1.08,
                    ..neutral
                },
            },
        }
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CharacterId {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ProfileError::UnknownCharacter(s.to_string()))
    }
}

/// Bonus for a stored character id; unknown ids play as the default bull
pub fn character_bonus(id: &str) -> CharacterBonus {
    match id.parse::<CharacterId>() {
        Ok(c) => c.def().bonus,
        Err(err) => {
            log::warn!("{}, using default bonus", err);
            CharacterBonus::default()
        }
    }
}

/// One-run consumables bought before a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShopItem {
    ExtraLife,
    StartShield,
    StartMultiplier,
}

impl ShopItem {
    pub const ALL: [ShopItem; 3] = [Self::ExtraLife, Self::StartShield, Self::StartMultiplier];

    pub fn cost(self) -> u64 {
        match self {
            Self::ExtraLife => 300,
            Self::StartShield => 450,
            Self::StartMultiplier => 700,
        }
    }

    /// Stable id used by the menu checkboxes
    pub fn id(self) -> &'static str {
        match self {
            Self::ExtraLife => "extra_life",
            Self::StartShield => "start_shield",
            Self::StartMultiplier => "start_multiplier",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.id() == id)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ExtraLife => "Extra starting life (+1)",
            Self::StartShield => "Starting shield",
            Self::StartMultiplier => "Starting multiplier (x1.5)",
        }
    }

    fn apply(self, mods: &mut ShopModifiers) {
        match self {
            Self::ExtraLife => mods.extra_starting_lives = mods.extra_starting_lives.saturating_add(1),
            Self::StartShield => mods.starts_with_shield = true,
            Self::StartMultiplier => mods.starting_multiplier = 1.5,
        }
    }
}

/// Result of paying for a shop selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShopReceipt {
    pub modifiers: ShopModifiers,
    pub bought: Vec<ShopItem>,
    /// Items the player could not afford
    pub skipped: Vec<ShopItem>,
    pub spent: u64,
}

/// What selecting a character did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Selected,
    Unlocked { cost: u64 },
}

/// Credits granted by the daily login reward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyBonus {
    pub credits: u64,
    pub streak: u32,
}

/// Outcome of settling a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub earned: u64,
    pub new_best_all_time: bool,
    pub new_best_week: bool,
}

/// ISO week key, e.g. `2026-W07`
pub fn week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Whole points of a run score
pub fn whole_score(score: f64) -> u64 {
    // Float to int casts saturate; NaN becomes 0
    score.max(0.0).floor() as u64
}

/// Everything kept between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveRecord {
    pub credits: u64,
    pub streak: u32,
    pub last_played: Option<NaiveDate>,
    /// Character ids as stored; unknown entries are ignored
    pub unlocked: BTreeSet<String>,
    pub selected: String,
    pub best_all_time: u64,
    pub best_week: u64,
    pub week_key: Option<String>,
}

impl Default for SaveRecord {
    fn default() -> Self {
        let bull = CharacterId::Bull.as_str().to_string();
        Self {
            credits: 0,
            streak: 0,
            last_played: None,
            unlocked: BTreeSet::from([bull.clone()]),
            selected: bull,
            best_all_time: 0,
            best_week: 0,
            week_key: None,
        }
    }
}

impl SaveRecord {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "rekt_runner_save";

    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_unlocked(&self, id: CharacterId) -> bool {
        id == CharacterId::Bull || self.unlocked.contains(id.as_str())
    }

    /// Selected character; a corrupt selection plays as the default bull
    pub fn selected_character(&self) -> CharacterId {
        match self.selected.parse::<CharacterId>() {
            Ok(id) if self.is_unlocked(id) => id,
            _ => CharacterId::Bull,
        }
    }

    pub fn bonus(&self) -> CharacterBonus {
        character_bonus(self.selected_character().as_str())
    }

    /// Select a character, unlocking it first if needed
    pub fn select_character(&mut self, id: CharacterId) -> Result<Selection, ProfileError> {
        if self.is_unlocked(id) {
            self.selected = id.as_str().to_string();
            return Ok(Selection::Selected);
        }

        let cost = id.def().cost;
        if self.credits < cost {
            return Err(ProfileError::InsufficientCredits {
                needed: cost,
                available: self.credits,
            });
        }

        self.credits -= cost;
        self.unlocked.insert(id.as_str().to_string());
        self.selected = id.as_str().to_string();
        log::info!("Unlocked {} for {} credits", id, cost);
        Ok(Selection::Unlocked { cost })
    }

    /// Pay for each selected item in order, skipping what cannot be afforded
    pub fn purchase(&mut self, items: &[ShopItem]) -> ShopReceipt {
        let mut receipt = ShopReceipt::default();
        for &item in items {
            if receipt.bought.contains(&item) || receipt.skipped.contains(&item) {
                continue;
            }
            if self.credits >= item.cost() {
                self.credits -= item.cost();
                receipt.spent += item.cost();
                item.apply(&mut receipt.modifiers);
                receipt.bought.push(item);
            } else {
                log::debug!("Skipping {:?}: {} credits available", item, self.credits);
                receipt.skipped.push(item);
            }
        }
        receipt
    }

    /// Modifiers for the next run: character bonus plus a paid shop selection
    pub fn prepare_run(&mut self, items: &[ShopItem]) -> (RunModifiers, ShopReceipt) {
        let receipt = self.purchase(items);
        let modifiers = RunModifiers {
            character: self.bonus(),
            shop: receipt.modifiers,
        };
        (modifiers, receipt)
    }

    /// First play of a UTC day pays out once; consecutive days grow the streak
    pub fn claim_daily(&mut self, today: NaiveDate) -> Option<DailyBonus> {
        let credits = match self.last_played {
            Some(last) if today <= last => return None,
            Some(last) => {
                if (today - last).num_days() == 1 {
                    self.streak = self.streak.saturating_add(1);
                } else {
                    self.streak = 1;
                }
                100 + (30 * u64::from(self.streak)).min(900)
            }
            None => {
                self.streak = 1;
                150
            }
        };

        self.last_played = Some(today);
        self.credits += credits;
        log::info!("Daily bonus: +{} credits (streak {})", credits, self.streak);
        Some(DailyBonus {
            credits,
            streak: self.streak,
        })
    }

    /// Pay out credits and record bests for a finished run
    pub fn settle_run(&mut self, score: f64, today: NaiveDate) -> Settlement {
        let points = whole_score(score);
        let earned = whole_score(score / SCORE_PER_CREDIT);
        self.credits += earned;

        let week = week_key(today);
        if self.week_key.as_deref() != Some(week.as_str()) {
            self.week_key = Some(week);
            self.best_week = 0;
        }

        let new_best_all_time = points > self.best_all_time;
        let new_best_week = points > self.best_week;
        self.best_all_time = self.best_all_time.max(points);
        self.best_week = self.best_week.max(points);

        Settlement {
            earned,
            new_best_all_time,
            new_best_week,
        }
    }

    /// Load the profile from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(save) => {
                        log::info!("Loaded profile ({} credits)", save.credits);
                        return save;
                    }
                    Err(err) => log::warn!("{}, starting fresh", err),
                }
            }
        }

        log::info!("No profile found, starting fresh");
        Self::default()
    }

    /// Save the profile to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::debug!("Profile saved");
            }
        }
    }

    /// Wipe the stored profile (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn clear_storage() {
        if let Some(storage) = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
        {
            let _ = storage.remove_item(Self::STORAGE_KEY);
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn clear_storage() {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_character_lookup_falls_back() {
        assert_eq!(character_bonus("diamond").score_multiplier, 1.08);
        assert_eq!(character_bonus("mega").speed_multiplier, 1.05);
        assert_eq!(character_bonus("cyber").cooldown_multiplier, 0.9);
        assert_eq!(character_bonus("unicorn"), CharacterBonus::default());
        assert!("unicorn".parse::<CharacterId>().is_err());
    }

    #[test]
    fn test_unlock_spends_credits() {
        let mut save = SaveRecord {
            credits: 3000,
            ..Default::default()
        };
        let err = save.select_character(CharacterId::Cyber).unwrap_err();
        assert!(matches!(err, ProfileError::InsufficientCredits { needed: 4000, available: 3000 }));
        assert_eq!(save.selected_character(), CharacterId::Bull);

        assert_eq!(
            save.select_character(CharacterId::Mega).unwrap(),
            Selection::Unlocked { cost: 2500 }
        );
        assert_eq!(save.credits, 500);
        assert_eq!(save.selected_character(), CharacterId::Mega);

        // Already owned: free to reselect
        save.select_character(CharacterId::Bull).unwrap();
        assert_eq!(
            save.select_character(CharacterId::Mega).unwrap(),
            Selection::Selected
        );
        assert_eq!(save.credits, 500);
    }

    #[test]
    fn test_corrupt_selection_plays_bull() {
        let save = SaveRecord {
            selected: "diamond".into(),
            ..Default::default()
        };
        // Selected but never unlocked
        assert_eq!(save.selected_character(), CharacterId::Bull);
        assert_eq!(save.bonus(), CharacterBonus::default());
    }

    #[test]
    fn test_purchase_skips_unaffordable() {
        let mut save = SaveRecord {
            credits: 800,
            ..Default::default()
        };
        let receipt = save.purchase(&[
            ShopItem::StartMultiplier,
            ShopItem::ExtraLife,
            ShopItem::StartShield,
        ]);
        assert_eq!(receipt.bought, vec![ShopItem::StartMultiplier]);
        assert_eq!(receipt.skipped, vec![ShopItem::ExtraLife, ShopItem::StartShield]);
        assert_eq!(receipt.spent, 700);
        assert_eq!(save.credits, 100);
        assert_eq!(receipt.modifiers.starting_multiplier, 1.5);
        assert_eq!(receipt.modifiers.extra_starting_lives, 0);
    }

    #[test]
    fn test_shop_ids_round_trip() {
        for item in ShopItem::ALL {
            assert_eq!(ShopItem::from_id(item.id()), Some(item));
        }
        assert_eq!(ShopItem::from_id("free_money"), None);
    }

    #[test]
    fn test_purchase_ignores_duplicates() {
        let mut save = SaveRecord {
            credits: 10_000,
            ..Default::default()
        };
        let receipt = save.purchase(&[ShopItem::ExtraLife, ShopItem::ExtraLife]);
        assert_eq!(receipt.modifiers.extra_starting_lives, 1);
        assert_eq!(save.credits, 9_700);
    }

    #[test]
    fn test_prepare_run_combines_bonus_and_shop() {
        let mut save = SaveRecord {
            credits: 450,
            selected: "bull".into(),
            ..Default::default()
        };
        let (mods, receipt) = save.prepare_run(&[ShopItem::StartShield]);
        assert!(mods.shop.starts_with_shield);
        assert_eq!(mods.character, CharacterBonus::default());
        assert!(receipt.skipped.is_empty());
    }

    #[test]
    fn test_daily_streak() {
        let mut save = SaveRecord::default();
        let first = save.claim_daily(day(2026, 3, 1)).unwrap();
        assert_eq!(first, DailyBonus { credits: 150, streak: 1 });
        assert!(save.claim_daily(day(2026, 3, 1)).is_none());

        let second = save.claim_daily(day(2026, 3, 2)).unwrap();
        assert_eq!(second, DailyBonus { credits: 160, streak: 2 });

        // Missed a day
        let reset = save.claim_daily(day(2026, 3, 5)).unwrap();
        assert_eq!(reset, DailyBonus { credits: 130, streak: 1 });
        assert_eq!(save.credits, 150 + 160 + 130);
    }

    #[test]
    fn test_daily_bonus_caps() {
        let mut save = SaveRecord {
            streak: 40,
            last_played: Some(day(2026, 1, 1)),
            ..Default::default()
        };
        let bonus = save.claim_daily(day(2026, 1, 2)).unwrap();
        assert_eq!(bonus.credits, 1000);
    }

    #[test]
    fn test_week_key_is_iso() {
        assert_eq!(week_key(day(2026, 1, 1)), "2026-W01");
        // 2027-01-01 is a Friday, still in the last ISO week of 2026
        assert_eq!(week_key(day(2027, 1, 1)), "2026-W53");
        assert_eq!(week_key(day(2026, 10, 16)), "2026-W42");
    }

    #[test]
    fn test_settle_run() {
        let mut save = SaveRecord::default();
        let s = save.settle_run(1250.7, day(2026, 10, 14));
        assert_eq!(s.earned, 10);
        assert!(s.new_best_all_time && s.new_best_week);
        assert_eq!(save.best_all_time, 1250);

        let s = save.settle_run(900.0, day(2026, 10, 15));
        assert!(!s.new_best_all_time && !s.new_best_week);

        // Next week the weekly best starts over
        let s = save.settle_run(900.0, day(2026, 10, 20));
        assert!(s.new_best_week);
        assert_eq!(save.best_week, 900);
        assert_eq!(save.best_all_time, 1250);
        assert_eq!(save.credits, 10 + 7 + 7);
    }

    #[test]
    fn test_settle_negative_or_nan_score() {
        let mut save = SaveRecord::default();
        assert_eq!(save.settle_run(f64::NAN, day(2026, 1, 5)).earned, 0);
        assert_eq!(save.settle_run(-50.0, day(2026, 1, 5)).earned, 0);
    }

    #[test]
    fn test_partial_save_json() {
        let save = SaveRecord::from_json(r#"{ "credits": 42, "last_played": "2026-02-03" }"#).unwrap();
        assert_eq!(save.credits, 42);
        assert_eq!(save.last_played, Some(day(2026, 2, 3)));
        assert_eq!(save.selected_character(), CharacterId::Bull);
        assert!(matches!(
            SaveRecord::from_json("nope"),
            Err(ProfileError::Corrupt(_))
        ));
    }
}
