//! End-of-battle resolution: terminal results and victory rewards.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{BattleRng, Roster, Side, Terms};
use crate::interfaces::RewardSink;

/// How the encounter ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleResult {
    Victory,
    Defeat,
    Escape,
}

/// Aggregated victory rewards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewards {
    pub exp: i32,
    pub gold: i32,
    pub items: Vec<u16>,
}

impl Rewards {
    /// Sum rewards over the troop and roll item drops. Hidden enemies
    /// never joined the battle and contribute nothing.
    #[must_use]
    pub fn collect(roster: &Roster, rng: &mut BattleRng) -> Self {
        let mut rewards = Rewards::default();
        for enemy in roster.side(Side::Enemy) {
            if enemy.hidden {
                continue;
            }
            let Some(reward) = &enemy.reward else {
                continue;
            };
            rewards.exp += reward.exp;
            rewards.gold += reward.gold;
            for drop in &reward.drops {
                if drop.chance >= 1.0 || rng.gen_bool(drop.chance.clamp(0.0, 1.0)) {
                    rewards.items.push(drop.item_id);
                }
            }
        }
        debug!(exp = rewards.exp, gold = rewards.gold, items = rewards.items.len(), "rewards collected");
        rewards
    }

    /// Render the reward message lines in fixed order: experience,
    /// gold, then one line per item. Zero amounts produce no line.
    #[must_use]
    pub fn lines(&self, terms: &Terms) -> Vec<String> {
        let mut lines = Vec::new();
        if self.exp > 0 {
            lines.push(format!("{}{}", self.exp, terms.exp_received));
        }
        if self.gold > 0 {
            lines.push(format!(
                "{}{}{}",
                terms.gold_received_prefix, self.gold, terms.gold_received_suffix
            ));
        }
        for item_id in &self.items {
            lines.push(format!("Item {}{}", item_id, terms.item_received));
        }
        lines
    }

    /// Apply the rewards exactly once: experience to every surviving
    /// party member, gold and items to the shared pools.
    pub fn apply(&self, roster: &Roster, sink: &mut dyn RewardSink) {
        if self.exp > 0 {
            for ally in roster.active_on(Side::Ally) {
                sink.gain_exp(ally.id, self.exp);
            }
        }
        if self.gold > 0 {
            sink.gain_gold(self.gold);
        }
        for &item_id in &self.items {
            sink.add_item(item_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Combatant, CombatantId, DropEntry, EnemyReward};
    use smallvec::smallvec;

    struct RecRewards {
        exp: Vec<(CombatantId, i32)>,
        gold: i32,
        items: Vec<u16>,
    }

    impl RewardSink for RecRewards {
        fn gain_exp(&mut self, id: CombatantId, amount: i32) {
            self.exp.push((id, amount));
        }
        fn gain_gold(&mut self, amount: i32) {
            self.gold += amount;
        }
        fn add_item(&mut self, item_id: u16) {
            self.items.push(item_id);
        }
    }

    fn roster() -> Roster {
        let mut enemies = vec![
            Combatant::new(CombatantId::enemy(0), "Slime", 30, 40),
            Combatant::new(CombatantId::enemy(1), "Bat", 20, 70),
        ];
        enemies[0].reward = Some(EnemyReward {
            exp: 30,
            gold: 20,
            drops: smallvec![DropEntry {
                item_id: 7,
                chance: 1.0
            }],
        });
        enemies[1].reward = Some(EnemyReward {
            exp: 20,
            gold: 0,
            drops: smallvec![],
        });
        Roster::new(
            vec![
                Combatant::new(CombatantId::ally(0), "Aluxes", 100, 50),
                Combatant::new(CombatantId::ally(1), "Hilda", 80, 60),
            ],
            enemies,
        )
    }

    #[test]
    fn test_collect_sums_troop() {
        let r = roster();
        let mut rng = BattleRng::new(1);
        let rewards = Rewards::collect(&r, &mut rng);
        assert_eq!(rewards.exp, 50);
        assert_eq!(rewards.gold, 20);
        assert_eq!(rewards.items, vec![7]);
    }

    #[test]
    fn test_collect_skips_hidden() {
        let mut r = roster();
        r.get_mut(CombatantId::enemy(0)).unwrap().hidden = true;
        let mut rng = BattleRng::new(1);
        let rewards = Rewards::collect(&r, &mut rng);
        assert_eq!(rewards.exp, 20);
        assert_eq!(rewards.gold, 0);
        assert!(rewards.items.is_empty());
    }

    #[test]
    fn test_lines_in_order_omitting_zeros() {
        let terms = Terms::default();
        let rewards = Rewards {
            exp: 50,
            gold: 20,
            items: vec![7],
        };
        let lines = rewards.lines(&terms);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "50 exp");
        assert_eq!(lines[1], "20 gold");
        assert_eq!(lines[2], "Item 7 received");

        let no_gold = Rewards {
            exp: 50,
            gold: 0,
            items: vec![],
        };
        assert_eq!(no_gold.lines(&terms), vec!["50 exp".to_string()]);
    }

    #[test]
    fn test_apply_exp_to_survivors_only() {
        let mut r = roster();
        r.get_mut(CombatantId::ally(1)).unwrap().hp = 0;
        let rewards = Rewards {
            exp: 50,
            gold: 20,
            items: vec![7],
        };
        let mut sink = RecRewards {
            exp: Vec::new(),
            gold: 0,
            items: Vec::new(),
        };
        rewards.apply(&r, &mut sink);

        assert_eq!(sink.exp, vec![(CombatantId::ally(0), 50)]);
        assert_eq!(sink.gold, 20);
        assert_eq!(sink.items, vec![7]);
    }
}
