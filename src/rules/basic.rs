//! A minimal reference rule set.
//!
//! Not tuned for play balance; exists so the engine can run end to end
//! (and be tested) without an external formula pack.

use crate::core::{
    ActionVerb, BattleAction, BattleRng, Combatant, HitOutcome, Roster, Side,
};

use super::engine::CombatRules;

/// Agility-driven formulas with flat hit and crit chances.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicRules;

impl BasicRules {
    const HIT_CHANCE: f64 = 0.9;
    const CRIT_CHANCE: f64 = 1.0 / 32.0;

    fn base_damage(source: &Combatant, target: &Combatant) -> i32 {
        (source.agility / 2 - target.agility / 4).max(1)
    }

    fn average_agility(roster: &Roster, side: Side) -> f64 {
        let mut sum = 0i64;
        let mut count = 0i64;
        for c in roster.active_on(side) {
            sum += i64::from(c.agility);
            count += 1;
        }
        if count == 0 {
            1.0
        } else {
            (sum as f64 / count as f64).max(1.0)
        }
    }
}

impl CombatRules for BasicRules {
    fn execute_hit(
        &self,
        action: &BattleAction,
        source: &Combatant,
        target: &Combatant,
        rng: &mut BattleRng,
    ) -> HitOutcome {
        match action.verb {
            ActionVerb::Attack | ActionVerb::Skill => {
                if !rng.gen_bool(Self::HIT_CHANCE) {
                    return HitOutcome {
                        success: false,
                        ..HitOutcome::default()
                    };
                }
                let critical = rng.gen_bool(Self::CRIT_CHANCE);
                let mut damage = Self::base_damage(source, target);
                if critical {
                    damage *= 3;
                }
                HitOutcome {
                    success: true,
                    critical,
                    affected_hp: Some(-damage),
                    ..HitOutcome::default()
                }
            }
            ActionVerb::Item => HitOutcome {
                success: true,
                affected_hp: Some(target.max_hp / 2),
                positive: true,
                ..HitOutcome::default()
            },
            // Defend, row changes and no-ops have no per-target effect.
            _ => HitOutcome {
                success: true,
                ..HitOutcome::default()
            },
        }
    }

    fn escape_chance(&self, roster: &Roster, attempts: u32) -> f64 {
        let enemy_agi = Self::average_agility(roster, Side::Enemy);
        let ally_agi = Self::average_agility(roster, Side::Ally);
        let base = 1.5 - enemy_agi / ally_agi;
        (base + 0.1 * f64::from(attempts)).clamp(0.0, 1.0)
    }

    fn select_enemy_action(
        &self,
        enemy: &Combatant,
        roster: &Roster,
        rng: &mut BattleRng,
    ) -> Option<BattleAction> {
        let target = roster.random_active(Side::Ally, rng)?;
        Some(BattleAction::attack(enemy.id, target))
    }

    fn select_auto_action(
        &self,
        ally: &Combatant,
        roster: &Roster,
        rng: &mut BattleRng,
    ) -> Option<BattleAction> {
        let target = roster.random_active(Side::Enemy, rng)?;
        Some(BattleAction::attack(ally.id, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CombatantId;

    fn roster() -> Roster {
        Roster::new(
            vec![Combatant::new(CombatantId::ally(0), "Aluxes", 100, 80)],
            vec![Combatant::new(CombatantId::enemy(0), "Slime", 30, 40)],
        )
    }

    #[test]
    fn test_attack_deals_at_least_one() {
        let r = roster();
        let mut rng = BattleRng::new(1);
        let source = r.get(CombatantId::enemy(0)).unwrap();
        let target = r.get(CombatantId::ally(0)).unwrap();
        let action = BattleAction::attack(source.id, target.id);
        // Drive until a hit lands; damage is never zero on success.
        for _ in 0..20 {
            let outcome = BasicRules.execute_hit(&action, source, target, &mut rng);
            if outcome.success {
                assert!(outcome.affected_hp.unwrap() <= -1);
                return;
            }
        }
        panic!("no hit in 20 rolls");
    }

    #[test]
    fn test_escape_chance_rises_with_attempts() {
        let r = roster();
        let base = BasicRules.escape_chance(&r, 0);
        let retry = BasicRules.escape_chance(&r, 3);
        assert!(retry >= base);
        assert!((0.0..=1.0).contains(&base));
        assert!((0.0..=1.0).contains(&retry));
    }

    #[test]
    fn test_enemy_targets_ally() {
        let r = roster();
        let mut rng = BattleRng::new(5);
        let enemy = r.get(CombatantId::enemy(0)).unwrap();
        let action = BasicRules.select_enemy_action(enemy, &r, &mut rng).unwrap();
        assert_eq!(action.verb, ActionVerb::Attack);
        assert_eq!(action.targets[0].side, Side::Ally);
    }

    #[test]
    fn test_no_selection_without_targets() {
        let mut r = roster();
        r.get_mut(CombatantId::ally(0)).unwrap().hp = 0;
        let mut rng = BattleRng::new(5);
        let enemy = r.get(CombatantId::enemy(0)).unwrap();
        assert!(BasicRules.select_enemy_action(enemy, &r, &mut rng).is_none());
    }
}
