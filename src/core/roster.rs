//! The battle roster: party and troop, with the lookup and visibility
//! queries the rest of the engine is built on.

use serde::{Deserialize, Serialize};

use super::combatant::{Combatant, CombatantId, Row, Side};
use super::condition::BattleCondition;
use super::rng::BattleRng;

/// Party (allies) and troop (enemies) for one encounter.
///
/// Combatants are never removed: death or hiding excludes them from the
/// `exists()` queries while keeping identities stable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Roster {
    allies: Vec<Combatant>,
    enemies: Vec<Combatant>,
}

impl Roster {
    #[must_use]
    pub fn new(allies: Vec<Combatant>, enemies: Vec<Combatant>) -> Self {
        Self { allies, enemies }
    }

    // === Lookup ===

    /// Find a combatant. Missing indices yield `None`, never a panic.
    #[must_use]
    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.side(id.side).get(id.index as usize)
    }

    #[must_use]
    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.side_mut(id.side).get_mut(id.index as usize)
    }

    #[must_use]
    pub fn side(&self, side: Side) -> &[Combatant] {
        match side {
            Side::Ally => &self.allies,
            Side::Enemy => &self.enemies,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut Vec<Combatant> {
        match side {
            Side::Ally => &mut self.allies,
            Side::Enemy => &mut self.enemies,
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &Combatant> {
        self.allies.iter().chain(self.enemies.iter())
    }

    pub fn all_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.allies.iter_mut().chain(self.enemies.iter_mut())
    }

    /// All combatants currently taking part in the battle.
    pub fn active(&self) -> impl Iterator<Item = &Combatant> {
        self.all().filter(|c| c.exists())
    }

    pub fn active_on(&self, side: Side) -> impl Iterator<Item = &Combatant> {
        self.side(side).iter().filter(|c| c.exists())
    }

    // === Visibility counts ===

    #[must_use]
    pub fn visible_count(&self, side: Side) -> usize {
        self.active_on(side).count()
    }

    #[must_use]
    pub fn any_active(&self, side: Side) -> bool {
        self.active_on(side).next().is_some()
    }

    /// A uniformly random active combatant on the given side.
    #[must_use]
    pub fn random_active(&self, side: Side, rng: &mut BattleRng) -> Option<CombatantId> {
        let ids: Vec<CombatantId> = self.active_on(side).map(|c| c.id).collect();
        rng.choose(&ids).copied()
    }

    // === Battle-start setup ===

    /// Force every actor to the front row when no front-row actor can
    /// take part; otherwise a back-row-only party would stall forever.
    pub fn force_front_row_if_needed(&mut self) {
        let front_viable = self
            .allies
            .iter()
            .any(|a| a.row == Row::Front && a.participates());
        if !front_viable {
            for ally in &mut self.allies {
                ally.row = Row::Front;
            }
        }
    }

    /// Whether the combatant may switch rows: already in the back row,
    /// or at least two front-row members so the front line survives.
    #[must_use]
    pub fn row_change_allowed(&self, id: CombatantId) -> bool {
        let Some(combatant) = self.get(id) else {
            return false;
        };
        if combatant.row == Row::Back {
            return true;
        }
        self.allies
            .iter()
            .filter(|a| a.row == Row::Front && a.participates())
            .count()
            >= 2
    }

    /// Set initial facing per the resolved battle condition. Allies
    /// normally face left toward the troop, enemies right. `Back` turns
    /// a side around; the surrounding conditions alternate the flip by
    /// visible index so units face in from both flanks.
    pub fn init_facing(&mut self, condition: BattleCondition) {
        let flip_all = condition == BattleCondition::Back;
        let alternates = condition.alternates_facing();
        for side in [Side::Ally, Side::Enemy] {
            let mut visible_index = 0usize;
            for combatant in self.side_mut(side) {
                combatant.facing_flipped = if flip_all {
                    true
                } else if alternates && combatant.exists() {
                    visible_index += 1;
                    (visible_index - 1) % 2 == 1
                } else {
                    false
                };
            }
        }
    }

    /// Turn `source` to face `target` based on their x-positions.
    /// Allies face left by default, enemies right.
    pub fn face_target(&mut self, source: CombatantId, target: CombatantId) {
        let Some(target_x) = self.get(target).map(|t| t.position.x) else {
            return;
        };
        if let Some(src) = self.get_mut(source) {
            src.facing_flipped = match src.id.side {
                Side::Ally => target_x > src.position.x,
                Side::Enemy => target_x < src.position.x,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::combatant::Position;

    fn roster() -> Roster {
        let mut allies = vec![
            Combatant::new(CombatantId::ally(0), "Aluxes", 100, 50),
            Combatant::new(CombatantId::ally(1), "Hilda", 80, 60),
        ];
        allies[0].position = Position::new(200, 100);
        allies[1].position = Position::new(210, 120);
        let mut enemies = vec![
            Combatant::new(CombatantId::enemy(0), "Slime", 30, 40),
            Combatant::new(CombatantId::enemy(1), "Bat", 20, 70),
        ];
        enemies[0].position = Position::new(60, 100);
        enemies[1].position = Position::new(70, 130);
        Roster::new(allies, enemies)
    }

    #[test]
    fn test_lookup_missing_is_none() {
        let r = roster();
        assert!(r.get(CombatantId::ally(0)).is_some());
        assert!(r.get(CombatantId::ally(9)).is_none());
        assert!(r.get(CombatantId::enemy(9)).is_none());
    }

    #[test]
    fn test_visible_count_ignores_dead_and_hidden() {
        let mut r = roster();
        assert_eq!(r.visible_count(Side::Enemy), 2);
        r.get_mut(CombatantId::enemy(0)).unwrap().hp = 0;
        r.get_mut(CombatantId::enemy(1)).unwrap().hidden = true;
        assert_eq!(r.visible_count(Side::Enemy), 0);
        assert!(!r.any_active(Side::Enemy));
        assert!(r.any_active(Side::Ally));
    }

    #[test]
    fn test_force_front_row() {
        let mut r = roster();
        for ally in r.side_mut(Side::Ally) {
            ally.row = Row::Back;
        }
        r.force_front_row_if_needed();
        assert!(r.side(Side::Ally).iter().all(|a| a.row == Row::Front));
    }

    #[test]
    fn test_front_row_kept_when_viable() {
        let mut r = roster();
        r.get_mut(CombatantId::ally(1)).unwrap().row = Row::Back;
        r.force_front_row_if_needed();
        assert_eq!(r.get(CombatantId::ally(1)).unwrap().row, Row::Back);
    }

    #[test]
    fn test_row_change_eligibility() {
        let mut r = roster();
        // Two viable front-row members: either may step back.
        assert!(r.row_change_allowed(CombatantId::ally(0)));
        r.get_mut(CombatantId::ally(1)).unwrap().row = Row::Back;
        // Last front-row member may not leave the front line.
        assert!(!r.row_change_allowed(CombatantId::ally(0)));
        // Back-row members may always return to the front.
        assert!(r.row_change_allowed(CombatantId::ally(1)));
    }

    #[test]
    fn test_facing_back_condition_flips_everyone() {
        let mut r = roster();
        r.init_facing(BattleCondition::Back);
        assert!(r.all().all(|c| c.facing_flipped));
        r.init_facing(BattleCondition::None);
        assert!(r.all().all(|c| !c.facing_flipped));
    }

    #[test]
    fn test_facing_alternates_under_surround() {
        let mut r = roster();
        r.init_facing(BattleCondition::Surround);
        assert!(!r.get(CombatantId::ally(0)).unwrap().facing_flipped);
        assert!(r.get(CombatantId::ally(1)).unwrap().facing_flipped);
    }

    #[test]
    fn test_face_target() {
        let mut r = roster();
        // Enemy is at lower x: ally keeps default facing.
        r.face_target(CombatantId::ally(0), CombatantId::enemy(0));
        assert!(!r.get(CombatantId::ally(0)).unwrap().facing_flipped);
        // Ally is at higher x: enemy keeps default facing too.
        r.face_target(CombatantId::enemy(0), CombatantId::ally(0));
        assert!(!r.get(CombatantId::enemy(0)).unwrap().facing_flipped);
    }

    #[test]
    fn test_random_active() {
        let r = roster();
        let mut rng = BattleRng::new(7);
        let id = r.random_active(Side::Enemy, &mut rng);
        assert!(matches!(id, Some(CombatantId { side: Side::Enemy, .. })));
        let mut empty = roster();
        for e in empty.side_mut(Side::Enemy) {
            e.hp = 0;
        }
        assert!(empty.random_active(Side::Enemy, &mut rng).is_none());
    }
}
