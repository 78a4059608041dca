//! Integration tests for end-of-battle resolution.

mod common;

use atb_battle::core::{BattleConfig, CombatantId, DropEntry, EnemyReward};
use atb_battle::outcome::BattleResult;
use smallvec::smallvec;

use common::{duel_roster, run_until, scene_with, NoInput, TestRules};

fn dead_troop_roster() -> atb_battle::core::Roster {
    let mut roster = duel_roster();
    roster.get_mut(CombatantId::enemy(0)).unwrap().hp = 0;
    roster.get_mut(CombatantId::enemy(1)).unwrap().hp = 0;
    roster
}

#[test]
fn test_reward_lines_follow_fixed_order() {
    let (mut scene, mocks) =
        scene_with(dead_troop_roster(), BattleConfig::new(), TestRules::default());
    run_until(&mut scene, &NoInput, 100, |s| s.is_over());
    assert_eq!(scene.result(), Some(BattleResult::Victory));

    let lines = mocks.messages.borrow().lines.clone();
    let victory_at = lines.iter().position(|l| l == "Victory!").unwrap();
    assert_eq!(
        &lines[victory_at + 1..victory_at + 4],
        &[
            "50 exp".to_string(),
            "20 gold".to_string(),
            "Item 7 received".to_string()
        ]
    );
}

#[test]
fn test_zero_amounts_render_no_line() {
    let mut roster = dead_troop_roster();
    // Strip the troop down to experience only.
    roster.get_mut(CombatantId::enemy(0)).unwrap().reward = Some(EnemyReward {
        exp: 30,
        gold: 0,
        drops: smallvec![],
    });
    let (mut scene, mocks) = scene_with(roster, BattleConfig::new(), TestRules::default());
    run_until(&mut scene, &NoInput, 100, |s| s.is_over());

    let lines = mocks.messages.borrow().lines.clone();
    assert!(lines.contains(&"50 exp".to_string()));
    assert!(!lines.iter().any(|l| l.contains("gold")));
    assert!(!lines.iter().any(|l| l.contains("Item")));
}

#[test]
fn test_rewards_applied_exactly_once() {
    let (mut scene, mocks) =
        scene_with(dead_troop_roster(), BattleConfig::new(), TestRules::default());
    run_until(&mut scene, &NoInput, 100, |s| s.is_over());

    let rewards = mocks.rewards.borrow();
    // Gold and items once, regardless of party size.
    assert_eq!(rewards.gold, 20);
    assert_eq!(rewards.items, vec![7]);
    // Experience once per surviving member.
    assert_eq!(rewards.exp.len(), 2);
    assert!(rewards.exp.iter().all(|(_, amount)| *amount == 50));
}

#[test]
fn test_exp_goes_to_survivors_only() {
    let mut roster = dead_troop_roster();
    roster.get_mut(CombatantId::ally(1)).unwrap().hp = 0;
    let (mut scene, mocks) = scene_with(roster, BattleConfig::new(), TestRules::default());
    run_until(&mut scene, &NoInput, 100, |s| s.is_over());

    let rewards = mocks.rewards.borrow();
    assert_eq!(rewards.exp, vec![(CombatantId::ally(0), 50)]);
}

#[test]
fn test_zero_chance_drop_never_appears() {
    let mut roster = dead_troop_roster();
    roster.get_mut(CombatantId::enemy(0)).unwrap().reward = Some(EnemyReward {
        exp: 30,
        gold: 20,
        drops: smallvec![DropEntry {
            item_id: 7,
            chance: 0.0
        }],
    });
    let (mut scene, mocks) = scene_with(roster, BattleConfig::new(), TestRules::default());
    run_until(&mut scene, &NoInput, 100, |s| s.is_over());

    assert!(mocks.rewards.borrow().items.is_empty());
}
