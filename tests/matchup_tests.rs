use pokemon_battle_engine::ai::{HeuristicChooser, RandomChooser};
use pokemon_battle_engine::battle::{BattleOptions, Outcome, Side};
use pokemon_battle_engine::dex::Dex;
use pokemon_battle_engine::env::{BattleEnv, WIN_REWARD};
use pokemon_battle_engine::error::BattleError;
use pokemon_battle_engine::matchup::{run_matchup, simulate_battle};
use pokemon_battle_engine::model::{Combatant, CombatantInput, FlatFields, TypeList};
use pokemon_battle_engine::registry::BattleRegistry;
use pokemon_battle_engine::source::{load_combatant, Roster};

fn make_mon(name: &str, hp: u32, attack: u32, speed: u32) -> Combatant {
    CombatantInput::Flat(FlatFields {
        name: Some(name.to_string()),
        types: TypeList::One("normal".to_string()),
        hp: Some(hp as f64),
        attack: Some(attack),
        defense: Some(60),
        speed: Some(speed),
        available_moves: vec!["tackle".to_string()],
        ..FlatFields::default()
    })
    .normalize()
    .unwrap()
}

#[test]
fn simulate_battle_is_reproducible() {
    let roster = Roster::standard();
    let charizard = load_combatant(&roster, "charizard").unwrap();
    let venusaur = load_combatant(&roster, "venusaur").unwrap();
    let run = || {
        let mut p1 = RandomChooser::new(1);
        let mut p2 = RandomChooser::new(2);
        simulate_battle(
            Dex::shared(),
            charizard.clone(),
            venusaur.clone(),
            &mut p1,
            &mut p2,
            99,
            BattleOptions::default(),
        )
    };
    let first = run();
    let second = run();
    assert_eq!(first.turns, second.turns);
    assert_eq!(first.final_state, second.final_state);
    assert_eq!(first.outcome, second.outcome);
    assert!(first.turns.len() as u32 <= BattleOptions::default().max_turns);
}

#[test]
fn simulate_battle_respects_turn_cap() {
    let wall_a = make_mon("WallA", 999, 1, 50);
    let wall_b = make_mon("WallB", 999, 1, 40);
    let options = BattleOptions {
        max_turns: 5,
        ..BattleOptions::default()
    };
    let mut p1 = RandomChooser::new(3);
    let mut p2 = HeuristicChooser::new(4, 0.0);
    let report = simulate_battle(Dex::shared(), wall_a, wall_b, &mut p1, &mut p2, 5, options);
    assert_eq!(report.turns.len(), 5);
    assert_eq!(report.outcome, None);
    assert_eq!(report.final_state.turn, 5);
}

#[test]
fn matchup_counts_every_battle_and_is_deterministic() {
    let roster = Roster::standard();
    let pikachu = load_combatant(&roster, "pikachu").unwrap();
    let blastoise = load_combatant(&roster, "blastoise").unwrap();
    let options = BattleOptions::default();
    let first = run_matchup(Dex::shared(), &pikachu, &blastoise, 64, 11, options);
    let second = run_matchup(Dex::shared(), &pikachu, &blastoise, 64, 11, options);
    assert_eq!(first, second);
    assert_eq!(first.battles, 64);
    assert_eq!(
        first.p1_wins + first.p2_wins + first.draws + first.unfinished,
        64
    );
    let rate = first.win_rate();
    assert!((0.0..=1.0).contains(&rate));
}

#[test]
fn overwhelming_attacker_always_wins() {
    let brute = make_mon("Brute", 200, 255, 150);
    let weakling = make_mon("Weakling", 30, 10, 10);
    let summary = run_matchup(Dex::shared(), &brute, &weakling, 32, 1, BattleOptions::default());
    assert_eq!(summary.p1_wins, 32);
    assert_eq!(summary.win_rate(), 1.0);
}

#[test]
fn env_rewards_the_winning_step() {
    let brute = make_mon("Brute", 300, 255, 200);
    let weakling = make_mon("Weakling", 50, 10, 10);
    let mut env = BattleEnv::new(
        Dex::shared(),
        brute,
        weakling,
        RandomChooser::new(8),
        21,
        BattleOptions::default(),
    );
    let obs = env.reset();
    assert_eq!(obs.p1_hp, 1.0);
    assert_eq!(obs.turn, 0);

    let step = env.step("not a real move").unwrap();
    assert!(step.done);
    assert!(step.reward > WIN_REWARD);
    assert!(matches!(
        step.outcome,
        Some(Outcome::Winner { side: Side::P1, .. })
    ));
    assert_eq!(step.observation.p2_hp, 0.0);
    assert!(matches!(env.step("tackle"), Err(BattleError::EpisodeOver)));

    let obs = env.reset();
    assert_eq!(obs.p2_hp, 1.0);
    assert!(!env.is_done());
}

#[test]
fn env_penalizes_losses() {
    let weakling = make_mon("Weakling", 20, 10, 10);
    let brute = make_mon("Brute", 300, 255, 200);
    let mut env = BattleEnv::new(
        Dex::shared(),
        weakling,
        brute,
        RandomChooser::new(9),
        22,
        BattleOptions::default(),
    );
    let step = env.step("tackle").unwrap();
    assert!(step.done);
    assert!(step.reward < -WIN_REWARD + 1.0);
}

#[test]
fn registry_runs_battles_in_parallel() {
    let registry = BattleRegistry::new(Dex::shared(), BattleOptions::default());
    let ids: Vec<_> = (0..4)
        .map(|i| {
            registry.create(
                make_mon("Left", 120, 90, 60 + i),
                make_mon("Right", 120, 90, 50),
                i as u64,
            )
        })
        .collect();
    std::thread::scope(|scope| {
        for &id in &ids {
            let registry = &registry;
            scope.spawn(move || {
                for _ in 0..30 {
                    if registry.winner(id).unwrap().is_some() {
                        break;
                    }
                    registry.play_turn(id, "tackle", "tackle").unwrap();
                }
            });
        }
    });
    for id in ids {
        let winner = registry.winner(id).unwrap().unwrap();
        match registry.play_turn(id, "tackle", "tackle") {
            Err(BattleError::BattleEnded { outcome, .. }) => assert_eq!(outcome, winner),
            other => panic!("expected ended battle, got {other:?}"),
        }
    }
}
