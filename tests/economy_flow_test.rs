//! End-to-end economy flows through the engine facade

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

use greenhouse::{
    catalog::ItemSlot,
    logging::RewardLogger,
    progression::{DayClock, Difficulty, PlantStage},
    services::PlacedItemInput,
    store::{GardenStore, InMemoryGardenStore},
    EngineConfig, ErrorCategory, Greenhouse, GreenhouseError,
};

fn engine() -> (Greenhouse, Arc<InMemoryGardenStore>) {
    engine_with(EngineConfig::default())
}

fn engine_with(config: EngineConfig) -> (Greenhouse, Arc<InMemoryGardenStore>) {
    let store = Arc::new(InMemoryGardenStore::new());
    let engine = Greenhouse::new(
        store.clone(),
        config,
        RewardLogger::new("integration".to_string()),
    );
    (engine, store)
}

fn day(d: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, d, hour, 0, 0).unwrap()
}

#[tokio::test]
async fn test_week_of_habits_grows_plant_and_streak() {
    let (engine, _store) = engine();
    let user = engine
        .register_gardener("rowan@example.com", Some("Rowan"), "hash")
        .await
        .unwrap();
    let user_id = user._id.unwrap();
    engine.setup_plant(&user_id, "fern").await.unwrap();

    let habit = engine
        .create_habit(&user_id, "Meditate", Some(Difficulty::Hard))
        .await
        .unwrap();
    let habit_id = habit._id.unwrap();

    let mut stages = Vec::new();
    for d in 13..=17 {
        engine.run_daily_reset(day(d, 0)).await.unwrap();
        let done = engine
            .complete_habit(&user_id, &habit_id, day(d, 9))
            .await
            .unwrap();
        assert!(!done.already_completed);
        stages.push(done.plant_stage);
    }

    // 30 xp a day: 30, 60, 90, 120, 150
    assert_eq!(stages, vec![1, 2, 2, 3, 3]);

    let profile = engine.get_profile(&user_id, day(17, 20)).await.unwrap();
    assert_eq!(profile.plant_type, "fern");
    assert_eq!(profile.growth, PlantStage::Bloom);
    assert_eq!(profile.xp, 150);
    assert_eq!(profile.coins, 25);
    assert_eq!(profile.streak, 5);

    // Two days later the streak reads as broken but is still stored
    let later = engine.get_profile(&user_id, day(19, 12)).await.unwrap();
    assert_eq!(later.streak, 0);
    let stats = engine.get_stats(&user_id).await.unwrap();
    assert_eq!(stats.streak, 5);
    assert_eq!(stats.total_habits, 5);
    assert_eq!(stats.history.len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rewards_landing_together_all_count() {
    let (engine, store) = engine();
    let user_id = engine
        .register_gardener("rowan@example.com", None, "hash")
        .await
        .unwrap()
        ._id
        .unwrap();
    let mut habit_ids = Vec::new();
    for title in ["Run", "Read", "Stretch", "Journal"] {
        habit_ids.push(
            engine
                .create_habit(&user_id, title, Some(Difficulty::Medium))
                .await
                .unwrap()
                ._id
                .unwrap(),
        );
    }

    let mut handles = Vec::new();
    for habit_id in habit_ids {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.complete_habit(&user_id, &habit_id, day(15, 9)).await.map(|_| ())
        }));
    }
    let challenge_engine = engine.clone();
    handles.push(tokio::spawn(async move {
        challenge_engine.complete_challenge(&user_id, day(15, 9)).await.map(|_| ())
    }));
    let focus_engine = engine.clone();
    handles.push(tokio::spawn(async move {
        focus_engine
            .complete_focus_session(&user_id, 30.0, day(15, 9))
            .await
            .map(|_| ())
    }));
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // 4 x 20 habit xp, 50 challenge xp, 15 focus xp
    let user = store.find_user(&user_id).await.unwrap().unwrap();
    assert_eq!(user.xp, 80 + 50 + 15);
    assert_eq!(user.coins, 4 * 5 + 50 + 30);
    assert!(user.last_challenge_completed.is_some());
    let stats = engine.get_stats(&user_id).await.unwrap();
    assert_eq!(stats.total_habits, 4);
}

#[tokio::test]
async fn test_habit_completion_is_idempotent_within_a_day() {
    let (engine, _store) = engine();
    let user_id = engine
        .register_gardener("rowan@example.com", None, "hash")
        .await
        .unwrap()
        ._id
        .unwrap();
    let habit_id = engine
        .create_habit(&user_id, "Floss", None)
        .await
        .unwrap()
        ._id
        .unwrap();

    let first = engine
        .complete_habit(&user_id, &habit_id, day(15, 8))
        .await
        .unwrap();
    let second = engine
        .complete_habit(&user_id, &habit_id, day(15, 21))
        .await
        .unwrap();

    assert!(second.already_completed);
    assert_eq!((first.xp, first.coins, first.plant_stage), (second.xp, second.coins, second.plant_stage));
}

#[tokio::test]
async fn test_concurrent_first_request_of_day_shares_challenge() {
    let (engine, store) = engine();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.today_challenge(day(16, 0)).await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap()._id.unwrap());
    }
    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(store.challenge_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_challenge_claims_pay_once() {
    let (engine, store) = engine();
    let user_id = engine
        .register_gardener("rowan@example.com", None, "hash")
        .await
        .unwrap()
        ._id
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.complete_challenge(&user_id, day(15, 12)).await
        }));
    }
    let mut granted = 0;
    for handle in handles {
        if !handle.await.unwrap().unwrap().already_completed {
            granted += 1;
        }
    }

    assert_eq!(granted, 1);
    let user = store.find_user(&user_id).await.unwrap().unwrap();
    assert_eq!(user.xp, 50);
    assert_eq!(user.coins, 50);
}

#[tokio::test]
async fn test_focus_earnings_buy_and_place_decor() {
    let (engine, store) = engine();
    let user_id = engine
        .register_gardener("rowan@example.com", None, "hash")
        .await
        .unwrap()
        ._id
        .unwrap();

    let outcome = engine
        .complete_focus_session(&user_id, 25.0, day(15, 10))
        .await
        .unwrap();
    assert_eq!((outcome.coins_earned, outcome.xp_earned), (25, 12));

    // 25 coins is not enough for the 50-coin pot
    let err = engine.buy_item(&user_id, "pot_ceramic").await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Rejected);
    let user = store.find_user(&user_id).await.unwrap().unwrap();
    assert_eq!(user.coins, 25);
    assert!(user.inventory.is_empty());

    engine
        .complete_focus_session(&user_id, 90.0, day(15, 14))
        .await
        .unwrap();
    let purchase = engine.buy_item(&user_id, "decor_frog").await.unwrap();
    assert_eq!(purchase.new_balance, 15);

    let equipped = engine
        .equip_item(&user_id, "decor_frog", ItemSlot::Decor)
        .await
        .unwrap();
    assert_eq!(equipped.decor, "decor_frog");

    let placed = engine
        .update_garden(
            &user_id,
            vec![PlacedItemInput {
                item_id: "decor_frog".into(),
                instance_id: "frog-1".into(),
                x: 12.5,
                y: 80.0,
                scale: Some(1.2),
                rotation: Some(15.0),
            }],
        )
        .await
        .unwrap();
    assert_eq!(placed.len(), 1);

    let stats = engine.get_stats(&user_id).await.unwrap();
    assert_eq!(stats.total_focus_minutes, 115.0);
    assert_eq!(stats.history.len(), 1);
    assert_eq!(stats.history[0].xp_gained, 12 + 45);
}

#[tokio::test]
async fn test_reset_progress_keeps_economy() {
    let (engine, store) = engine();
    let user_id = engine
        .register_gardener("rowan@example.com", None, "hash")
        .await
        .unwrap()
        ._id
        .unwrap();
    let habit_id = engine
        .create_habit(&user_id, "Run", Some(Difficulty::Hard))
        .await
        .unwrap()
        ._id
        .unwrap();
    engine
        .complete_habit(&user_id, &habit_id, day(15, 7))
        .await
        .unwrap();
    engine
        .complete_focus_session(&user_id, 60.0, day(15, 8))
        .await
        .unwrap();
    engine.buy_item(&user_id, "decor_stones").await.unwrap_err();
    engine.buy_item(&user_id, "bg_night").await.unwrap();

    let snapshot = engine.reset_progress(&user_id).await.unwrap();
    assert_eq!((snapshot.xp, snapshot.plant_stage, snapshot.streak), (0, 0, 0));

    let user = store.find_user(&user_id).await.unwrap().unwrap();
    assert_eq!(user.coins, 5 + 60 - 5);
    assert_eq!(user.inventory, vec!["bg_night".to_string()]);
    assert_eq!(engine.list_habits(&user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_local_offset_decides_the_day() {
    // UTC+10: 20:00 UTC on the 15th is already the 16th locally
    let (engine, _store) = engine_with(EngineConfig {
        clock: DayClock::from_offset_minutes(600).unwrap(),
        ..EngineConfig::default()
    });
    let user_id = engine
        .register_gardener("rowan@example.com", None, "hash")
        .await
        .unwrap()
        ._id
        .unwrap();

    let challenge = engine.today_challenge(day(15, 20)).await.unwrap();
    assert_eq!(challenge.date, "2024-05-16");

    engine.complete_challenge(&user_id, day(15, 13)).await.unwrap();
    let next_local_day = engine
        .complete_challenge(&user_id, day(15, 20))
        .await
        .unwrap();
    assert!(!next_local_day.already_completed);
    assert_eq!(next_local_day.xp, 100);
}

#[tokio::test]
async fn test_unknown_user_is_not_found_everywhere() {
    let (engine, _store) = engine();
    let ghost = bson::oid::ObjectId::new();

    let errors: Vec<GreenhouseError> = vec![
        engine.complete_challenge(&ghost, day(15, 9)).await.unwrap_err(),
        engine.complete_focus_session(&ghost, 10.0, day(15, 9)).await.unwrap_err(),
        engine.get_stats(&ghost).await.unwrap_err(),
        engine.reset_progress(&ghost).await.unwrap_err(),
        engine.buy_item(&ghost, "pot_ceramic").await.unwrap_err(),
        engine.equip_item(&ghost, "pot_neon", ItemSlot::Pot).await.unwrap_err(),
        engine.update_garden(&ghost, Vec::new()).await.unwrap_err(),
    ];
    for err in errors {
        assert_eq!(err.category(), ErrorCategory::NotFound, "{}", err);
    }
}
