//! Concurrent writers to the same user and day must not lose each other's fields.

mod common;

use common::{harness, ScriptedCompletion};
use health_log_core::domain::{Mood, Presence};
use health_log_core::{DailyLogUpdate, NewMeal};
use uuid::Uuid;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn mood_and_energy_written_together_both_survive() {
    let h = harness(ScriptedCompletion::answering("ok"));

    for _ in 0..20 {
        let user = Uuid::new_v4();
        let mood_writer = {
            let service = h.service.clone();
            tokio::spawn(async move {
                service
                    .merge_update(
                        user,
                        DailyLogUpdate {
                            mood: Presence::Value(Mood::VeryHappy),
                            ..DailyLogUpdate::default()
                        },
                    )
                    .await
            })
        };
        let energy_writer = {
            let service = h.service.clone();
            tokio::spawn(async move {
                service
                    .merge_update(
                        user,
                        DailyLogUpdate {
                            energy: Some(9),
                            ..DailyLogUpdate::default()
                        },
                    )
                    .await
            })
        };
        mood_writer.await.unwrap().unwrap();
        energy_writer.await.unwrap().unwrap();

        let log = h.service.today_log(user).await.unwrap();
        assert_eq!(log.mood, Some(Mood::VeryHappy));
        assert_eq!(log.energy, 9);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_meals_are_all_kept() {
    let h = harness(ScriptedCompletion::answering("ok"));
    let user = Uuid::new_v4();

    let writers: Vec<_> = (0..10)
        .map(|_| {
            let service = h.service.clone();
            tokio::spawn(async move {
                service
                    .add_meal(
                        user,
                        NewMeal {
                            calories: Some(100.0),
                            ..NewMeal::default()
                        },
                    )
                    .await
            })
        })
        .collect();
    for writer in writers {
        writer.await.unwrap().unwrap();
    }

    let log = h.service.today_log(user).await.unwrap();
    assert_eq!(log.diet.meals.len(), 10);
    assert_eq!(log.diet.total_calories, 1_000);
    assert_eq!(h.store.log_count(), 1);
}
