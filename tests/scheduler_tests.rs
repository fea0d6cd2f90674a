use rand::rngs::StdRng;
use rand::SeedableRng;
use squadhealth::scheduler::{self, SharedEngine};
use squadhealth::simulator::SimulationConfig;
use squadhealth::{
    AthleteId, EngineConfig, HealthEngine, MetricSimulator, NewAthlete, TickScheduler,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const PERIOD: Duration = Duration::from_millis(10);
const WAIT: Duration = Duration::from_secs(5);

fn shared_engine(simulation_enabled: bool, athletes: usize) -> SharedEngine<StdRng> {
    let simulator = MetricSimulator::with_config(SimulationConfig {
        selection_probability: 1.0,
        ..SimulationConfig::default()
    });
    let mut engine = HealthEngine::new(
        EngineConfig::new(simulation_enabled, 70.0),
        simulator,
        StdRng::seed_from_u64(99),
    );
    for i in 0..athletes {
        engine.create_athlete(NewAthlete::new(format!("Athlete {}", i), "Lions FC", "Forward"));
    }
    scheduler::shared(engine)
}

#[tokio::test]
async fn test_scheduler_reports_every_tick() {
    let engine = shared_engine(true, 3);
    let handle = TickScheduler::spawn(Arc::clone(&engine), PERIOD);
    let mut reports = handle.subscribe();

    let first = timeout(WAIT, reports.recv()).await.unwrap().unwrap();
    let second = timeout(WAIT, reports.recv()).await.unwrap().unwrap();

    assert_eq!(first.tick, 1);
    assert_eq!(second.tick, 2);
    assert_eq!(first.changed.len(), 3);
    assert!(second.changed.iter().all(|a| a.history.len() >= 2));

    handle.shutdown().await;
}

#[tokio::test]
async fn test_disabled_simulation_reports_empty_ticks() {
    let engine = shared_engine(false, 2);
    let before = engine.lock().await.athletes();

    let handle = TickScheduler::spawn(Arc::clone(&engine), PERIOD);
    let mut reports = handle.subscribe();

    for _ in 0..3 {
        let report = timeout(WAIT, reports.recv()).await.unwrap().unwrap();
        assert!(report.changed.is_empty());
    }

    handle.shutdown().await;
    assert_eq!(engine.lock().await.athletes(), before);
}

#[tokio::test]
async fn test_shutdown_stops_future_ticks() {
    let engine = shared_engine(true, 1);
    let handle = TickScheduler::spawn(Arc::clone(&engine), PERIOD);
    let mut reports = handle.subscribe();

    timeout(WAIT, reports.recv()).await.unwrap().unwrap();
    handle.shutdown().await;

    let frozen = engine.lock().await.athletes();
    tokio::time::sleep(PERIOD * 5).await;
    assert_eq!(engine.lock().await.athletes(), frozen);

    // All senders are gone once the task exits
    loop {
        match reports.recv().await {
            Ok(_) => continue,
            Err(e) => {
                assert_eq!(e, tokio::sync::broadcast::error::RecvError::Closed);
                break;
            }
        }
    }
}

#[tokio::test]
async fn test_cancel_marks_scheduler_stopped() {
    let engine = shared_engine(true, 1);
    let handle = TickScheduler::spawn(engine, Duration::from_secs(3600));
    assert!(handle.is_running());

    handle.cancel();
    // Repeated cancels are harmless
    handle.cancel();

    timeout(WAIT, async {
        while handle.is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_manual_edits_interleave_with_ticks() {
    let engine = shared_engine(true, 2);
    let handle = TickScheduler::spawn(Arc::clone(&engine), PERIOD);
    let mut reports = handle.subscribe();

    timeout(WAIT, reports.recv()).await.unwrap().unwrap();

    let edited = {
        let mut engine = engine.lock().await;
        engine.set_metric(AthleteId(1), "fatigueLevel", 100.0).unwrap()
    };
    assert_eq!(edited.metrics.primary().fatigue_level, 100.0);

    // Reports queued before the edit still carry fatigue near 25; the first tick after
    // it perturbs from 100 by at most 10
    let after = timeout(WAIT, async {
        loop {
            let report = reports.recv().await.unwrap();
            if let Some(athlete) = report.changed.iter().find(|a| a.id == AthleteId(1)) {
                if athlete.metrics.primary().fatigue_level >= 90.0 {
                    return Arc::clone(athlete);
                }
            }
        }
    })
    .await
    .unwrap();

    assert!(after.history.iter().any(|e| e.health_score == edited.health_score()));

    handle.shutdown().await;
}
