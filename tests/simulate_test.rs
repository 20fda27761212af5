use timeline_window::cli::{SimulationOptions, run_simulation};
use timeline_window::{MockSourceConfig, SortOrder, WindowConfig};

fn options(order: SortOrder, seed: u64) -> SimulationOptions {
    let window = WindowConfig {
        order,
        ..WindowConfig::default()
    };
    SimulationOptions {
        seed,
        steps: 800,
        ..SimulationOptions::new(window, MockSourceConfig::default())
    }
}

#[tokio::test]
async fn test_ascending_run_keeps_invariants() {
    let report = run_simulation(options(SortOrder::Ascending, 11))
        .await
        .unwrap();

    assert!(report.passed(), "violations: {:?}", report.violations);
    assert!(report.loads_merged > 1);
    assert_eq!(report.order, "ascending");
}

#[tokio::test]
async fn test_descending_run_keeps_invariants() {
    let report = run_simulation(options(SortOrder::Descending, 12))
        .await
        .unwrap();

    assert!(report.passed(), "violations: {:?}", report.violations);
    assert!(report.loads_merged > 1);
}

#[tokio::test]
async fn test_same_seed_gives_same_report() {
    let first = run_simulation(options(SortOrder::Ascending, 5)).await.unwrap();
    let second = run_simulation(options(SortOrder::Ascending, 5)).await.unwrap();

    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

#[tokio::test]
async fn test_invalid_window_config_is_rejected() {
    let window = WindowConfig {
        page_size: 0,
        ..WindowConfig::default()
    };
    let options = SimulationOptions::new(window, MockSourceConfig::default());

    assert!(run_simulation(options).await.is_err());
}
