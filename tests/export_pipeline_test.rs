// End-to-end tests for the bore export pipeline
// Uses mockito for HTTP mocking and tempfile for output directories

use mockito::{Matcher, Server};
use titree_bore_export::datasets::{DatasetSpec, DATASETS};
use titree_bore_export::exporter::run_export;
use titree_bore_export::fetcher::TimeseriesFetcher;

fn create_test_fetcher(server: &Server) -> TimeseriesFetcher {
    TimeseriesFetcher::with_base_url(server.url() + "/Export/DataSet")
}

// Portal export bodies start with four metadata lines before the CSV table
fn export_body(value_column: &str, rows: &[(&str, &str)]) -> String {
    let mut body = String::from(
        "Ti Tree Basin water data export\n\
         Generated at 2024-05-01 10:00:00\n\
         Units normalised on export\n\
         \n",
    );
    body.push_str(&format!("Timestamp (UTC+09:30),{value_column}\n"));
    for (ts, value) in rows {
        body.push_str(&format!("{ts},{value}\n"));
    }
    body
}

fn dataset_matcher(spec: &DatasetSpec, bore: &str) -> Matcher {
    Matcher::UrlEncoded(
        "DataSet".into(),
        format!("{}@{}", spec.remote_name, bore),
    )
}

#[tokio::test]
async fn test_meters_column_persisted_unchanged() {
    let mut server = Server::new_async().await;
    let spec = &DATASETS[0];

    let mock = server
        .mock("GET", "/Export/DataSet")
        .match_query(dataset_matcher(spec, "RN018374"))
        .with_status(200)
        .with_body(export_body(
            "Value (m)",
            &[("2020-01-01 09:30:00", "5.3")],
        ))
        .create_async()
        .await;

    let fetcher = create_test_fetcher(&server);
    let out_dir = tempfile::tempdir().unwrap();
    let bores = vec!["RN018374".to_string()];

    let outcome = run_export(&fetcher, &bores, &DATASETS[0..1], out_dir.path()).await;

    assert_eq!(outcome.successes.len(), 1);
    assert!(outcome.failures.is_empty());

    let expected = out_dir
        .path()
        .join("Depth_BGS.Publish_TS")
        .join("RN018374_DepthBelowGround_TS.csv");
    assert_eq!(outcome.successes[0], expected);

    let contents = std::fs::read_to_string(&expected).unwrap();
    assert_eq!(
        contents,
        "DateTime,Value,Location\n2020-01-01 09:30:00,5.3,RN018374\n"
    );

    mock.assert_async().await;
}

#[tokio::test]
async fn test_inches_column_converted_to_meters() {
    let mut server = Server::new_async().await;
    let spec = &DATASETS[1];

    server
        .mock("GET", "/Export/DataSet")
        .match_query(dataset_matcher(spec, "RN005523"))
        .with_status(200)
        .with_body(export_body(
            "Value (in)",
            &[("2019-06-30 12:00:00", "1.0")],
        ))
        .create_async()
        .await;

    let fetcher = create_test_fetcher(&server);
    let out_dir = tempfile::tempdir().unwrap();
    let bores = vec!["RN005523".to_string()];

    let outcome = run_export(&fetcher, &bores, &DATASETS[1..2], out_dir.path()).await;

    assert_eq!(outcome.successes.len(), 1);
    let contents = std::fs::read_to_string(&outcome.successes[0]).unwrap();
    assert_eq!(
        contents,
        "DateTime,Value,Location\n2019-06-30 12:00:00,0.0254,RN005523\n"
    );
}

#[tokio::test]
async fn test_missing_value_column_recorded_and_nothing_written() {
    let mut server = Server::new_async().await;
    let spec = &DATASETS[0];

    server
        .mock("GET", "/Export/DataSet")
        .match_query(dataset_matcher(spec, "RN018374"))
        .with_status(200)
        .with_body(export_body("Grade", &[("2020-01-01 09:30:00", "10")]))
        .create_async()
        .await;

    let fetcher = create_test_fetcher(&server);
    let out_dir = tempfile::tempdir().unwrap();
    let bores = vec!["RN018374".to_string()];

    let outcome = run_export(&fetcher, &bores, &DATASETS[0..1], out_dir.path()).await;

    assert!(outcome.successes.is_empty());
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(
        outcome.failures[0].error,
        "No 'Value (m)' or 'Value (in)' column found"
    );

    let expected = spec.output_path(out_dir.path(), "RN018374");
    assert!(!expected.exists());
}

#[tokio::test]
async fn test_http_500_recorded_and_loop_continues() {
    let mut server = Server::new_async().await;

    // First dataset fails with a server error
    server
        .mock("GET", "/Export/DataSet")
        .match_query(dataset_matcher(&DATASETS[0], "RN018374"))
        .with_status(500)
        .create_async()
        .await;

    // Second dataset succeeds
    server
        .mock("GET", "/Export/DataSet")
        .match_query(dataset_matcher(&DATASETS[1], "RN018374"))
        .with_status(200)
        .with_body(export_body(
            "Value (m)",
            &[("2020-01-01 09:30:00", "4.1")],
        ))
        .create_async()
        .await;

    let fetcher = create_test_fetcher(&server);
    let out_dir = tempfile::tempdir().unwrap();
    let bores = vec!["RN018374".to_string()];

    let outcome = run_export(&fetcher, &bores, &DATASETS[0..2], out_dir.path()).await;

    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].bore, "RN018374");
    assert_eq!(outcome.failures[0].logical_name, "DepthBelowGround");
    assert!(outcome.failures[0].error.contains("500"));

    // The failure did not stop the second combination
    assert_eq!(outcome.successes.len(), 1);
    assert_eq!(
        outcome.successes[0],
        DATASETS[1].output_path(out_dir.path(), "RN018374")
    );
}

#[tokio::test]
async fn test_full_cross_product_output_layout() {
    let mut server = Server::new_async().await;

    // One catch-all mock; every combination gets a meters payload
    server
        .mock("GET", "/Export/DataSet")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(export_body(
            "Value (m)",
            &[("2020-01-01 09:30:00", "2.5")],
        ))
        .expect(8)
        .create_async()
        .await;

    let fetcher = create_test_fetcher(&server);
    let out_dir = tempfile::tempdir().unwrap();
    let bores = vec!["RN018374".to_string(), "RN005523".to_string()];

    let outcome = run_export(&fetcher, &bores, &DATASETS, out_dir.path()).await;

    assert_eq!(outcome.successes.len(), 8);
    assert!(outcome.failures.is_empty());

    for bore in &bores {
        for spec in &DATASETS {
            let path = spec.output_path(out_dir.path(), bore);
            assert!(path.exists(), "Missing output file: {path:?}");
        }
    }
}

#[tokio::test]
async fn test_empty_bore_list_performs_no_work() {
    let server = Server::new_async().await;

    let fetcher = create_test_fetcher(&server);
    let out_dir = tempfile::tempdir().unwrap();

    let outcome = run_export(&fetcher, &[], &DATASETS, out_dir.path()).await;

    assert!(outcome.successes.is_empty());
    assert!(outcome.failures.is_empty());

    // No per-dataset directories were created
    let entries: Vec<_> = std::fs::read_dir(out_dir.path()).unwrap().collect();
    assert!(entries.is_empty());
}
