//! End-to-end pipeline tests against an in-process fake oracle.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tempfile::TempDir;

use onoma::api::types::{
    CountriedName, DiasporaName, GenderedName, OriginatedName, ParsedName, PhoneCodedName,
    UsRaceEthnicityName,
};
use onoma::api::{NameOracle, OracleFuture, Service};
use onoma::digest::TextDigest;
use onoma::error::AppError;
use onoma::pipeline::Pipeline;
use onoma::record::{
    FirstLastName, FirstLastNameGeo, FirstLastNamePhone, InputFormat, PersonalName,
    PersonalNameGeo,
};
use onoma::RunConfig;

// ─────────────────────────────────────────────────────────────────────────────
// Fake oracle
// ─────────────────────────────────────────────────────────────────────────────

/// Deterministic oracle: every name is scored male/10.0/0.95/-0.95. Ids in
/// `drop_ids` vanish from responses; `fail_batches` makes every batch call
/// return an error.
#[derive(Default)]
struct FakeOracle {
    batch_calls: AtomicUsize,
    fail_batches: bool,
    drop_ids: HashSet<String>,
}

impl FakeOracle {
    fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    fn score<I: AsRef<str>>(&self, ids: impl Iterator<Item = I>) -> Result<Vec<GenderedName>, AppError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_batches {
            return Err(AppError::Internal("synthetic outage".into()));
        }
        Ok(ids
            .filter(|id| !self.drop_ids.contains(id.as_ref()))
            .map(|id| GenderedName {
                id: id.as_ref().to_string(),
                likely_gender: "male".into(),
                score: 10.0,
                probability_calibrated: 0.95,
                gender_scale: -0.95,
            })
            .collect())
    }
}

impl NameOracle for FakeOracle {
    fn software_version(&self) -> OracleFuture<'_, String> {
        Box::pin(async { Ok("onoma-test-1.0".to_string()) })
    }

    fn parse_batch<'a>(&'a self, _names: &'a [PersonalName]) -> OracleFuture<'a, Vec<ParsedName>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn parse_geo_batch<'a>(
        &'a self,
        _names: &'a [PersonalNameGeo],
    ) -> OracleFuture<'a, Vec<ParsedName>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn gender_batch<'a>(
        &'a self,
        names: &'a [FirstLastName],
    ) -> OracleFuture<'a, Vec<GenderedName>> {
        Box::pin(async move { self.score(names.iter().map(|n| n.id.as_str())) })
    }

    fn gender_geo_batch<'a>(
        &'a self,
        names: &'a [FirstLastNameGeo],
    ) -> OracleFuture<'a, Vec<GenderedName>> {
        Box::pin(async move { self.score(names.iter().map(|n| n.id.as_str())) })
    }

    fn gender_full_batch<'a>(
        &'a self,
        names: &'a [PersonalName],
    ) -> OracleFuture<'a, Vec<GenderedName>> {
        Box::pin(async move { self.score(names.iter().map(|n| n.id.as_str())) })
    }

    fn gender_full_geo_batch<'a>(
        &'a self,
        names: &'a [PersonalNameGeo],
    ) -> OracleFuture<'a, Vec<GenderedName>> {
        Box::pin(async move { self.score(names.iter().map(|n| n.id.as_str())) })
    }

    fn origin_batch<'a>(
        &'a self,
        _names: &'a [FirstLastName],
    ) -> OracleFuture<'a, Vec<OriginatedName>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn country_batch<'a>(
        &'a self,
        _names: &'a [PersonalName],
    ) -> OracleFuture<'a, Vec<CountriedName>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn diaspora_batch<'a>(
        &'a self,
        _names: &'a [FirstLastNameGeo],
    ) -> OracleFuture<'a, Vec<DiasporaName>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn us_race_ethnicity_batch<'a>(
        &'a self,
        _names: &'a [FirstLastNameGeo],
    ) -> OracleFuture<'a, Vec<UsRaceEthnicityName>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn phone_code_batch<'a>(
        &'a self,
        _names: &'a [FirstLastNamePhone],
    ) -> OracleFuture<'a, Vec<PhoneCodedName>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────────────

fn write_input(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("names.txt");
    fs::write(&path, content).expect("write input fixture");
    path
}

fn gender_config(input: PathBuf) -> RunConfig {
    RunConfig {
        api_key: "test-key".into(),
        base_url: "http://unused.invalid/".into(),
        input_file: input,
        output_file: None,
        input_format: InputFormat::FnLn,
        service: Service::Gender,
        overwrite: false,
        resume: false,
        with_uid: true,
        header: false,
        digest: TextDigest::Identity,
        default_country: None,
        separator: '|',
        skip_errors: false,
        timeout: Duration::from_secs(5),
    }
}

fn read_output(config: &RunConfig) -> String {
    fs::read_to_string(config.output_path()).expect("read output")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn single_record_produces_exact_header_and_row() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_input(&dir, "#uid|firstName|lastName\nuid1|John|Doe\n");
    let mut config = gender_config(input);
    config.header = true;

    let oracle = FakeOracle::default();
    let summary = Pipeline::run(&config, &oracle).await.expect("run");

    assert_eq!(summary.rows_written, 1);
    assert_eq!(summary.batches_dispatched, 1);
    assert_eq!(
        read_output(&config),
        "#uid|firstName|lastName|likelyGender|likelyGenderScore|\
         probabilityCalibrated|genderScale|script|version|rowId\n\
         uid1|John|Doe|male|10.000000|0.950000|-0.950000|Latin|onoma-test-1.0|0\n"
    );
}

#[tokio::test]
async fn a_full_buffer_is_submitted_as_one_batch() {
    let dir = TempDir::new().expect("temp dir");
    let mut content = String::new();
    for i in 0..100 {
        content.push_str(&format!("uid{i}|First{i}|Last{i}\n"));
    }
    let config = gender_config(write_input(&dir, &content));

    let oracle = FakeOracle::default();
    let summary = Pipeline::run(&config, &oracle).await.expect("run");

    assert_eq!(summary.rows_written, 100);
    assert_eq!(oracle.batch_calls(), 1);
    assert_eq!(read_output(&config).lines().count(), 100);
}

#[tokio::test]
async fn an_overflowing_buffer_takes_two_batches() {
    let dir = TempDir::new().expect("temp dir");
    let mut content = String::new();
    for i in 0..101 {
        content.push_str(&format!("uid{i}|First{i}|Last{i}\n"));
    }
    let config = gender_config(write_input(&dir, &content));

    let oracle = FakeOracle::default();
    let summary = Pipeline::run(&config, &oracle).await.expect("run");

    assert_eq!(summary.rows_written, 101);
    assert_eq!(oracle.batch_calls(), 2);
}

#[tokio::test]
async fn rerunning_with_resume_submits_nothing_new() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_input(&dir, "uid1|John|Doe\nuid2|Jane|Roe\n");
    let mut config = gender_config(input);
    config.resume = true;

    let first = FakeOracle::default();
    let summary = Pipeline::run(&config, &first).await.expect("first run");
    assert_eq!(summary.rows_written, 2);
    let after_first = read_output(&config);

    let second = FakeOracle::default();
    let summary = Pipeline::run(&config, &second).await.expect("second run");
    assert_eq!(summary.rows_written, 0);
    assert_eq!(summary.records_resumed, 2);
    assert_eq!(second.batch_calls(), 0);
    assert_eq!(read_output(&config), after_first);
}

#[tokio::test]
async fn resume_completes_only_the_missing_records() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_input(&dir, "uid1|John|Doe\nuid2|Jane|Roe\nuid3|Ana|Souza\n");
    let mut config = gender_config(input);
    config.resume = true;

    // First attempt only got uid1 out before dying.
    fs::write(
        config.output_path(),
        "uid1|John|Doe|male|10.000000|0.950000|-0.950000|Latin|onoma-test-1.0|0\n",
    )
    .expect("seed output");

    let oracle = FakeOracle::default();
    let summary = Pipeline::run(&config, &oracle).await.expect("run");

    assert_eq!(summary.records_resumed, 1);
    assert_eq!(summary.rows_written, 2);
    let output = read_output(&config);
    assert_eq!(output.lines().count(), 3);
    assert!(output.starts_with("uid1|John|Doe|"));
    assert!(output.contains("\nuid2|Jane|Roe|"));
    assert!(output.contains("\nuid3|Ana|Souza|"));
    // Appended rows continue the row numbering after the replayed row.
    let mut row_ids: Vec<&str> = output
        .lines()
        .map(|l| l.rsplit('|').next().expect("row id"))
        .collect();
    row_ids.sort_unstable();
    assert_eq!(row_ids, ["0", "1", "2"]);
}

#[tokio::test]
async fn a_torn_first_row_is_resubmitted_on_resume() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_input(&dir, "uid1|John|Doe\n");
    let mut config = gender_config(input);
    config.resume = true;

    // A crash mid-write left a truncated row as the only line. Its width
    // disagrees with the configured layout, so its id must not count as done.
    fs::write(config.output_path(), "uid1|John|Do\n").expect("seed output");

    let oracle = FakeOracle::default();
    let summary = Pipeline::run(&config, &oracle).await.expect("run");

    assert_eq!(summary.records_resumed, 0);
    assert_eq!(summary.rows_written, 1);
    assert_eq!(oracle.batch_calls(), 1);
    let output = read_output(&config);
    assert!(output.contains("uid1|John|Doe|male|10.000000|"));
}

#[tokio::test]
async fn resume_never_appends_a_second_header() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_input(&dir, "uid1|John|Doe\n");
    let mut config = gender_config(input);
    config.resume = true;
    config.header = true;

    // The first attempt died right after writing the header.
    fs::write(
        config.output_path(),
        "#uid|firstName|lastName|likelyGender|likelyGenderScore|\
         probabilityCalibrated|genderScale|script|version|rowId\n",
    )
    .expect("seed output");

    let oracle = FakeOracle::default();
    let summary = Pipeline::run(&config, &oracle).await.expect("run");

    assert_eq!(summary.rows_written, 1);
    let output = read_output(&config);
    assert_eq!(output.lines().filter(|l| l.starts_with('#')).count(), 1);
    assert_eq!(output.lines().count(), 2);
}

#[tokio::test]
async fn a_dropped_id_gets_a_blank_filled_row() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_input(&dir, "uid1|John|Doe\nuid2|Jane|Roe\n");
    let config = gender_config(input);

    let oracle = FakeOracle {
        drop_ids: HashSet::from(["uid2".to_string()]),
        ..FakeOracle::default()
    };
    let summary = Pipeline::run(&config, &oracle).await.expect("run");

    assert_eq!(summary.rows_written, 2);
    let output = read_output(&config);
    let blank_row = output
        .lines()
        .find(|l| l.starts_with("uid2|"))
        .expect("row for dropped id");
    // uid + 2 input + 5 blank result columns + version + rowId.
    assert_eq!(blank_row.split('|').count(), 10);
    assert!(blank_row.starts_with("uid2|Jane|Roe||||||onoma-test-1.0|"));
}

#[tokio::test]
async fn a_failed_batch_degrades_to_blank_columns() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_input(&dir, "uid1|John|Doe\n");
    let config = gender_config(input);

    let oracle = FakeOracle {
        fail_batches: true,
        ..FakeOracle::default()
    };
    let summary = Pipeline::run(&config, &oracle).await.expect("run");

    assert_eq!(summary.rows_written, 1);
    assert_eq!(summary.batches_failed, 1);
    assert_eq!(summary.batches_dispatched, 0);
    assert_eq!(
        read_output(&config),
        "uid1|John|Doe||||||onoma-test-1.0|0\n"
    );
}

#[tokio::test]
async fn malformed_lines_abort_unless_skipped() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_input(&dir, "uid1|John|Doe\nuid2|torn\n");
    let mut config = gender_config(input);

    let oracle = FakeOracle::default();
    let err = Pipeline::run(&config, &oracle).await.expect_err("abort");
    assert!(matches!(err, AppError::MalformedLine { line_no: 1, .. }));

    config.skip_errors = true;
    config.overwrite = true;
    let oracle = FakeOracle::default();
    let summary = Pipeline::run(&config, &oracle).await.expect("run");
    assert_eq!(summary.rows_written, 1);
    assert_eq!(summary.lines_skipped, 1);
}

#[tokio::test]
async fn digested_output_hides_names_but_keeps_results() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_input(&dir, "uid1|John|Doe\n");
    let mut config = gender_config(input);
    config.digest = TextDigest::Md5;

    let oracle = FakeOracle::default();
    Pipeline::run(&config, &oracle).await.expect("run");

    let output = read_output(&config);
    assert!(config
        .output_path()
        .to_string_lossy()
        .ends_with(".gender.digest.onoma"));
    assert!(!output.contains("John"));
    assert!(!output.contains("Doe"));
    assert!(output.contains("|male|10.000000|"));
    assert!(output.starts_with(&format!("uid1|{}|", TextDigest::Md5.apply("John"))));
}

#[tokio::test]
async fn full_name_records_use_the_full_name_operation() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_input(&dir, "uid1|Maria da Silva|BR\n");
    let mut config = gender_config(input);
    config.input_format = InputFormat::NameGeo;

    let oracle = FakeOracle::default();
    let summary = Pipeline::run(&config, &oracle).await.expect("run");

    assert_eq!(summary.rows_written, 1);
    assert_eq!(oracle.batch_calls(), 1);
    assert_eq!(
        read_output(&config),
        "uid1|Maria da Silva|BR|male|10.000000|0.950000|-0.950000|Latin|onoma-test-1.0|0\n"
    );
}

#[tokio::test]
async fn existing_output_without_overwrite_or_resume_refuses_to_run() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_input(&dir, "uid1|John|Doe\n");
    let config = gender_config(input);
    fs::write(config.output_path(), "stale\n").expect("seed output");

    let oracle = FakeOracle::default();
    let err = Pipeline::run(&config, &oracle).await.expect_err("refuse");
    assert!(matches!(err, AppError::Config(_)));
    assert_eq!(oracle.batch_calls(), 0);
}
