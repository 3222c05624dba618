//! Run configuration and startup validation.
//!
//! Everything the pipeline needs for one run is resolved and validated here,
//! before any network or output I/O happens. A run that would fail half-way
//! through on a bad flag combination should fail at startup instead.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::Service;
use crate::digest::TextDigest;
use crate::error::AppError;
use crate::output::layout::output_headers;
use crate::record::InputFormat;

/// Extension of derived output file names.
const OUTPUT_EXTENSION: &str = "onoma";

/// Validated configuration for one scoring run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub api_key: String,
    pub base_url: String,
    pub input_file: PathBuf,
    pub output_file: Option<PathBuf>,
    pub input_format: InputFormat,
    pub service: Service,
    pub overwrite: bool,
    pub resume: bool,
    pub with_uid: bool,
    pub header: bool,
    pub digest: TextDigest,
    pub default_country: Option<String>,
    pub separator: char,
    pub skip_errors: bool,
    pub timeout: Duration,
}

impl RunConfig {
    /// Checks flag consistency before the run starts.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MissingApiKey` for a blank key,
    /// `AppError::UnsupportedService` for a (service, format) pair with no
    /// remote operation, and `AppError::Config` for the rest.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::MissingApiKey);
        }
        if !self.input_file.is_file() {
            return Err(AppError::Config(format!(
                "Input file not found: {}",
                self.input_file.display()
            )));
        }
        if !self.service.supports(self.input_format.shape()) {
            return Err(AppError::UnsupportedService {
                service: self.service.key().into(),
                format: self.input_format.key().into(),
            });
        }
        if self.overwrite && self.resume {
            return Err(AppError::Config(
                "--overwrite and --resume are mutually exclusive".into(),
            ));
        }
        if self.resume && !self.with_uid {
            return Err(AppError::Config(
                "--resume requires a uid column (--uid)".into(),
            ));
        }

        let output = self.output_path();
        if output == self.input_file {
            return Err(AppError::Config(
                "Output file would overwrite the input file".into(),
            ));
        }
        // A resumed run is allowed to find its output missing (first attempt
        // crashed before any write); anything else refuses to clobber.
        if output.exists() && !self.overwrite && !self.resume {
            return Err(AppError::Config(format!(
                "Output file already exists: {} (use --overwrite or --resume)",
                output.display()
            )));
        }
        Ok(())
    }

    /// Column count of a complete output data row under this configuration:
    /// uid, the input columns, the service's result columns, version, rowId.
    /// The resume replay rejects any row with a different width.
    pub fn output_columns(&self) -> usize {
        1 + self.input_format.headers().len() + output_headers(self.service).len() + 2
    }

    /// The output path: the explicit `--output-file` if given, otherwise
    /// derived as `<input>.<service>[.digest].onoma`.
    pub fn output_path(&self) -> PathBuf {
        if let Some(path) = &self.output_file {
            return path.clone();
        }
        let mut name = self
            .input_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        name.push('.');
        name.push_str(self.service.key());
        if self.digest.is_enabled() {
            name.push_str(".digest");
        }
        name.push('.');
        name.push_str(OUTPUT_EXTENSION);
        self.input_file.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn base_config(input: &Path) -> RunConfig {
        RunConfig {
            api_key: "test-key".into(),
            base_url: crate::api::DEFAULT_BASE_URL.into(),
            input_file: input.to_path_buf(),
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
            timeout: Duration::from_secs(30),
        }
    }

    fn with_input(dir: &TempDir) -> PathBuf {
        let input = dir.path().join("names.txt");
        fs::write(&input, "uid1|John|Doe\n").expect("fixture");
        input
    }

    #[test]
    fn valid_config_passes() {
        let dir = TempDir::new().expect("temp dir");
        let config = base_config(&with_input(&dir));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let mut config = base_config(&with_input(&dir));
        config.api_key = "  ".into();
        assert!(matches!(config.validate(), Err(AppError::MissingApiKey)));
    }

    #[test]
    fn missing_input_file_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let config = base_config(&dir.path().join("absent.txt"));
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn unsupported_pair_fails_at_startup() {
        let dir = TempDir::new().expect("temp dir");
        let mut config = base_config(&with_input(&dir));
        config.service = Service::Diaspora;
        assert!(matches!(
            config.validate(),
            Err(AppError::UnsupportedService { .. })
        ));
    }

    #[test]
    fn overwrite_and_resume_exclude_each_other() {
        let dir = TempDir::new().expect("temp dir");
        let mut config = base_config(&with_input(&dir));
        config.overwrite = true;
        config.resume = true;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn resume_requires_the_uid_column() {
        let dir = TempDir::new().expect("temp dir");
        let mut config = base_config(&with_input(&dir));
        config.resume = true;
        config.with_uid = false;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn existing_output_needs_overwrite_or_resume() {
        let dir = TempDir::new().expect("temp dir");
        let mut config = base_config(&with_input(&dir));
        fs::write(config.output_path(), "uid1|John|Doe|male|v|0\n").expect("fixture");
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        config.overwrite = true;
        assert!(config.validate().is_ok());

        config.overwrite = false;
        config.resume = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn resume_without_existing_output_is_allowed() {
        let dir = TempDir::new().expect("temp dir");
        let mut config = base_config(&with_input(&dir));
        config.resume = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn output_name_is_derived_from_input_service_and_digest() {
        let dir = TempDir::new().expect("temp dir");
        let mut config = base_config(&with_input(&dir));
        assert_eq!(
            config.output_path(),
            dir.path().join("names.txt.gender.onoma")
        );

        config.digest = TextDigest::Md5;
        assert_eq!(
            config.output_path(),
            dir.path().join("names.txt.gender.digest.onoma")
        );

        config.output_file = Some(dir.path().join("custom.out"));
        assert_eq!(config.output_path(), dir.path().join("custom.out"));
    }

    #[test]
    fn output_columns_covers_uid_input_results_version_and_row_id() {
        let dir = TempDir::new().expect("temp dir");
        let mut config = base_config(&with_input(&dir));
        // uid + firstName/lastName + 5 gender columns + version + rowId.
        assert_eq!(config.output_columns(), 10);

        config.input_format = InputFormat::FnLnPhone;
        config.service = Service::Phonecode;
        assert_eq!(config.output_columns(), 17);

        config.input_format = InputFormat::Name;
        config.service = Service::Parse;
        assert_eq!(config.output_columns(), 10);
    }

    #[test]
    fn explicit_output_equal_to_input_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let input = with_input(&dir);
        let mut config = base_config(&input);
        config.output_file = Some(input);
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }
}
