//! Renders output rows: input fields (digested), result fields, blank fill,
//! the derived script tag, the version tag, and the row counter.
//!
//! Every value is followed by the separator; the row counter terminates the
//! line. A row for an id the oracle dropped carries the exact number of
//! empty result columns for the service, so alignment never drifts.

use crate::api::types::ScoredResult;
use crate::api::Service;
use crate::digest::TextDigest;
use crate::output::layout::output_headers;
use crate::record::{InputFormat, Record};
use crate::script::first_script_name;

/// Fixed-point rendering for scores and probabilities.
fn fmt_score(value: f64) -> String {
    format!("{value:.6}")
}

/// Stateless row renderer for one run's separator, digest, and version tag.
pub struct RowFormatter {
    separator: char,
    digest: TextDigest,
    version: String,
}

impl RowFormatter {
    pub fn new(separator: char, digest: TextDigest, version: String) -> Self {
        Self {
            separator,
            digest,
            version,
        }
    }

    /// The optional header line:
    /// `#uid|<input columns>|<service columns>|version|rowId`.
    pub fn header_line(&self, format: InputFormat, service: Service) -> String {
        let mut line = String::from("#uid");
        for column in format.headers() {
            line.push(self.separator);
            line.push_str(column);
        }
        for column in output_headers(service) {
            line.push(self.separator);
            line.push_str(column);
        }
        line.push(self.separator);
        line.push_str("version");
        line.push(self.separator);
        line.push_str("rowId");
        line
    }

    /// Renders one data row (no trailing newline).
    pub fn render_row(
        &self,
        record: &Record,
        result: Option<&ScoredResult>,
        service: Service,
        row_id: u64,
    ) -> String {
        let mut row = String::new();
        self.push_field(&mut row, record.id());
        self.push_input_fields(&mut row, record);
        match result {
            Some(result) => self.push_result_fields(&mut row, record, result),
            None => {
                for _ in output_headers(service) {
                    self.push_field(&mut row, "");
                }
            }
        }
        self.push_field(&mut row, &self.version);
        row.push_str(&row_id.to_string());
        row
    }

    fn push_field(&self, row: &mut String, value: &str) {
        row.push_str(value);
        row.push(self.separator);
    }

    /// Name fields pass through the digest; country codes and phone numbers
    /// are written untouched.
    fn push_input_fields(&self, row: &mut String, record: &Record) {
        match record {
            Record::FirstLast(r) => {
                self.push_field(row, &self.digest.apply(&r.first_name));
                self.push_field(row, &self.digest.apply(&r.last_name));
            }
            Record::FirstLastGeo(r) => {
                self.push_field(row, &self.digest.apply(&r.first_name));
                self.push_field(row, &self.digest.apply(&r.last_name));
                self.push_field(row, &r.country_iso2);
            }
            Record::Personal(r) => {
                self.push_field(row, &self.digest.apply(&r.name));
            }
            Record::PersonalGeo(r) => {
                self.push_field(row, &self.digest.apply(&r.name));
                self.push_field(row, &r.country_iso2);
            }
            Record::FirstLastPhone(r) => {
                self.push_field(row, &self.digest.apply(&r.first_name));
                self.push_field(row, &self.digest.apply(&r.last_name));
                self.push_field(row, &r.phone_number);
            }
        }
    }

    fn push_result_fields(&self, row: &mut String, record: &Record, result: &ScoredResult) {
        let script = first_script_name(record.script_text());
        match result {
            ScoredResult::Parsed(r) => {
                self.push_field(row, &r.first_last_name.first_name);
                self.push_field(row, &r.first_last_name.last_name);
                self.push_field(row, &r.name_parser_type);
                self.push_field(row, &r.name_parser_type_alt);
                self.push_field(row, &fmt_score(r.score));
            }
            ScoredResult::Gendered(r) => {
                self.push_field(row, &r.likely_gender);
                self.push_field(row, &fmt_score(r.score));
                self.push_field(row, &fmt_score(r.probability_calibrated));
                self.push_field(row, &fmt_score(r.gender_scale));
            }
            ScoredResult::Originated(r) => {
                self.push_field(row, &r.country_origin);
                self.push_field(row, &r.country_origin_alt);
                self.push_field(row, &fmt_score(r.probability_calibrated));
                self.push_field(row, &fmt_score(r.probability_alt_calibrated));
                self.push_field(row, &fmt_score(r.score));
            }
            ScoredResult::Countried(r) => {
                self.push_field(row, &r.country);
                self.push_field(row, &r.country_alt);
                self.push_field(row, &fmt_score(r.probability_calibrated));
                self.push_field(row, &fmt_score(r.probability_alt_calibrated));
                self.push_field(row, &fmt_score(r.score));
            }
            ScoredResult::Diaspora(r) => {
                self.push_field(row, &r.ethnicity);
                self.push_field(row, &r.ethnicity_alt);
                self.push_field(row, &fmt_score(r.score));
            }
            ScoredResult::UsRaceEthnicity(r) => {
                self.push_field(row, &r.race_ethnicity);
                self.push_field(row, &r.race_ethnicity_alt);
                self.push_field(row, &fmt_score(r.probability_calibrated));
                self.push_field(row, &fmt_score(r.probability_alt_calibrated));
                self.push_field(row, &fmt_score(r.score));
            }
            ScoredResult::PhoneCoded(r) => {
                self.push_field(row, &r.international_phone_number_verified);
                self.push_field(row, &r.phone_country_iso2_verified);
                self.push_field(row, &r.phone_country_code.to_string());
                self.push_field(row, &r.phone_country_code_alt.to_string());
                self.push_field(row, &r.phone_country_iso2);
                self.push_field(row, &r.phone_country_iso2_alt);
                self.push_field(row, &r.origin_country_iso2);
                self.push_field(row, &r.origin_country_iso2_alt);
                self.push_field(row, &r.verified.to_string());
                self.push_field(row, &fmt_score(r.score));
            }
        }
        self.push_field(row, &script);
    }
}
