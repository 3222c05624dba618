//! Input record shapes and the per-line record parser.
//!
//! One record per input line, columns split on a single configurable
//! separator. Lines beginning with `#` are headers or comments and are
//! ignored, as are empty lines. When the input carries no uid column,
//! ids are synthesized from a counter owned by the parser so that two
//! pipelines in one process never collide.

use clap::ValueEnum;
use serde::Serialize;

use crate::error::AppError;

// ─────────────────────────────────────────────────────────────────────────────
// Input formats
// ─────────────────────────────────────────────────────────────────────────────

/// Declared column layout of the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// firstName, lastName
    #[value(name = "fnln")]
    FnLn,
    /// firstName, lastName, countryIso2
    #[value(name = "fnlngeo")]
    FnLnGeo,
    /// fullName
    #[value(name = "name")]
    Name,
    /// fullName, countryIso2
    #[value(name = "namegeo")]
    NameGeo,
    /// firstName, lastName, phone
    #[value(name = "fnlnphone")]
    FnLnPhone,
}

impl InputFormat {
    /// Stable key used in flags and error messages.
    pub fn key(self) -> &'static str {
        match self {
            InputFormat::FnLn => "fnln",
            InputFormat::FnLnGeo => "fnlngeo",
            InputFormat::Name => "name",
            InputFormat::NameGeo => "namegeo",
            InputFormat::FnLnPhone => "fnlnphone",
        }
    }

    /// Column names for this format, in input order (uid excluded).
    pub fn headers(self) -> &'static [&'static str] {
        match self {
            InputFormat::FnLn => &["firstName", "lastName"],
            InputFormat::FnLnGeo => &["firstName", "lastName", "countryIso2"],
            InputFormat::Name => &["fullName"],
            InputFormat::NameGeo => &["fullName", "countryIso2"],
            InputFormat::FnLnPhone => &["firstName", "lastName", "phone"],
        }
    }

    /// The batch shape records of this format accumulate into.
    pub fn shape(self) -> Shape {
        match self {
            InputFormat::FnLn => Shape::FirstLast,
            InputFormat::FnLnGeo => Shape::FirstLastGeo,
            InputFormat::Name => Shape::Personal,
            InputFormat::NameGeo => Shape::PersonalGeo,
            InputFormat::FnLnPhone => Shape::FirstLastPhone,
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Record shapes
// ─────────────────────────────────────────────────────────────────────────────

/// Batch shape of a record. One accumulator buffer exists per shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    FirstLast,
    FirstLastGeo,
    Personal,
    PersonalGeo,
    FirstLastPhone,
}

impl Shape {
    /// All shapes, in accumulator order.
    pub const ALL: [Shape; 5] = [
        Shape::FirstLast,
        Shape::FirstLastGeo,
        Shape::Personal,
        Shape::PersonalGeo,
        Shape::FirstLastPhone,
    ];

    /// Index into per-shape buffer arrays.
    pub fn index(self) -> usize {
        match self {
            Shape::FirstLast => 0,
            Shape::FirstLastGeo => 1,
            Shape::Personal => 2,
            Shape::PersonalGeo => 3,
            Shape::FirstLastPhone => 4,
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Shape::FirstLast => "first/last name",
            Shape::FirstLastGeo => "first/last name + country",
            Shape::Personal => "full name",
            Shape::PersonalGeo => "full name + country",
            Shape::FirstLastPhone => "first/last name + phone",
        };
        f.write_str(name)
    }
}

/// A first + last name record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstLastName {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

/// A first + last name record qualified by a country.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstLastNameGeo {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub country_iso2: String,
}

/// An unsplit full-name record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalName {
    pub id: String,
    pub name: String,
}

/// An unsplit full-name record qualified by a country.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalNameGeo {
    pub id: String,
    pub name: String,
    pub country_iso2: String,
}

/// A first + last name record with a phone number.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstLastNamePhone {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
}

/// A parsed input record, tagged by shape.
#[derive(Debug, Clone)]
pub enum Record {
    FirstLast(FirstLastName),
    FirstLastGeo(FirstLastNameGeo),
    Personal(PersonalName),
    PersonalGeo(PersonalNameGeo),
    FirstLastPhone(FirstLastNamePhone),
}

impl Record {
    /// Correlation id, stable for the lifetime of the run.
    pub fn id(&self) -> &str {
        match self {
            Record::FirstLast(r) => &r.id,
            Record::FirstLastGeo(r) => &r.id,
            Record::Personal(r) => &r.id,
            Record::PersonalGeo(r) => &r.id,
            Record::FirstLastPhone(r) => &r.id,
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Record::FirstLast(_) => Shape::FirstLast,
            Record::FirstLastGeo(_) => Shape::FirstLastGeo,
            Record::Personal(_) => Shape::Personal,
            Record::PersonalGeo(_) => Shape::PersonalGeo,
            Record::FirstLastPhone(_) => Shape::FirstLastPhone,
        }
    }

    /// Name text the trailing `script` column is derived from: the last
    /// name for split shapes, the full name otherwise.
    pub fn script_text(&self) -> &str {
        match self {
            Record::FirstLast(r) => &r.last_name,
            Record::FirstLastGeo(r) => &r.last_name,
            Record::Personal(r) => &r.name,
            Record::PersonalGeo(r) => &r.name,
            Record::FirstLastPhone(r) => &r.last_name,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Line parser
// ─────────────────────────────────────────────────────────────────────────────

/// Parses raw input lines into typed records.
pub struct LineParser {
    format: InputFormat,
    separator: char,
    with_uid: bool,
    default_country: Option<String>,
    next_uid: u64,
}

impl LineParser {
    pub fn new(
        format: InputFormat,
        separator: char,
        with_uid: bool,
        default_country: Option<String>,
    ) -> Self {
        Self {
            format,
            separator,
            with_uid,
            default_country,
            next_uid: 0,
        }
    }

    /// Number of columns a data line must carry.
    pub fn expected_columns(&self) -> usize {
        self.format.headers().len() + usize::from(self.with_uid)
    }

    /// Human-readable column layout, for error messages.
    pub fn expected_format(&self) -> String {
        let mut cols: Vec<&str> = Vec::with_capacity(self.expected_columns());
        if self.with_uid {
            cols.push("uid");
        }
        cols.extend_from_slice(self.format.headers());
        cols.join(&self.separator.to_string())
    }

    /// Parses one raw line. Returns `Ok(None)` for ignored lines (comments,
    /// headers, blanks) and a per-line error on a column-count mismatch.
    pub fn parse_line(&mut self, line: &str, line_no: u64) -> Result<Option<Record>, AppError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let fields: Vec<&str> = line.split(self.separator).collect();
        if fields.len() != self.expected_columns() {
            return Err(AppError::MalformedLine {
                line_no,
                expected: self.expected_format(),
                line: line.to_string(),
            });
        }

        let mut col = 0usize;
        let id = if self.with_uid {
            col += 1;
            fields[0].to_string()
        } else {
            let id = format!("uid{}", self.next_uid);
            self.next_uid += 1;
            id
        };

        let record = match self.format {
            InputFormat::FnLn => Record::FirstLast(FirstLastName {
                id,
                first_name: fields[col].to_string(),
                last_name: fields[col + 1].to_string(),
            }),
            InputFormat::FnLnGeo => Record::FirstLastGeo(FirstLastNameGeo {
                id,
                first_name: fields[col].to_string(),
                last_name: fields[col + 1].to_string(),
                country_iso2: self.country_or_default(fields[col + 2]),
            }),
            InputFormat::Name => Record::Personal(PersonalName {
                id,
                name: fields[col].to_string(),
            }),
            InputFormat::NameGeo => Record::PersonalGeo(PersonalNameGeo {
                id,
                name: fields[col].to_string(),
                country_iso2: self.country_or_default(fields[col + 1]),
            }),
            InputFormat::FnLnPhone => Record::FirstLastPhone(FirstLastNamePhone {
                id,
                first_name: fields[col].to_string(),
                last_name: fields[col + 1].to_string(),
                phone_number: fields[col + 2].to_string(),
            }),
        };
        Ok(Some(record))
    }

    /// Substitutes the configured default country for blank geo columns.
    fn country_or_default(&self, value: &str) -> String {
        if value.trim().is_empty() {
            if let Some(default) = &self.default_country {
                return default.clone();
            }
        }
        value.to_string()
    }
}
