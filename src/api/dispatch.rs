//! Oracle dispatch: service selection, the shape×service operation matrix,
//! and correlation of batch results back to record ids.
//!
//! The `NameOracle` trait decouples the pipeline from the HTTP client: the
//! real client implements it against the remote API, and tests provide fake
//! implementations that never touch the network.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use clap::ValueEnum;

use crate::api::types::{
    CountriedName, DiasporaName, GenderedName, OriginatedName, ParsedName, PhoneCodedName,
    ScoredResult, UsRaceEthnicityName,
};
use crate::error::AppError;
use crate::record::{
    FirstLastName, FirstLastNameGeo, FirstLastNamePhone, PersonalName, PersonalNameGeo, Record,
    Shape,
};

// ─────────────────────────────────────────────────────────────────────────────
// Services
// ─────────────────────────────────────────────────────────────────────────────

/// The remote analysis requested for every record of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Service {
    Parse,
    Gender,
    Origin,
    Country,
    Diaspora,
    Phonecode,
    #[value(name = "usraceethnicity")]
    UsRaceEthnicity,
}

impl Service {
    /// Stable key used in flags and output file names.
    pub fn key(self) -> &'static str {
        match self {
            Service::Parse => "parse",
            Service::Gender => "gender",
            Service::Origin => "origin",
            Service::Country => "country",
            Service::Diaspora => "diaspora",
            Service::Phonecode => "phonecode",
            Service::UsRaceEthnicity => "usraceethnicity",
        }
    }

    /// Whether a (shape, service) pair maps to a remote operation. The geo
    /// services only exist for geo-qualified shapes; phonecode only for the
    /// phone shape.
    pub fn supports(self, shape: Shape) -> bool {
        matches!(
            (shape, self),
            (Shape::FirstLast, Service::Gender | Service::Origin | Service::Country)
                | (
                    Shape::FirstLastGeo,
                    Service::Gender
                        | Service::Origin
                        | Service::Diaspora
                        | Service::UsRaceEthnicity
                )
                | (Shape::Personal, Service::Parse | Service::Gender | Service::Country)
                | (Shape::PersonalGeo, Service::Parse | Service::Gender)
                | (Shape::FirstLastPhone, Service::Phonecode)
        )
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Oracle trait
// ─────────────────────────────────────────────────────────────────────────────

/// Boxed future returned by oracle operations.
pub type OracleFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AppError>> + Send + 'a>>;

/// One method per remote batch operation, plus the software-version probe.
///
/// Implementations submit a whole batch in a single call and return the
/// oracle's result list; the list is keyed by id, its order is not
/// guaranteed, and ids may be missing.
pub trait NameOracle: Send + Sync {
    fn software_version(&self) -> OracleFuture<'_, String>;

    fn parse_batch<'a>(&'a self, names: &'a [PersonalName]) -> OracleFuture<'a, Vec<ParsedName>>;
    fn parse_geo_batch<'a>(
        &'a self,
        names: &'a [PersonalNameGeo],
    ) -> OracleFuture<'a, Vec<ParsedName>>;

    fn gender_batch<'a>(&'a self, names: &'a [FirstLastName])
        -> OracleFuture<'a, Vec<GenderedName>>;
    fn gender_geo_batch<'a>(
        &'a self,
        names: &'a [FirstLastNameGeo],
    ) -> OracleFuture<'a, Vec<GenderedName>>;
    fn gender_full_batch<'a>(
        &'a self,
        names: &'a [PersonalName],
    ) -> OracleFuture<'a, Vec<GenderedName>>;
    fn gender_full_geo_batch<'a>(
        &'a self,
        names: &'a [PersonalNameGeo],
    ) -> OracleFuture<'a, Vec<GenderedName>>;

    fn origin_batch<'a>(
        &'a self,
        names: &'a [FirstLastName],
    ) -> OracleFuture<'a, Vec<OriginatedName>>;

    fn country_batch<'a>(
        &'a self,
        names: &'a [PersonalName],
    ) -> OracleFuture<'a, Vec<CountriedName>>;

    fn diaspora_batch<'a>(
        &'a self,
        names: &'a [FirstLastNameGeo],
    ) -> OracleFuture<'a, Vec<DiasporaName>>;

    fn us_race_ethnicity_batch<'a>(
        &'a self,
        names: &'a [FirstLastNameGeo],
    ) -> OracleFuture<'a, Vec<UsRaceEthnicityName>>;

    fn phone_code_batch<'a>(
        &'a self,
        names: &'a [FirstLastNamePhone],
    ) -> OracleFuture<'a, Vec<PhoneCodedName>>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Adapter transforms
// ─────────────────────────────────────────────────────────────────────────────

/// Down-projects a geo-qualified record for the origin operation, which
/// predates geo-awareness.
fn strip_geo(name: &FirstLastNameGeo) -> FirstLastName {
    FirstLastName {
        id: name.id.clone(),
        first_name: name.first_name.clone(),
        last_name: name.last_name.clone(),
    }
}

/// Joins a split name into a full name for the country operation, which
/// only accepts full names.
fn join_full_name(name: &FirstLastName) -> PersonalName {
    PersonalName {
        id: name.id.clone(),
        name: format!("{} {}", name.first_name, name.last_name),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

/// Extracts the typed records of one shape out of a drained buffer.
macro_rules! collect_shape {
    ($records:expr, $variant:ident) => {
        $records
            .values()
            .filter_map(|r| match r {
                Record::$variant(inner) => Some(inner.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
    };
}

/// Submits one drained batch to the operation selected by (shape, service)
/// and correlates the results back by id.
///
/// The returned map covers every id the oracle answered for, which is not
/// necessarily every id submitted.
///
/// # Errors
///
/// Propagates the oracle's error; the caller decides whether that aborts
/// anything (the pipeline treats it as blank results, never as fatal).
pub async fn dispatch_batch(
    oracle: &dyn NameOracle,
    service: Service,
    shape: Shape,
    records: &HashMap<String, Record>,
) -> Result<HashMap<String, ScoredResult>, AppError> {
    let mut results = HashMap::with_capacity(records.len());
    match (shape, service) {
        (Shape::FirstLast, Service::Gender) => {
            let names = collect_shape!(records, FirstLast);
            for out in oracle.gender_batch(&names).await? {
                results.insert(out.id.clone(), ScoredResult::Gendered(out));
            }
        }
        (Shape::FirstLast, Service::Origin) => {
            let names = collect_shape!(records, FirstLast);
            for out in oracle.origin_batch(&names).await? {
                results.insert(out.id.clone(), ScoredResult::Originated(out));
            }
        }
        (Shape::FirstLast, Service::Country) => {
            let names = collect_shape!(records, FirstLast);
            let adapted: Vec<PersonalName> = names.iter().map(join_full_name).collect();
            for out in oracle.country_batch(&adapted).await? {
                results.insert(out.id.clone(), ScoredResult::Countried(out));
            }
        }
        (Shape::FirstLastGeo, Service::Gender) => {
            let names = collect_shape!(records, FirstLastGeo);
            for out in oracle.gender_geo_batch(&names).await? {
                results.insert(out.id.clone(), ScoredResult::Gendered(out));
            }
        }
        (Shape::FirstLastGeo, Service::Origin) => {
            let names = collect_shape!(records, FirstLastGeo);
            let adapted: Vec<FirstLastName> = names.iter().map(strip_geo).collect();
            for out in oracle.origin_batch(&adapted).await? {
                results.insert(out.id.clone(), ScoredResult::Originated(out));
            }
        }
        (Shape::FirstLastGeo, Service::Diaspora) => {
            let names = collect_shape!(records, FirstLastGeo);
            for out in oracle.diaspora_batch(&names).await? {
                results.insert(out.id.clone(), ScoredResult::Diaspora(out));
            }
        }
        (Shape::FirstLastGeo, Service::UsRaceEthnicity) => {
            let names = collect_shape!(records, FirstLastGeo);
            for out in oracle.us_race_ethnicity_batch(&names).await? {
                results.insert(out.id.clone(), ScoredResult::UsRaceEthnicity(out));
            }
        }
        (Shape::Personal, Service::Parse) => {
            let names = collect_shape!(records, Personal);
            for out in oracle.parse_batch(&names).await? {
                results.insert(out.id.clone(), ScoredResult::Parsed(out));
            }
        }
        (Shape::Personal, Service::Gender) => {
            let names = collect_shape!(records, Personal);
            for out in oracle.gender_full_batch(&names).await? {
                results.insert(out.id.clone(), ScoredResult::Gendered(out));
            }
        }
        (Shape::Personal, Service::Country) => {
            let names = collect_shape!(records, Personal);
            for out in oracle.country_batch(&names).await? {
                results.insert(out.id.clone(), ScoredResult::Countried(out));
            }
        }
        (Shape::PersonalGeo, Service::Parse) => {
            let names = collect_shape!(records, PersonalGeo);
            for out in oracle.parse_geo_batch(&names).await? {
                results.insert(out.id.clone(), ScoredResult::Parsed(out));
            }
        }
        (Shape::PersonalGeo, Service::Gender) => {
            let names = collect_shape!(records, PersonalGeo);
            for out in oracle.gender_full_geo_batch(&names).await? {
                results.insert(out.id.clone(), ScoredResult::Gendered(out));
            }
        }
        (Shape::FirstLastPhone, Service::Phonecode) => {
            let names = collect_shape!(records, FirstLastPhone);
            for out in oracle.phone_code_batch(&names).await? {
                results.insert(out.id.clone(), ScoredResult::PhoneCoded(out));
            }
        }
        _ => {
            // Validated at startup; kept as a typed error for library callers.
            return Err(AppError::UnsupportedService {
                service: service.key().into(),
                format: shape.to_string(),
            });
        }
    }
    Ok(results)
}
