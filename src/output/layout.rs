//! Fixed output column layouts, one per service.
//!
//! The shape↔layout compatibility matrix is constant data, not branching
//! logic: getting a single column wrong silently corrupts downstream
//! alignment, so the tables are kept auditable in one place.

use crate::api::Service;

pub const PARSE_HEADERS: &[&str] = &[
    "firstNameParsed",
    "lastNameParsed",
    "nameParserType",
    "nameParserTypeAlt",
    "nameParserTypeScore",
    "script",
];

pub const GENDER_HEADERS: &[&str] = &[
    "likelyGender",
    "likelyGenderScore",
    "probabilityCalibrated",
    "genderScale",
    "script",
];

pub const ORIGIN_HEADERS: &[&str] = &[
    "countryOrigin",
    "countryOriginAlt",
    "probabilityCalibrated",
    "probabilityCalibratedAlt",
    "countryOriginScore",
    "script",
];

pub const COUNTRY_HEADERS: &[&str] = &[
    "country",
    "countryAlt",
    "probabilityCalibrated",
    "probabilityCalibratedAlt",
    "countryScore",
    "script",
];

pub const DIASPORA_HEADERS: &[&str] =
    &["ethnicity", "ethnicityAlt", "ethnicityScore", "script"];

pub const USRACEETHNICITY_HEADERS: &[&str] = &[
    "raceEthnicity",
    "raceEthnicityAlt",
    "probabilityCalibrated",
    "probabilityCalibratedAlt",
    "raceEthnicityScore",
    "script",
];

pub const PHONECODE_HEADERS: &[&str] = &[
    "internationalPhoneNumberVerified",
    "phoneCountryIso2Verified",
    "phoneCountryCode",
    "phoneCountryCodeAlt",
    "phoneCountryIso2",
    "phoneCountryIso2Alt",
    "originCountryIso2",
    "originCountryIso2Alt",
    "verified",
    "score",
    "script",
];

/// Output column names for a service, in row order.
pub fn output_headers(service: Service) -> &'static [&'static str] {
    match service {
        Service::Parse => PARSE_HEADERS,
        Service::Gender => GENDER_HEADERS,
        Service::Origin => ORIGIN_HEADERS,
        Service::Country => COUNTRY_HEADERS,
        Service::Diaspora => DIASPORA_HEADERS,
        Service::UsRaceEthnicity => USRACEETHNICITY_HEADERS,
        Service::Phonecode => PHONECODE_HEADERS,
    }
}
