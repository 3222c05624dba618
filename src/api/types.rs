//! Wire types for the Onoma batch API.
//!
//! Responses use `#[serde(default)]` liberally: the API omits fields it has
//! no value for, and a missing field must never fail a whole batch.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Batch envelopes
// ─────────────────────────────────────────────────────────────────────────────

/// Request envelope for name batch operations.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchNamesIn<T> {
    pub personal_names: Vec<T>,
}

/// Response envelope for name batch operations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchNamesOut<T> {
    #[serde(default = "Vec::new")]
    pub personal_names: Vec<T>,
}

/// Request envelope for the phone-code batch operation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPhoneNamesIn<T> {
    pub personal_names_with_phone_numbers: Vec<T>,
}

/// Response envelope for the phone-code batch operation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPhoneNamesOut<T> {
    #[serde(default = "Vec::new")]
    pub personal_names_with_phone_numbers: Vec<T>,
}

/// Response of the software-version endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareVersionOut {
    pub software_name_and_version: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Result shapes
// ─────────────────────────────────────────────────────────────────────────────

/// Result of the name-parse operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedName {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub first_last_name: ParsedNameParts,
    #[serde(default)]
    pub name_parser_type: String,
    #[serde(default)]
    pub name_parser_type_alt: String,
    #[serde(default)]
    pub score: f64,
}

/// The first/last split inside a parse result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedNameParts {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Result of the gender operations (split and full-name variants share it).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenderedName {
    pub id: String,
    #[serde(default)]
    pub likely_gender: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub probability_calibrated: f64,
    #[serde(default)]
    pub gender_scale: f64,
}

/// Result of the origin operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginatedName {
    pub id: String,
    #[serde(default)]
    pub country_origin: String,
    #[serde(default)]
    pub country_origin_alt: String,
    #[serde(default)]
    pub probability_calibrated: f64,
    #[serde(default)]
    pub probability_alt_calibrated: f64,
    #[serde(default)]
    pub score: f64,
}

/// Result of the country (residence) operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountriedName {
    pub id: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub country_alt: String,
    #[serde(default)]
    pub probability_calibrated: f64,
    #[serde(default)]
    pub probability_alt_calibrated: f64,
    #[serde(default)]
    pub score: f64,
}

/// Result of the diaspora operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiasporaName {
    pub id: String,
    #[serde(default)]
    pub ethnicity: String,
    #[serde(default)]
    pub ethnicity_alt: String,
    #[serde(default)]
    pub score: f64,
}

/// Result of the US race/ethnicity operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsRaceEthnicityName {
    pub id: String,
    #[serde(default)]
    pub race_ethnicity: String,
    #[serde(default)]
    pub race_ethnicity_alt: String,
    #[serde(default)]
    pub probability_calibrated: f64,
    #[serde(default)]
    pub probability_alt_calibrated: f64,
    #[serde(default)]
    pub score: f64,
}

/// Result of the phone-code operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneCodedName {
    pub id: String,
    #[serde(default)]
    pub international_phone_number_verified: String,
    #[serde(default)]
    pub phone_country_iso2_verified: String,
    #[serde(default)]
    pub phone_country_code: i64,
    #[serde(default)]
    pub phone_country_code_alt: i64,
    #[serde(default)]
    pub phone_country_iso2: String,
    #[serde(default)]
    pub phone_country_iso2_alt: String,
    #[serde(default)]
    pub origin_country_iso2: String,
    #[serde(default)]
    pub origin_country_iso2_alt: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub score: f64,
}

/// A batch result, tagged by the shape the requested service produces.
#[derive(Debug, Clone)]
pub enum ScoredResult {
    Parsed(ParsedName),
    Gendered(GenderedName),
    Originated(OriginatedName),
    Countried(CountriedName),
    Diaspora(DiasporaName),
    UsRaceEthnicity(UsRaceEthnicityName),
    PhoneCoded(PhoneCodedName),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_fields_default_when_omitted() {
        let json = r#"{"personalNames":[{"id":"uid1","likelyGender":"female"}]}"#;
        let out: BatchNamesOut<GenderedName> = serde_json::from_str(json).unwrap();
        assert_eq!(out.personal_names.len(), 1);
        let name = &out.personal_names[0];
        assert_eq!(name.likely_gender, "female");
        assert_eq!(name.score, 0.0);
        assert_eq!(name.probability_calibrated, 0.0);
    }

    #[test]
    fn empty_response_body_yields_no_names() {
        let out: BatchNamesOut<GenderedName> = serde_json::from_str("{}").unwrap();
        assert!(out.personal_names.is_empty());
    }

    #[test]
    fn parse_result_carries_nested_split() {
        let json = r#"{"id":"uid1","name":"John Doe",
            "firstLastName":{"firstName":"John","lastName":"Doe"},
            "nameParserType":"FN1LN1","score":1.5}"#;
        let parsed: ParsedName = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.first_last_name.first_name, "John");
        assert_eq!(parsed.first_last_name.last_name, "Doe");
        assert_eq!(parsed.name_parser_type, "FN1LN1");
    }

    #[test]
    fn phone_envelope_uses_its_own_key() {
        let json = r#"{"personalNamesWithPhoneNumbers":[{"id":"uid1","verified":true,
            "phoneCountryCode":33}]}"#;
        let out: BatchPhoneNamesOut<PhoneCodedName> = serde_json::from_str(json).unwrap();
        assert!(out.personal_names_with_phone_numbers[0].verified);
        assert_eq!(out.personal_names_with_phone_numbers[0].phone_country_code, 33);
    }

    #[test]
    fn request_envelope_serializes_camel_case() {
        let body = BatchNamesIn {
            personal_names: vec![crate::record::PersonalName {
                id: "uid1".into(),
                name: "John Doe".into(),
            }],
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"personalNames\""));
        assert!(json.contains("\"name\":\"John Doe\""));
    }
}
