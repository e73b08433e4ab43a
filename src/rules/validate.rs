use rust_decimal::Decimal;

use super::TaxRuleSet;
use super::error::ValidationError;
use crate::core::{FilingStatus, UsState};

/// Parses a non-embedded payload and runs [`validate`] on it. Structural
/// bracket rules are enforced while parsing.
pub fn parse_payload(body: &[u8], expected_year: u32) -> Result<TaxRuleSet, ValidationError> {
    let rules: TaxRuleSet =
        serde_json::from_slice(body).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    validate(&rules, expected_year)?;
    Ok(rules)
}

pub fn validate(rules: &TaxRuleSet, expected_year: u32) -> Result<(), ValidationError> {
    if rules.version.trim().is_empty() {
        return Err(ValidationError::EmptyVersion);
    }

    for status in [FilingStatus::Single, FilingStatus::MarriedFilingJointly] {
        if !rules.federal.brackets.contains_key(&status) {
            return Err(ValidationError::MissingFederalSchedule(status));
        }
    }

    if rules.fica.social_security_rate <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveSocialSecurityRate);
    }

    if rules.states.states.is_empty() {
        return Err(ValidationError::NoStates);
    }
    let missing: Vec<UsState> = UsState::all()
        .iter()
        .copied()
        .filter(|state| !rules.states.states.contains_key(state))
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingStates(missing));
    }

    let sections = [
        ("payload", rules.tax_year),
        ("federal", rules.federal.tax_year),
        ("fica", rules.fica.tax_year),
        ("states", rules.states.tax_year),
        ("retirement", rules.retirement.tax_year),
    ];
    for (section, found) in sections {
        if found != expected_year {
            return Err(ValidationError::YearMismatch {
                section,
                expected: expected_year,
                found,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::embedded;
    use rust_decimal_macros::dec;

    fn valid() -> TaxRuleSet {
        embedded::load().expect("embedded rules")
    }

    #[test]
    fn embedded_rules_pass() {
        assert_eq!(validate(&valid(), 2024), Ok(()));
    }

    #[test]
    fn empty_state_map_is_rejected() {
        let mut rules = valid();
        rules.states.states.clear();
        assert_eq!(validate(&rules, 2024), Err(ValidationError::NoStates));
    }

    #[test]
    fn partial_state_map_is_rejected() {
        let mut rules = valid();
        rules
            .states
            .states
            .retain(|state, _| *state == UsState::Texas || *state == UsState::NewYork);
        match validate(&rules, 2024) {
            Err(ValidationError::MissingStates(missing)) => {
                assert_eq!(missing.len(), 49);
                assert!(missing.contains(&UsState::California));
                assert!(!missing.contains(&UsState::Texas));
            }
            other => panic!("expected missing states, got {other:?}"),
        }
    }

    #[test]
    fn single_missing_jurisdiction_is_named() {
        let mut rules = valid();
        rules.states.states.remove(&UsState::WashingtonDc);
        let err = validate(&rules, 2024).expect_err("DC missing");
        assert_eq!(
            err,
            ValidationError::MissingStates(vec![UsState::WashingtonDc])
        );
        assert!(err.to_string().contains("DC"));
    }

    #[test]
    fn blank_version_is_rejected() {
        let mut rules = valid();
        rules.version = "  ".into();
        assert_eq!(validate(&rules, 2024), Err(ValidationError::EmptyVersion));
    }

    #[test]
    fn joint_schedule_is_required() {
        let mut rules = valid();
        rules.federal.brackets.remove(&FilingStatus::MarriedFilingJointly);
        assert_eq!(
            validate(&rules, 2024),
            Err(ValidationError::MissingFederalSchedule(FilingStatus::MarriedFilingJointly))
        );
        // Optional statuses may be omitted.
        let mut rules = valid();
        rules.federal.brackets.remove(&FilingStatus::HeadOfHousehold);
        assert_eq!(validate(&rules, 2024), Ok(()));
    }

    #[test]
    fn zero_social_security_rate_is_rejected() {
        let mut rules = valid();
        rules.fica.social_security_rate = dec!(0);
        assert_eq!(
            validate(&rules, 2024),
            Err(ValidationError::NonPositiveSocialSecurityRate)
        );
    }

    #[test]
    fn other_year_is_rejected() {
        let mut rules = valid();
        rules.fica.tax_year = 2023;
        assert_eq!(
            validate(&rules, 2024),
            Err(ValidationError::YearMismatch {
                section: "fica",
                expected: 2024,
                found: 2023
            })
        );
    }

    #[test]
    fn payload_with_broken_brackets_fails_to_parse() {
        let mut json = serde_json::to_value(valid()).expect("to json");
        json["federal"]["brackets"]["single"][1]["floor"] = serde_json::json!("12000");
        let body = serde_json::to_vec(&json).expect("to bytes");
        assert!(matches!(
            parse_payload(&body, 2024),
            Err(ValidationError::Malformed(_))
        ));
    }

    #[test]
    fn round_tripped_payload_parses() {
        let body = serde_json::to_vec(&valid()).expect("to bytes");
        let parsed = parse_payload(&body, 2024).expect("valid payload");
        assert_eq!(parsed, valid());
    }
}
