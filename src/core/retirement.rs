use rust_decimal::Decimal;
use serde::Serialize;

use super::config::RetirementConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionRoom {
    pub base_limit: Decimal,
    pub catch_up: Decimal,
    pub total_limit: Decimal,
    pub contributed: Decimal,
    pub remaining: Decimal,
}

/// Remaining elective deferral room for the year. Catch-up applies from
/// `catch_up_age` on.
pub fn contribution_room(
    limits: &RetirementConfig,
    contributed: Decimal,
    age: u32,
) -> ContributionRoom {
    let catch_up = if age >= limits.catch_up_age {
        limits.catch_up_contribution
    } else {
        Decimal::ZERO
    };
    let total_limit = limits.elective_deferral_limit + catch_up;
    let contributed = contributed.max(Decimal::ZERO);

    ContributionRoom {
        base_limit: limits.elective_deferral_limit,
        catch_up,
        total_limit,
        contributed,
        remaining: (total_limit - contributed).max(Decimal::ZERO),
    }
}

/// Every account limit that applies to one person for the year.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementLimits {
    pub tax_year: u32,
    pub elective_deferral: ContributionRoom,
    pub ira: Decimal,
    pub hsa: Decimal,
}

pub fn retirement_limits(
    limits: &RetirementConfig,
    contributed: Decimal,
    age: u32,
    family_coverage: bool,
) -> RetirementLimits {
    RetirementLimits {
        tax_year: limits.tax_year,
        elective_deferral: contribution_room(limits, contributed, age),
        ira: ira_limit(limits, age),
        hsa: hsa_limit(limits, family_coverage),
    }
}

pub fn ira_limit(limits: &RetirementConfig, age: u32) -> Decimal {
    if age >= limits.catch_up_age {
        limits.ira_limit + limits.ira_catch_up
    } else {
        limits.ira_limit
    }
}

pub fn hsa_limit(limits: &RetirementConfig, family_coverage: bool) -> Decimal {
    if family_coverage {
        limits.hsa_family_limit
    } else {
        limits.hsa_self_limit
    }
}
