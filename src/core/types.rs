use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use super::schedule::BracketAmount;
use super::timeframe::TimeframeBreakdown;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    #[default]
    Single,
    MarriedFilingJointly,
    MarriedFilingSeparately,
    HeadOfHousehold,
    #[serde(alias = "qualifying_widow")]
    QualifyingWidower,
}

impl FilingStatus {
    pub const ALL: [FilingStatus; 5] = [
        FilingStatus::Single,
        FilingStatus::MarriedFilingJointly,
        FilingStatus::MarriedFilingSeparately,
        FilingStatus::HeadOfHousehold,
        FilingStatus::QualifyingWidower,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::MarriedFilingJointly => "married_filing_jointly",
            FilingStatus::MarriedFilingSeparately => "married_filing_separately",
            FilingStatus::HeadOfHousehold => "head_of_household",
            FilingStatus::QualifyingWidower => "qualifying_widower",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            FilingStatus::Single => "Single",
            FilingStatus::MarriedFilingJointly => "Married Filing Jointly",
            FilingStatus::MarriedFilingSeparately => "Married Filing Separately",
            FilingStatus::HeadOfHousehold => "Head of Household",
            FilingStatus::QualifyingWidower => "Qualifying Widow(er)",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            FilingStatus::Single => "Single",
            FilingStatus::MarriedFilingJointly => "MFJ",
            FilingStatus::MarriedFilingSeparately => "MFS",
            FilingStatus::HeadOfHousehold => "HoH",
            FilingStatus::QualifyingWidower => "QW",
        }
    }

    /// Status whose federal table a rule document may stand in with when it
    /// omits this one. Single and MFJ are mandatory and have no fallback.
    pub(crate) fn federal_fallback(self) -> Option<FilingStatus> {
        match self {
            FilingStatus::Single | FilingStatus::MarriedFilingJointly => None,
            FilingStatus::MarriedFilingSeparately | FilingStatus::HeadOfHousehold => {
                Some(FilingStatus::Single)
            }
            FilingStatus::QualifyingWidower => Some(FilingStatus::MarriedFilingJointly),
        }
    }
}

impl FromStr for FilingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "single" | "s" => Ok(FilingStatus::Single),
            "married_filing_jointly" | "mfj" => Ok(FilingStatus::MarriedFilingJointly),
            "married_filing_separately" | "mfs" => Ok(FilingStatus::MarriedFilingSeparately),
            "head_of_household" | "hoh" => Ok(FilingStatus::HeadOfHousehold),
            "qualifying_widower" | "qualifying_widow" | "qw" => Ok(FilingStatus::QualifyingWidower),
            _ => Err(format!("unknown filing status: {s}")),
        }
    }
}

macro_rules! us_states {
    ($($variant:ident => $code:literal, $name:literal;)+) => {
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub enum UsState {
            $($variant,)+
        }

        impl UsState {
            const ALL: &'static [UsState] = &[$(UsState::$variant,)+];

            pub fn code(self) -> &'static str {
                match self {
                    $(UsState::$variant => $code,)+
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(UsState::$variant => $name,)+
                }
            }

            pub fn from_code(code: &str) -> Option<UsState> {
                match code.trim().to_ascii_uppercase().as_str() {
                    $($code => Some(UsState::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

us_states! {
    Alabama => "AL", "Alabama";
    Alaska => "AK", "Alaska";
    Arizona => "AZ", "Arizona";
    Arkansas => "AR", "Arkansas";
    California => "CA", "California";
    Colorado => "CO", "Colorado";
    Connecticut => "CT", "Connecticut";
    Delaware => "DE", "Delaware";
    Florida => "FL", "Florida";
    Georgia => "GA", "Georgia";
    Hawaii => "HI", "Hawaii";
    Idaho => "ID", "Idaho";
    Illinois => "IL", "Illinois";
    Indiana => "IN", "Indiana";
    Iowa => "IA", "Iowa";
    Kansas => "KS", "Kansas";
    Kentucky => "KY", "Kentucky";
    Louisiana => "LA", "Louisiana";
    Maine => "ME", "Maine";
    Maryland => "MD", "Maryland";
    Massachusetts => "MA", "Massachusetts";
    Michigan => "MI", "Michigan";
    Minnesota => "MN", "Minnesota";
    Mississippi => "MS", "Mississippi";
    Missouri => "MO", "Missouri";
    Montana => "MT", "Montana";
    Nebraska => "NE", "Nebraska";
    Nevada => "NV", "Nevada";
    NewHampshire => "NH", "New Hampshire";
    NewJersey => "NJ", "New Jersey";
    NewMexico => "NM", "New Mexico";
    NewYork => "NY", "New York";
    NorthCarolina => "NC", "North Carolina";
    NorthDakota => "ND", "North Dakota";
    Ohio => "OH", "Ohio";
    Oklahoma => "OK", "Oklahoma";
    Oregon => "OR", "Oregon";
    Pennsylvania => "PA", "Pennsylvania";
    RhodeIsland => "RI", "Rhode Island";
    SouthCarolina => "SC", "South Carolina";
    SouthDakota => "SD", "South Dakota";
    Tennessee => "TN", "Tennessee";
    Texas => "TX", "Texas";
    Utah => "UT", "Utah";
    Vermont => "VT", "Vermont";
    Virginia => "VA", "Virginia";
    Washington => "WA", "Washington";
    WashingtonDc => "DC", "Washington D.C.";
    WestVirginia => "WV", "West Virginia";
    Wisconsin => "WI", "Wisconsin";
    Wyoming => "WY", "Wyoming";
}

impl UsState {
    pub fn all() -> &'static [UsState] {
        Self::ALL
    }
}

impl Default for UsState {
    fn default() -> Self {
        UsState::California
    }
}

impl fmt::Display for UsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for UsState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UsState::from_code(s).ok_or_else(|| format!("unknown state code: {s}"))
    }
}

impl Serialize for UsState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for UsState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CodeVisitor;

        impl de::Visitor<'_> for CodeVisitor {
            type Value = UsState;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a two-letter US state code")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<UsState, E> {
                UsState::from_code(v).ok_or_else(|| E::custom(format!("unknown state code: {v}")))
            }
        }

        deserializer.deserialize_str(CodeVisitor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaxCalculationInput {
    pub gross_income: Decimal,
    pub filing_status: FilingStatus,
    pub state: UsState,
    pub pre_tax_deductions: Decimal,
    pub post_tax_deductions: Decimal,
    #[serde(rename = "traditional401k")]
    pub traditional_401k: Decimal,
    #[serde(rename = "roth401k")]
    pub roth_401k: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FederalTaxResult {
    pub taxable_income: Decimal,
    pub tax: Decimal,
    pub marginal_rate: Decimal,
    pub effective_rate: Decimal,
    pub bracket_breakdown: Vec<BracketAmount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StateIncomeTaxDetail {
    None,
    Flat {
        rate: Decimal,
    },
    #[serde(rename_all = "camelCase")]
    Progressive {
        standard_deduction: Decimal,
        adjusted_income: Decimal,
        marginal_rate: Decimal,
        bracket_breakdown: Vec<BracketAmount>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateTaxResult {
    pub state: UsState,
    pub taxable_income: Decimal,
    pub income_tax: Decimal,
    pub sdi: Decimal,
    pub local_tax: Decimal,
    pub total_tax: Decimal,
    pub effective_rate: Decimal,
    pub detail: StateIncomeTaxDetail,
}

impl StateTaxResult {
    pub(crate) fn zero(state: UsState, taxable_income: Decimal) -> Self {
        Self {
            state,
            taxable_income,
            income_tax: Decimal::ZERO,
            sdi: Decimal::ZERO,
            local_tax: Decimal::ZERO,
            total_tax: Decimal::ZERO,
            effective_rate: Decimal::ZERO,
            detail: StateIncomeTaxDetail::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FicaResult {
    pub social_security: Decimal,
    pub social_security_wage_base: Decimal,
    pub medicare: Decimal,
    pub additional_medicare: Decimal,
    pub additional_medicare_threshold: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveRates {
    pub federal: Decimal,
    pub state: Decimal,
    pub fica: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxCalculationResult {
    pub year: u32,
    pub gross_income: Decimal,
    pub total_pre_tax: Decimal,
    pub federal_taxable_income: Decimal,
    pub federal_standard_deduction: Decimal,
    pub state_taxable_income: Decimal,
    pub federal: FederalTaxResult,
    pub state: StateTaxResult,
    pub fica: FicaResult,
    pub total_post_tax: Decimal,
    pub total_taxes: Decimal,
    pub net: Decimal,
    pub take_home_percentage: Decimal,
    pub effective_rates: EffectiveRates,
    pub timeframes: TimeframeBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioComparison {
    pub base: TaxCalculationResult,
    pub scenario: TaxCalculationResult,
    pub net_difference: Decimal,
    pub monthly_difference: Decimal,
}

impl ScenarioComparison {
    pub fn is_improvement(&self) -> bool {
        self.net_difference > Decimal::ZERO
    }

    pub fn net_difference_percent(&self) -> Decimal {
        if self.base.net > Decimal::ZERO {
            self.net_difference / self.base.net * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_table_covers_fifty_one_jurisdictions() {
        assert_eq!(UsState::all().len(), 51);
        let mut codes: Vec<&str> = UsState::all().iter().map(|s| s.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 51);
    }

    #[test]
    fn state_codes_parse_case_insensitively() {
        assert_eq!(UsState::from_code("ca"), Some(UsState::California));
        assert_eq!(UsState::from_code(" dc "), Some(UsState::WashingtonDc));
        assert_eq!(UsState::from_code("XX"), None);
        for state in UsState::all() {
            assert_eq!(UsState::from_code(state.code()), Some(*state));
        }
    }

    #[test]
    fn state_serializes_as_code_including_map_keys() {
        let json = serde_json::to_string(&UsState::NewYork).expect("serialize");
        assert_eq!(json, "\"NY\"");

        let mut map = std::collections::BTreeMap::new();
        map.insert(UsState::Texas, 1);
        let json = serde_json::to_string(&map).expect("serialize map");
        assert_eq!(json, "{\"TX\":1}");
        let back: std::collections::BTreeMap<UsState, i32> =
            serde_json::from_str(&json).expect("deserialize map");
        assert_eq!(back.get(&UsState::Texas), Some(&1));
    }

    #[test]
    fn filing_status_parses_common_spellings() {
        assert_eq!("MFJ".parse::<FilingStatus>(), Ok(FilingStatus::MarriedFilingJointly));
        assert_eq!(
            "head-of-household".parse::<FilingStatus>(),
            Ok(FilingStatus::HeadOfHousehold)
        );
        assert!("widowed".parse::<FilingStatus>().is_err());
    }

    #[test]
    fn calculation_input_reads_camel_case_with_defaults() {
        let input: TaxCalculationInput = serde_json::from_str(
            r#"{"grossIncome":"85000","state":"TX","filingStatus":"married_filing_jointly","traditional401k":"5000"}"#,
        )
        .expect("valid input json");
        assert_eq!(input.gross_income, Decimal::from(85_000));
        assert_eq!(input.state, UsState::Texas);
        assert_eq!(input.filing_status, FilingStatus::MarriedFilingJointly);
        assert_eq!(input.traditional_401k, Decimal::from(5_000));
        assert_eq!(input.roth_401k, Decimal::ZERO);
    }
}
