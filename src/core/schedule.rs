//! Progressive rate schedules and the bracket evaluator shared by the
//! federal and state calculators.
//!
//! A [`RateSchedule`] can only exist in a well-formed shape: it starts at
//! zero, its brackets are contiguous, only the last one is open-ended and
//! every `base_tax` equals the exact cumulative tax of the brackets below it.
//! The evaluator relies on that to answer with the base-tax formula while the
//! per-bracket breakdown is summed independently.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<Decimal>", into = "Option<Decimal>")]
pub enum Ceiling {
    At(Decimal),
    Unbounded,
}

impl Ceiling {
    pub fn value(self) -> Option<Decimal> {
        match self {
            Ceiling::At(value) => Some(value),
            Ceiling::Unbounded => None,
        }
    }
}

impl From<Option<Decimal>> for Ceiling {
    fn from(value: Option<Decimal>) -> Self {
        value.map_or(Ceiling::Unbounded, Ceiling::At)
    }
}

impl From<Ceiling> for Option<Decimal> {
    fn from(value: Ceiling) -> Self {
        value.value()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBracket {
    pub floor: Decimal,
    pub ceiling: Ceiling,
    pub rate: Decimal,
    pub base_tax: Decimal,
}

impl TaxBracket {
    fn width_below(&self, income: Decimal) -> Decimal {
        let upper = match self.ceiling {
            Ceiling::At(ceiling) => income.min(ceiling),
            Ceiling::Unbounded => income,
        };
        upper - self.floor
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("rate schedule has no brackets")]
    Empty,
    #[error("first bracket must start at 0, found {0}")]
    NonZeroStart(Decimal),
    #[error("bracket {index} rate {rate} is outside [0, 1]")]
    RateOutOfRange { index: usize, rate: Decimal },
    #[error("bracket {index} ceiling {ceiling} does not exceed its floor {floor}")]
    EmptyBracket {
        index: usize,
        floor: Decimal,
        ceiling: Decimal,
    },
    #[error("bracket {index} starts at {floor} but the previous bracket ends at {expected}")]
    Gap {
        index: usize,
        floor: Decimal,
        expected: Decimal,
    },
    #[error("bracket {index} is open-ended but is not the top bracket")]
    OpenBeforeTop { index: usize },
    #[error("top bracket must be open-ended")]
    BoundedTop,
    #[error("bracket {index} base tax {found} does not match cumulative tax {expected}")]
    BaseTaxMismatch {
        index: usize,
        found: Decimal,
        expected: Decimal,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TaxBracket>", into = "Vec<TaxBracket>")]
pub struct RateSchedule {
    brackets: Vec<TaxBracket>,
}

impl RateSchedule {
    pub fn new(brackets: Vec<TaxBracket>) -> Result<Self, ScheduleError> {
        let first = brackets.first().ok_or(ScheduleError::Empty)?;
        if !first.floor.is_zero() {
            return Err(ScheduleError::NonZeroStart(first.floor));
        }

        let last_index = brackets.len() - 1;
        let mut expected_base = Decimal::ZERO;
        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(ScheduleError::RateOutOfRange {
                    index,
                    rate: bracket.rate,
                });
            }
            if bracket.base_tax != expected_base {
                return Err(ScheduleError::BaseTaxMismatch {
                    index,
                    found: bracket.base_tax,
                    expected: expected_base,
                });
            }
            match bracket.ceiling {
                Ceiling::At(ceiling) => {
                    if index == last_index {
                        return Err(ScheduleError::BoundedTop);
                    }
                    if ceiling <= bracket.floor {
                        return Err(ScheduleError::EmptyBracket {
                            index,
                            floor: bracket.floor,
                            ceiling,
                        });
                    }
                    let next = &brackets[index + 1];
                    if next.floor != ceiling {
                        return Err(ScheduleError::Gap {
                            index: index + 1,
                            floor: next.floor,
                            expected: ceiling,
                        });
                    }
                    expected_base += (ceiling - bracket.floor) * bracket.rate;
                }
                Ceiling::Unbounded => {
                    if index != last_index {
                        return Err(ScheduleError::OpenBeforeTop { index });
                    }
                }
            }
        }

        Ok(Self { brackets })
    }

    /// Builds a schedule from `(floor, rate)` pairs, deriving each ceiling
    /// from the next floor and each base tax from the brackets below.
    pub fn from_rates(rates: &[(Decimal, Decimal)]) -> Result<Self, ScheduleError> {
        let mut brackets = Vec::with_capacity(rates.len());
        let mut base_tax = Decimal::ZERO;
        for (index, &(floor, rate)) in rates.iter().enumerate() {
            let ceiling = rates.get(index + 1).map(|&(next, _)| next).into();
            brackets.push(TaxBracket {
                floor,
                ceiling,
                rate,
                base_tax,
            });
            if let Ceiling::At(ceiling) = ceiling {
                base_tax += (ceiling - floor) * rate;
            }
        }
        Self::new(brackets)
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    pub fn first_rate(&self) -> Decimal {
        self.brackets[0].rate
    }

    pub fn top_rate(&self) -> Decimal {
        self.brackets[self.brackets.len() - 1].rate
    }

    /// Bracket with the greatest floor at or below `income`.
    pub fn bracket_for(&self, income: Decimal) -> &TaxBracket {
        self.brackets
            .iter()
            .rev()
            .find(|bracket| bracket.floor <= income)
            .unwrap_or(&self.brackets[0])
    }

    pub fn evaluate(&self, taxable_income: Decimal) -> ScheduleEvaluation {
        if taxable_income <= Decimal::ZERO {
            return ScheduleEvaluation {
                tax: Decimal::ZERO,
                marginal_rate: self.first_rate(),
                effective_rate: Decimal::ZERO,
                breakdown: Vec::new(),
            };
        }

        let bracket = self.bracket_for(taxable_income);
        let tax = bracket.base_tax + (taxable_income - bracket.floor) * bracket.rate;

        ScheduleEvaluation {
            tax,
            marginal_rate: bracket.rate,
            effective_rate: tax / taxable_income,
            breakdown: self.breakdown(taxable_income),
        }
    }

    pub fn breakdown(&self, taxable_income: Decimal) -> Vec<BracketAmount> {
        self.brackets
            .iter()
            .filter(|bracket| bracket.floor < taxable_income)
            .map(|bracket| {
                let taxable_in_bracket = bracket.width_below(taxable_income);
                BracketAmount {
                    floor: bracket.floor,
                    ceiling: bracket.ceiling,
                    rate: bracket.rate,
                    taxable_in_bracket,
                    tax: taxable_in_bracket * bracket.rate,
                }
            })
            .collect()
    }
}

impl TryFrom<Vec<TaxBracket>> for RateSchedule {
    type Error = ScheduleError;

    fn try_from(brackets: Vec<TaxBracket>) -> Result<Self, Self::Error> {
        Self::new(brackets)
    }
}

impl From<RateSchedule> for Vec<TaxBracket> {
    fn from(schedule: RateSchedule) -> Self {
        schedule.brackets
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketAmount {
    pub floor: Decimal,
    pub ceiling: Ceiling,
    pub rate: Decimal,
    pub taxable_in_bracket: Decimal,
    pub tax: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEvaluation {
    pub tax: Decimal,
    pub marginal_rate: Decimal,
    pub effective_rate: Decimal,
    pub breakdown: Vec<BracketAmount>,
}

impl ScheduleEvaluation {
    pub fn breakdown_total(&self) -> Decimal {
        self.breakdown.iter().map(|amount| amount.tax).sum()
    }
}
