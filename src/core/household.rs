use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "primaryRatio", rename_all = "camelCase")]
pub enum SplitMethod {
    #[default]
    Proportional,
    Equal,
    Custom(Decimal),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitResult {
    pub primary_ratio: Decimal,
    pub partner_ratio: Decimal,
    pub primary_amount: Decimal,
    pub partner_amount: Decimal,
}

pub fn split(
    primary_net: Decimal,
    partner_net: Decimal,
    shared_amount: Decimal,
    method: SplitMethod,
) -> SplitResult {
    let half = Decimal::new(5, 1);
    let primary_ratio = match method {
        SplitMethod::Proportional => {
            let total = primary_net + partner_net;
            if total.is_zero() {
                half
            } else {
                primary_net / total
            }
        }
        SplitMethod::Equal => half,
        SplitMethod::Custom(ratio) => ratio,
    };
    let partner_ratio = Decimal::ONE - primary_ratio;
    let primary_amount = shared_amount * primary_ratio;

    SplitResult {
        primary_ratio,
        partner_ratio,
        primary_amount,
        partner_amount: shared_amount - primary_amount,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedExpense {
    pub name: String,
    pub monthly_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_override: Option<SplitMethod>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Household {
    #[serde(default)]
    pub default_method: SplitMethod,
    #[serde(default)]
    pub expenses: Vec<SharedExpense>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSplit {
    pub name: String,
    pub method: SplitMethod,
    pub split: SplitResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdSplit {
    pub expenses: Vec<ExpenseSplit>,
    pub total_shared: Decimal,
    pub primary_total: Decimal,
    pub partner_total: Decimal,
}

impl Household {
    pub fn split_expenses(&self, primary_net: Decimal, partner_net: Decimal) -> HouseholdSplit {
        let expenses: Vec<ExpenseSplit> = self
            .expenses
            .iter()
            .map(|expense| {
                let method = expense.method_override.unwrap_or(self.default_method);
                ExpenseSplit {
                    name: expense.name.clone(),
                    method,
                    split: split(primary_net, partner_net, expense.monthly_amount, method),
                }
            })
            .collect();

        HouseholdSplit {
            total_shared: self.expenses.iter().map(|e| e.monthly_amount).sum(),
            primary_total: expenses.iter().map(|e| e.split.primary_amount).sum(),
            partner_total: expenses.iter().map(|e| e.split.partner_amount).sum(),
            expenses,
        }
    }
}
