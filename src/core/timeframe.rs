use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const WEEKS_PER_YEAR: i64 = 52;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Timeframe {
    Annual,
    Monthly,
    BiWeekly,
    SemiMonthly,
    Weekly,
    Daily,
    Hourly,
}

impl Timeframe {
    pub const ALL: [Timeframe; 7] = [
        Timeframe::Annual,
        Timeframe::Monthly,
        Timeframe::BiWeekly,
        Timeframe::SemiMonthly,
        Timeframe::Weekly,
        Timeframe::Daily,
        Timeframe::Hourly,
    ];

    /// Periods per year on a standard 40-hour, 5-day week.
    pub fn periods_per_year(self) -> Decimal {
        Decimal::from(match self {
            Timeframe::Annual => 1,
            Timeframe::Monthly => 12,
            Timeframe::BiWeekly => 26,
            Timeframe::SemiMonthly => 24,
            Timeframe::Weekly => 52,
            Timeframe::Daily => 260,
            Timeframe::Hourly => 2080,
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            Timeframe::Annual => "Annual",
            Timeframe::Monthly => "Monthly",
            Timeframe::BiWeekly => "Bi-Weekly",
            Timeframe::SemiMonthly => "Semi-Monthly",
            Timeframe::Weekly => "Weekly",
            Timeframe::Daily => "Daily",
            Timeframe::Hourly => "Hourly",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "annual" | "yearly" => Ok(Timeframe::Annual),
            "monthly" => Ok(Timeframe::Monthly),
            "biweekly" => Ok(Timeframe::BiWeekly),
            "semimonthly" => Ok(Timeframe::SemiMonthly),
            "weekly" => Ok(Timeframe::Weekly),
            "daily" => Ok(Timeframe::Daily),
            "hourly" => Ok(Timeframe::Hourly),
            _ => Err(format!("unknown timeframe: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeBreakdown {
    pub annual: Decimal,
    pub monthly: Decimal,
    pub bi_weekly: Decimal,
    pub semi_monthly: Decimal,
    pub weekly: Decimal,
    pub daily: Decimal,
    pub hourly: Decimal,
}

impl TimeframeBreakdown {
    pub fn get(&self, timeframe: Timeframe) -> Decimal {
        match timeframe {
            Timeframe::Annual => self.annual,
            Timeframe::Monthly => self.monthly,
            Timeframe::BiWeekly => self.bi_weekly,
            Timeframe::SemiMonthly => self.semi_monthly,
            Timeframe::Weekly => self.weekly,
            Timeframe::Daily => self.daily,
            Timeframe::Hourly => self.hourly,
        }
    }
}

pub fn to_all_timeframes(annual: Decimal) -> TimeframeBreakdown {
    TimeframeBreakdown {
        annual,
        monthly: annual / Timeframe::Monthly.periods_per_year(),
        bi_weekly: annual / Timeframe::BiWeekly.periods_per_year(),
        semi_monthly: annual / Timeframe::SemiMonthly.periods_per_year(),
        weekly: annual / Timeframe::Weekly.periods_per_year(),
        daily: annual / Timeframe::Daily.periods_per_year(),
        hourly: annual / Timeframe::Hourly.periods_per_year(),
    }
}

/// Same as [`to_all_timeframes`] but with daily and hourly figures derived
/// from a custom working week. Non-positive day or hour counts leave the
/// corresponding standard figure in place.
pub fn to_all_timeframes_with_schedule(
    annual: Decimal,
    hours_per_week: Decimal,
    days_per_week: Decimal,
) -> TimeframeBreakdown {
    let mut breakdown = to_all_timeframes(annual);
    let weeks = Decimal::from(WEEKS_PER_YEAR);
    if days_per_week > Decimal::ZERO {
        breakdown.daily = annual / (weeks * days_per_week);
    }
    if hours_per_week > Decimal::ZERO {
        breakdown.hourly = annual / (weeks * hours_per_week);
    }
    breakdown
}

pub fn convert(amount: Decimal, from: Timeframe, to: Timeframe) -> Decimal {
    if from == to {
        return amount;
    }
    let annual = amount * from.periods_per_year();
    annual / to.periods_per_year()
}

pub fn hours_to_earn(cost: Decimal, hourly_rate: Decimal) -> Decimal {
    if hourly_rate <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    cost / hourly_rate
}

pub fn days_to_earn(cost: Decimal, daily_rate: Decimal) -> Decimal {
    if daily_rate <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    cost / daily_rate
}
