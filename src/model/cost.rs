// CostEstimate and the billing period it covers
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use chrono::{
    Datelike,
    Days,
    Months,
    NaiveDate,
};
use serde::Serialize;
use std::fmt;

/// A billing period, `start` inclusive and `end` exclusive.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct BillingPeriod {
    /// First day of the period.
    pub start: NaiveDate,

    /// Day after the last day of the period.
    pub end: NaiveDate,
}

impl BillingPeriod {
    /// The month-to-date period containing `today`.
    ///
    /// The period runs from the first of the month up to and including
    /// `today`, and never past the end of the month.
    pub fn containing(today: NaiveDate) -> Self {
        let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
            .unwrap_or(today);

        let next_month = start
            .checked_add_months(Months::new(1))
            .unwrap_or(start);

        let tomorrow = today.succ_opt().unwrap_or(today);

        Self {
            start,
            end: tomorrow.min(next_month),
        }
    }

    /// The end of this period, at most `days` days long.
    pub fn last_days(&self, days: u64) -> Self {
        let earliest = self.end
            .checked_sub_days(Days::new(days))
            .unwrap_or(self.start);

        Self {
            start: self.start.max(earliest),
            end:   self.end,
        }
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d"),
        )
    }
}

/// Whether cost data exists for a bucket.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    /// A numeric amount was returned.
    Available,

    /// Resource level cost data is not enabled for the account.
    Disabled,

    /// Cost data is enabled but hasn't propagated yet.
    Pending,
}

/// The value of a cost lookup.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "availability", rename_all = "lowercase")]
pub enum Cost {
    /// An amount in the given currency.
    Available {
        /// Estimated cost for the period.
        amount: f64,

        /// Currency code, such as `USD`.
        currency: String,
    },

    /// Resource level cost data is not enabled for the account.
    Disabled,

    /// Cost data is enabled but hasn't propagated yet.
    Pending,
}

impl Cost {
    /// The availability state of this cost.
    pub fn availability(&self) -> Availability {
        match self {
            Self::Available { .. } => Availability::Available,
            Self::Disabled         => Availability::Disabled,
            Self::Pending          => Availability::Pending,
        }
    }
}

/// Estimated cost of one bucket for a billing period.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CostEstimate {
    /// Bucket the estimate belongs to.
    pub bucket: String,

    /// Period the estimate covers.
    pub period: BillingPeriod,

    /// The estimate itself.
    pub cost: Cost,
}

impl CostEstimate {
    /// Amount and currency, if available.
    pub fn amount(&self) -> Option<(f64, &str)> {
        match &self.cost {
            Cost::Available { amount, currency } => Some((*amount, currency)),
            _                                    => None,
        }
    }
}
