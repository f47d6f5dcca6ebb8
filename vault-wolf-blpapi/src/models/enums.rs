//! Strongly-typed request parameter enums.
//!
//! Serde `rename` attributes and `Display` output match the provider's wire
//! strings exactly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::BlpApiError;

// ============================================================================
// Historical Data
// ============================================================================

/// Bar periodicity for historical data requests (`periodicitySelection`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Periodicity {
    #[default]
    #[serde(rename = "DAILY")]
    Daily,
    #[serde(rename = "WEEKLY")]
    Weekly,
    #[serde(rename = "MONTHLY")]
    Monthly,
    #[serde(rename = "QUARTERLY")]
    Quarterly,
    #[serde(rename = "SEMI-ANNUAL")]
    SemiAnnual,
    #[serde(rename = "YEARLY")]
    Yearly,
}

impl fmt::Display for Periodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "DAILY"),
            Self::Weekly => write!(f, "WEEKLY"),
            Self::Monthly => write!(f, "MONTHLY"),
            Self::Quarterly => write!(f, "QUARTERLY"),
            Self::SemiAnnual => write!(f, "SEMI-ANNUAL"),
            Self::Yearly => write!(f, "YEARLY"),
        }
    }
}

impl FromStr for Periodicity {
    type Err = BlpApiError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            "QUARTERLY" => Self::Quarterly,
            "SEMI-ANNUAL" => Self::SemiAnnual,
            "YEARLY" => Self::Yearly,
            other => {
                return Err(BlpApiError::InvalidArgument(format!(
                    "periodicity must be one of DAILY, WEEKLY, MONTHLY, QUARTERLY, SEMI-ANNUAL, YEARLY (got '{other}')"
                )))
            }
        })
    }
}

/// Which non-trading days get a row (`nonTradingDayFillOption`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NonTradingDayFillOption {
    #[serde(rename = "NON_TRADING_WEEKDAYS")]
    NonTradingWeekdays,
    #[serde(rename = "ALL_CALENDAR_DAYS")]
    AllCalendarDays,
    #[default]
    #[serde(rename = "ACTIVE_DAYS_ONLY")]
    ActiveDaysOnly,
}

impl fmt::Display for NonTradingDayFillOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonTradingWeekdays => write!(f, "NON_TRADING_WEEKDAYS"),
            Self::AllCalendarDays => write!(f, "ALL_CALENDAR_DAYS"),
            Self::ActiveDaysOnly => write!(f, "ACTIVE_DAYS_ONLY"),
        }
    }
}

impl FromStr for NonTradingDayFillOption {
    type Err = BlpApiError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "NON_TRADING_WEEKDAYS" => Self::NonTradingWeekdays,
            "ALL_CALENDAR_DAYS" => Self::AllCalendarDays,
            "ACTIVE_DAYS_ONLY" => Self::ActiveDaysOnly,
            other => {
                return Err(BlpApiError::InvalidArgument(format!(
                    "non-trading day fill option must be one of NON_TRADING_WEEKDAYS, ALL_CALENDAR_DAYS, ACTIVE_DAYS_ONLY (got '{other}')"
                )))
            }
        })
    }
}

/// How non-trading day rows are filled (`nonTradingDayFillMethod`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NonTradingDayFillMethod {
    #[serde(rename = "PREVIOUS_VALUE")]
    PreviousValue,
    #[default]
    #[serde(rename = "NIL_VALUE")]
    NilValue,
}

impl fmt::Display for NonTradingDayFillMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreviousValue => write!(f, "PREVIOUS_VALUE"),
            Self::NilValue => write!(f, "NIL_VALUE"),
        }
    }
}

impl FromStr for NonTradingDayFillMethod {
    type Err = BlpApiError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "PREVIOUS_VALUE" => Self::PreviousValue,
            "NIL_VALUE" => Self::NilValue,
            other => {
                return Err(BlpApiError::InvalidArgument(format!(
                    "non-trading day fill method must be PREVIOUS_VALUE or NIL_VALUE (got '{other}')"
                )))
            }
        })
    }
}

// ============================================================================
// Intraday Bars
// ============================================================================

/// Tick stream an intraday bar request aggregates (`eventType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IntradayEventType {
    #[default]
    #[serde(rename = "TRADE")]
    Trade,
    #[serde(rename = "BID")]
    Bid,
    #[serde(rename = "ASK")]
    Ask,
    #[serde(rename = "BEST_BID")]
    BestBid,
    #[serde(rename = "BEST_ASK")]
    BestAsk,
}

impl fmt::Display for IntradayEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trade => write!(f, "TRADE"),
            Self::Bid => write!(f, "BID"),
            Self::Ask => write!(f, "ASK"),
            Self::BestBid => write!(f, "BEST_BID"),
            Self::BestAsk => write!(f, "BEST_ASK"),
        }
    }
}

impl FromStr for IntradayEventType {
    type Err = BlpApiError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "TRADE" => Self::Trade,
            "BID" => Self::Bid,
            "ASK" => Self::Ask,
            "BEST_BID" => Self::BestBid,
            "BEST_ASK" => Self::BestAsk,
            other => {
                return Err(BlpApiError::InvalidArgument(format!(
                    "event type must be one of TRADE, BID, ASK, BEST_BID, BEST_ASK (got '{other}')"
                )))
            }
        })
    }
}
