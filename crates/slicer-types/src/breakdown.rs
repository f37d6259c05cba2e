use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a breakdown property lives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropCategory {
    #[default]
    Event,
    User,
}

/// Value type of a breakdown property
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropType {
    #[default]
    Categorical,
    Numerical,
    Datetime,
}

/// Time-bucket resolution for datetime breakdowns and date axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Hour,
    #[serde(alias = "date")]
    Day,
    Week,
    Month,
    Quarter,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Quarter => "quarter",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            Granularity::Hour,
            Granularity::Day,
            Granularity::Week,
            Granularity::Month,
            Granularity::Quarter,
        ]
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(Granularity::Hour),
            "day" | "date" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            "quarter" => Ok(Granularity::Quarter),
            _ => Err(format!("Unknown granularity: {}", s)),
        }
    }
}

/// One breakdown dimension of a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownSpec {
    #[serde(alias = "pr")]
    pub property: String,
    #[serde(default, alias = "en", alias = "prop_category")]
    pub prop_category: PropCategory,
    #[serde(default, alias = "pty", alias = "prop_type")]
    pub prop_type: PropType,
    #[serde(default, alias = "grn", skip_serializing_if = "Option::is_none")]
    pub granularity: Option<Granularity>,
}

impl BreakdownSpec {
    pub fn categorical(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            prop_category: PropCategory::Event,
            prop_type: PropType::Categorical,
            granularity: None,
        }
    }

    pub fn numerical(property: impl Into<String>) -> Self {
        Self {
            prop_type: PropType::Numerical,
            ..Self::categorical(property)
        }
    }

    pub fn datetime(property: impl Into<String>, granularity: Granularity) -> Self {
        Self {
            prop_type: PropType::Datetime,
            granularity: Some(granularity),
            ..Self::categorical(property)
        }
    }

    pub fn with_category(mut self, category: PropCategory) -> Self {
        self.prop_category = category;
        self
    }

    /// Granularity applied when formatting this dimension's cells.
    /// Only datetime properties are bucketed.
    pub fn effective_granularity(&self) -> Option<Granularity> {
        match self.prop_type {
            PropType::Datetime => self.granularity,
            _ => None,
        }
    }
}

/// Key of the `position`-th breakdown dimension.
///
/// Includes the position so that the same property used twice still maps to
/// two distinct dimensions.
pub fn dimension_key(property: &str, position: usize) -> String {
    format!("{} - {}", property, position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granularity_parses_date_alias() {
        assert_eq!("date".parse::<Granularity>(), Ok(Granularity::Day));
        assert!("fortnight".parse::<Granularity>().is_err());

        let spec: BreakdownSpec =
            serde_json::from_str(r#"{"pr": "$timestamp", "pty": "datetime", "grn": "date"}"#)
                .unwrap();
        assert_eq!(spec.granularity, Some(Granularity::Day));
        assert_eq!(spec.effective_granularity(), Some(Granularity::Day));
    }

    #[test]
    fn test_granularity_ignored_for_non_datetime() {
        let mut spec = BreakdownSpec::categorical("country");
        spec.granularity = Some(Granularity::Month);
        assert_eq!(spec.effective_granularity(), None);
    }

    #[test]
    fn test_dimension_key() {
        assert_eq!(dimension_key("country", 0), "country - 0");
    }
}
