//! Scoping filters shared by every rollup in a request.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RollupError};
use crate::store::RecordStore;

// ---------------------------------------------------------------------------
// FilterField
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterField {
    Output,
    Indicator,
    WorkPackage,
    Product,
}

impl FilterField {
    /// The query-parameter name.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterField::Output => "output",
            FilterField::Indicator => "indicator",
            FilterField::WorkPackage => "workPackage",
            FilterField::Product => "productId",
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FilterParams (raw)
// ---------------------------------------------------------------------------

/// Filters exactly as the caller sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub indicator: Option<String>,
    #[serde(default)]
    pub work_package: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Filters (validated)
// ---------------------------------------------------------------------------

/// Filters whose ids are known to resolve. Only [`Filters::validate`] and
/// [`Filters::none`] construct one, so a rollup never sees an unchecked id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Filters {
    output: Option<String>,
    indicator: Option<String>,
    work_package: Option<String>,
    product: Option<String>,
}

static ID_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._:\-]{0,63}$").unwrap())
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Filters {
    /// No restriction.
    pub fn none() -> Self {
        Self::default()
    }

    /// Normalize the raw params (blank means absent), check id syntax, then
    /// make sure every supplied id exists in the store.
    pub fn validate(params: FilterParams, store: &dyn RecordStore) -> Result<Self> {
        let filters = Self {
            output: clean(params.output),
            indicator: clean(params.indicator),
            work_package: clean(params.work_package),
            product: clean(params.product_id),
        };
        for (field, value) in filters.iter() {
            if !id_re().is_match(value) {
                return Err(RollupError::InvalidFilter {
                    field: field.to_string(),
                    value: value.to_string(),
                    reason: "malformed identifier".to_string(),
                });
            }
        }
        for (field, value) in filters.iter() {
            if !store.exists(field, value)? {
                return Err(RollupError::InvalidFilter {
                    field: field.to_string(),
                    value: value.to_string(),
                    reason: "no such entity".to_string(),
                });
            }
        }
        Ok(filters)
    }

    pub fn get(&self, field: FilterField) -> Option<&str> {
        match field {
            FilterField::Output => self.output.as_deref(),
            FilterField::Indicator => self.indicator.as_deref(),
            FilterField::WorkPackage => self.work_package.as_deref(),
            FilterField::Product => self.product.as_deref(),
        }
    }

    /// Supplied filters in a fixed field order.
    pub fn iter(&self) -> impl Iterator<Item = (FilterField, &str)> {
        [
            FilterField::Output,
            FilterField::Indicator,
            FilterField::WorkPackage,
            FilterField::Product,
        ]
        .into_iter()
        .filter_map(|f| self.get(f).map(|v| (f, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl fmt::Display for Filters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("unfiltered");
        }
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{k}={v}")).collect();
        f.write_str(&parts.join(","))
    }
}
