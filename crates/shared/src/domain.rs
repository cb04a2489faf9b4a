use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! name_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

// Top-level division, identified only by its short code (e.g. "SP").
name_newtype!(Region);
// Second-level division, identified by display name within one region.
name_newtype!(SubRegion);
name_newtype!(ScreenId);

/// Screen the location picker hands off to when none is configured.
pub const DEFAULT_HANDOFF_SCREEN: &str = "Points";

/// The user's picks at both levels. `None` is the unset sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub region: Option<Region>,
    pub sub_region: Option<SubRegion>,
}

impl Selection {
    pub fn new(region: impl Into<Region>, sub_region: impl Into<SubRegion>) -> Self {
        Self {
            region: Some(region.into()),
            sub_region: Some(sub_region.into()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.region.is_some() && self.sub_region.is_some()
    }
}

/// Input handed to the next screen's initializer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffPayload {
    pub region: Option<String>,
    pub sub_region: Option<String>,
}

impl HandoffPayload {
    /// `key=value` rendering for transports that only carry text. Unset fields are omitted.
    pub fn text_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(2);
        if let Some(region) = &self.region {
            pairs.push(("region".to_string(), region.clone()));
        }
        if let Some(sub_region) = &self.sub_region {
            pairs.push(("subRegion".to_string(), sub_region.clone()));
        }
        pairs
    }
}

impl From<&Selection> for HandoffPayload {
    fn from(selection: &Selection) -> Self {
        Self {
            region: selection.region.as_ref().map(|r| r.0.clone()),
            sub_region: selection.sub_region.as_ref().map(|s| s.0.clone()),
        }
    }
}
