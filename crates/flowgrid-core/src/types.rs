use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// GridKind
// ---------------------------------------------------------------------------

/// The three fixed tabular roles a step carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridKind {
    Params,
    Request,
    Response,
}

impl GridKind {
    /// Fixed rendering and export order.
    pub fn all() -> &'static [GridKind] {
        &[GridKind::Params, GridKind::Request, GridKind::Response]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GridKind::Params => "params",
            GridKind::Request => "request",
            GridKind::Response => "response",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            GridKind::Params => "Parameters (Path & Query)",
            GridKind::Request => "Request Body",
            GridKind::Response => "Response Verification",
        }
    }

    /// Suffix used in workbook table names (`Step1_Params`).
    pub fn table_suffix(self) -> &'static str {
        match self {
            GridKind::Params => "Params",
            GridKind::Request => "Request",
            GridKind::Response => "Response",
        }
    }
}

impl fmt::Display for GridKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GridKind {
    type Err = crate::error::FlowgridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "params" => Ok(GridKind::Params),
            "request" => Ok(GridKind::Request),
            "response" => Ok(GridKind::Response),
            _ => Err(crate::error::FlowgridError::InvalidRow(format!(
                "unknown grid '{s}' (expected params, request or response)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// Execution kind tag carried by an action definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    SimpleCommand,
    SetAndExecute,
    PostAndVerify,
    FetchAndVerify,
    #[serde(other)]
    Unknown,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::SimpleCommand => "SimpleCommand",
            ActionKind::SetAndExecute => "SetAndExecute",
            ActionKind::PostAndVerify => "PostAndVerify",
            ActionKind::FetchAndVerify => "FetchAndVerify",
            ActionKind::Unknown => "Unknown",
        }
    }

    /// Kind implied by the HTTP method of a schema operation.
    pub fn from_http_method(method: &str) -> Self {
        if method.eq_ignore_ascii_case("post") {
            ActionKind::PostAndVerify
        } else if method.eq_ignore_ascii_case("get") {
            ActionKind::FetchAndVerify
        } else {
            ActionKind::Unknown
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EditMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    Create,
    Edit,
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EditMode::Create => "create",
            EditMode::Edit => "edit",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// DescriptionSlot
// ---------------------------------------------------------------------------

/// Which free-text annotation of a step is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionSlot {
    Before,
    After,
}

impl DescriptionSlot {
    pub fn label(self) -> &'static str {
        match self {
            DescriptionSlot::Before => "Before",
            DescriptionSlot::After => "After",
        }
    }
}

impl std::str::FromStr for DescriptionSlot {
    type Err = crate::error::FlowgridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(DescriptionSlot::Before),
            "after" => Ok(DescriptionSlot::After),
            _ => Err(crate::error::FlowgridError::InvalidRow(format!(
                "unknown description slot '{s}' (expected before or after)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_kind_round_trips_through_str() {
        for kind in GridKind::all() {
            let parsed: GridKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, *kind);
        }
        assert!("headers".parse::<GridKind>().is_err());
    }

    #[test]
    fn unrecognised_action_kind_decodes_as_unknown() {
        let kind: ActionKind = serde_json::from_str("\"DeleteAndForget\"").unwrap();
        assert_eq!(kind, ActionKind::Unknown);
        let kind: ActionKind = serde_json::from_str("\"PostAndVerify\"").unwrap();
        assert_eq!(kind, ActionKind::PostAndVerify);
    }

    #[test]
    fn http_method_maps_to_kind() {
        assert_eq!(ActionKind::from_http_method("POST"), ActionKind::PostAndVerify);
        assert_eq!(ActionKind::from_http_method("get"), ActionKind::FetchAndVerify);
        assert_eq!(ActionKind::from_http_method("PATCH"), ActionKind::Unknown);
    }
}
