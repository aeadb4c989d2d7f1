use serde::{Deserialize, Serialize};

/// Which kind of account is looking at the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantType {
    Business,
    Admin,
    Driver,
}

impl TenantType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TenantType::Business => "business",
            TenantType::Admin => "admin",
            TenantType::Driver => "driver",
        }
    }
}

impl std::fmt::Display for TenantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TenantType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "business" => Ok(TenantType::Business),
            "admin" => Ok(TenantType::Admin),
            "driver" => Ok(TenantType::Driver),
            other => Err(format!("unknown tenant type '{other}'")),
        }
    }
}

/// The account whose fleet and alerts are being displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    /// Business uid / company id. Admin views may run without one.
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub tenant_type: TenantType,
}

impl Tenant {
    #[must_use]
    pub fn new(id: Option<String>, tenant_type: TenantType) -> Self {
        Self { id, tenant_type }
    }

    #[must_use]
    pub fn is_business(&self) -> bool {
        self.tenant_type == TenantType::Business
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_type_parses_case_insensitively() {
        assert_eq!("Business".parse::<TenantType>(), Ok(TenantType::Business));
        assert_eq!(" driver ".parse::<TenantType>(), Ok(TenantType::Driver));
    }

    #[test]
    fn tenant_type_rejects_unknown() {
        assert!("courier".parse::<TenantType>().is_err());
    }
}
