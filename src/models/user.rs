use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Technician,
    Advertiser,
    Manager,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Technician => "technician",
            Role::Advertiser => "advertiser",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }
}

/// Identity attached to a request by the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    #[serde(rename = "sub")]
    pub user_id: i64,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technician_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertiser_id: Option<i64>,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: i64,
    pub customer_id: i64,
    pub make: String,
    pub model: String,
    pub plate: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Technician {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advertiser {
    pub id: i64,
    pub user_id: i64,
    pub company_name: String,
}
