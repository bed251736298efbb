use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::normalize::{self, NormalizePolicy};
use super::{Entity, EntityKind};
use crate::backend::Row;
use crate::error::NormalizeError;

/// Client status. Source data may also carry free-form strings, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClientStatus {
    Active,
    Inactive,
    Prospect,
    Other(String),
}

impl ClientStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ClientStatus::Active => "active",
            ClientStatus::Inactive => "inactive",
            ClientStatus::Prospect => "prospect",
            ClientStatus::Other(raw) => raw,
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "active" | "activo" => ClientStatus::Active,
            "inactive" | "inactivo" => ClientStatus::Inactive,
            "prospect" | "prospecto" => ClientStatus::Prospect,
            _ => ClientStatus::Other(s.to_string()),
        }
    }
}

super::string_keyed!(ClientStatus);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Absent when the row carries no status; never defaulted.
    pub status: Option<ClientStatus>,
    /// Account value in the backend's currency.
    pub value: Option<f64>,
    pub last_contact: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Client {
    const KIND: EntityKind = EntityKind::Client;

    fn from_row(row: &Row, policy: &NormalizePolicy) -> Result<Self, NormalizeError> {
        let kind = Self::KIND.as_str();
        Ok(Client {
            id: normalize::id(row, kind)?,
            name: normalize::required_text(row, "name", kind, policy)?,
            company: normalize::text(row, "company"),
            email: normalize::text(row, "email"),
            phone: normalize::text(row, "phone"),
            address: normalize::text(row, "address").or_else(|| normalize::text(row, "location")),
            status: normalize::text(row, "status").map(|s| ClientStatus::from_str_lossy(&s)),
            value: normalize::number(row, "value"),
            last_contact: normalize::date(row, "last_contact"),
            created_at: normalize::timestamp(row, "created_at"),
        })
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> [Option<&str>; 2] {
        [Some(self.name.as_str()), self.company.as_deref()]
    }

    fn category(&self) -> &str {
        self.status.as_ref().map_or("", |s| s.as_str())
    }

    fn canonical_category(raw: &str) -> String {
        ClientStatus::from_str_lossy(raw).as_str().to_string()
    }

    fn category_options() -> Vec<&'static str> {
        vec!["active", "inactive", "prospect"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().expect("object fixture")
    }

    #[test]
    fn test_full_row() {
        let client = Client::from_row(
            &row(json!({
                "id": 1,
                "name": "María González",
                "company": "TechCorp S.L.",
                "email": "maria@techcorp.com",
                "phone": "+34 666 123 456",
                "location": "Madrid",
                "status": "activo",
                "value": "€15,000",
                "last_contact": "2024-01-10",
                "created_at": "2024-01-01T09:00:00Z"
            })),
            &NormalizePolicy::default(),
        )
        .unwrap();

        assert_eq!(client.id, "1");
        assert_eq!(client.status, Some(ClientStatus::Active));
        assert_eq!(client.address.as_deref(), Some("Madrid"));
        assert_eq!(client.value, Some(15000.0));
        assert_eq!(client.last_contact, NaiveDate::from_ymd_opt(2024, 1, 10));
        assert!(client.created_at.is_some());
    }

    #[test]
    fn test_optional_fields_stay_absent() {
        let client = Client::from_row(
            &row(json!({ "id": "c1", "name": "Ana Martín" })),
            &NormalizePolicy::default(),
        )
        .unwrap();

        assert_eq!(client.company, None);
        assert_eq!(client.email, None);
        assert_eq!(client.value, None);
        assert_eq!(client.status, None);
        assert_eq!(client.category(), "");
        assert_eq!(client.search_fields(), [Some("Ana Martín"), None]);
    }

    #[test]
    fn test_free_form_status_kept_verbatim() {
        let client = Client::from_row(
            &row(json!({ "id": 4, "name": "Pedro López", "status": "On hold" })),
            &NormalizePolicy::default(),
        )
        .unwrap();

        assert_eq!(client.status, Some(ClientStatus::Other("On hold".to_string())));
        assert_eq!(client.category(), "On hold");
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let err = Client::from_row(&row(json!({ "id": 9 })), &NormalizePolicy::default())
            .unwrap_err();
        assert_eq!(
            err,
            NormalizeError::MissingField {
                kind: "client",
                field: "name"
            }
        );
    }

    #[test]
    fn test_status_serializes_as_key() {
        let json = serde_json::to_value(ClientStatus::Prospect).unwrap();
        assert_eq!(json, json!("prospect"));
        let parsed: ClientStatus = serde_json::from_value(json!("inactivo")).unwrap();
        assert_eq!(parsed, ClientStatus::Inactive);
    }
}
