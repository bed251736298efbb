use chrono::{DateTime, Utc};
use serde::Serialize;

use super::normalize::{self, NormalizePolicy};
use super::{Entity, EntityKind};
use crate::backend::Row;
use crate::error::NormalizeError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Lost,
    Other(String),
}

impl LeadStatus {
    pub fn as_str(&self) -> &str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Lost => "lost",
            LeadStatus::Other(raw) => raw,
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "new" | "nuevo" => LeadStatus::New,
            "contacted" | "contactado" => LeadStatus::Contacted,
            "qualified" | "calificado" => LeadStatus::Qualified,
            "lost" | "perdido" => LeadStatus::Lost,
            _ => LeadStatus::Other(s.to_string()),
        }
    }
}

super::string_keyed!(LeadStatus);

/// Coarse lead quality derived from the 0–100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => ScoreBand::High,
            60..=79 => ScoreBand::Medium,
            _ => ScoreBand::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub status: Option<LeadStatus>,
    pub estimated_value: Option<f64>,
    /// 0–100, clamped.
    pub score: Option<u8>,
    pub next_action: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Lead {
    pub fn score_band(&self) -> Option<ScoreBand> {
        self.score.map(ScoreBand::from_score)
    }
}

impl Entity for Lead {
    const KIND: EntityKind = EntityKind::Lead;

    fn from_row(row: &Row, policy: &NormalizePolicy) -> Result<Self, NormalizeError> {
        let kind = Self::KIND.as_str();
        Ok(Lead {
            id: normalize::id(row, kind)?,
            name: normalize::required_text(row, "name", kind, policy)?,
            company: normalize::text(row, "company"),
            email: normalize::text(row, "email"),
            phone: normalize::text(row, "phone"),
            source: normalize::text(row, "source"),
            notes: normalize::text(row, "notes"),
            status: normalize::text(row, "status").map(|s| LeadStatus::from_str_lossy(&s)),
            estimated_value: normalize::number(row, "estimated_value")
                .or_else(|| normalize::number(row, "value")),
            score: normalize::number(row, "score").map(|s| s.round().clamp(0.0, 100.0) as u8),
            next_action: normalize::text(row, "next_action"),
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
        LeadStatus::from_str_lossy(raw).as_str().to_string()
    }

    fn category_options() -> Vec<&'static str> {
        vec!["new", "contacted", "qualified", "lost"]
    }
}
