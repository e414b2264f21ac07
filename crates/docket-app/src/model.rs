// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::Date;
use time::macros::format_description;

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Completed,
}

impl RecordStatus {
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Approved,
        Self::Rejected,
        Self::Cancelled,
        Self::Completed,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Case-insensitive; unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Cancelled => "Cancelled",
            Self::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
}

impl Person {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub status: RecordStatus,
    #[serde(default, with = "iso_date_opt")]
    pub scheduled_on: Option<Date>,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub requester: Person,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub notes: String,
}

impl Record {
    /// A record with only identity and status set; handy for fixtures.
    pub fn bare(id: RecordId, status: RecordStatus) -> Self {
        Self {
            id,
            status,
            scheduled_on: None,
            contact_name: String::new(),
            contact_email: String::new(),
            contact_phone: String::new(),
            requester: Person::default(),
            location: None,
            notes: String::new(),
        }
    }
}

/// What the review controller needs to know about a record. Everything else
/// about the schema stays opaque to it.
pub trait Reviewable {
    fn record_id(&self) -> RecordId;
    fn status(&self) -> RecordStatus;
    fn location_id(&self) -> Option<LocationId>;
    fn review_date(&self) -> Option<Date>;
    /// Fields the free-text filter is matched against.
    fn search_fields(&self) -> Vec<&str>;
}

impl Reviewable for Record {
    fn record_id(&self) -> RecordId {
        self.id
    }

    fn status(&self) -> RecordStatus {
        self.status
    }

    fn location_id(&self) -> Option<LocationId> {
        self.location.as_ref().map(|location| location.id)
    }

    fn review_date(&self) -> Option<Date> {
        self.scheduled_on
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.contact_name.as_str(),
            self.contact_email.as_str(),
            self.contact_phone.as_str(),
            self.requester.first_name.as_str(),
            self.requester.last_name.as_str(),
            self.requester.email.as_str(),
            self.requester.phone.as_str(),
            self.requester.company.as_str(),
        ];
        if let Some(location) = &self.location {
            fields.push(location.name.as_str());
            fields.push(location.address.as_str());
            fields.push(location.city.as_str());
        }
        fields
    }
}

pub fn format_iso_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

pub fn parse_iso_date(input: &str) -> Option<Date> {
    Date::parse(input.trim(), &format_description!("[year]-[month]-[day]")).ok()
}

mod iso_date_opt {
    use super::{format_iso_date, parse_iso_date};
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(value: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&format_iso_date(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Date>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => parse_iso_date(value)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date {value:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Location, Person, Record, RecordStatus, Reviewable, parse_iso_date};
    use crate::{LocationId, RecordId};
    use time::{Date, Month};

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(RecordStatus::parse("Approved"), Some(RecordStatus::Approved));
        assert_eq!(RecordStatus::parse("PENDING"), Some(RecordStatus::Pending));
        assert_eq!(RecordStatus::parse("canceled"), Some(RecordStatus::Cancelled));
        assert_eq!(RecordStatus::parse("nope"), None);
        for status in RecordStatus::ALL {
            assert_eq!(RecordStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn search_fields_include_nested_person_and_location() {
        let record = Record {
            requester: Person {
                first_name: "Ada".to_owned(),
                ..Person::default()
            },
            location: Some(Location {
                id: LocationId::new(3),
                name: String::new(),
                address: String::new(),
                city: "Lyon".to_owned(),
            }),
            ..Record::bare(RecordId::new(5), RecordStatus::Pending)
        };
        let fields = record.search_fields();
        assert!(fields.contains(&"Ada"));
        assert!(fields.contains(&"Lyon"));
        assert_eq!(record.location_id(), Some(LocationId::new(3)));
    }

    #[test]
    fn iso_dates_parse_strictly() {
        assert_eq!(
            parse_iso_date("2026-03-09"),
            Date::from_calendar_date(2026, Month::March, 9).ok()
        );
        assert_eq!(parse_iso_date("2026-13-01"), None);
        assert_eq!(parse_iso_date("03/09/2026"), None);
        assert_eq!(parse_iso_date(""), None);
    }

    #[test]
    fn record_json_uses_iso_dates() -> anyhow::Result<()> {
        let json = r#"{
            "id": 9,
            "status": "approved",
            "scheduled_on": "2026-01-15",
            "requester": {"first_name": "Grace", "last_name": "Hopper"},
            "location": {"id": 2, "city": "Arlington"}
        }"#;
        let record: Record = serde_json::from_str(json)?;
        assert_eq!(record.id, RecordId::new(9));
        assert_eq!(record.status, RecordStatus::Approved);
        assert_eq!(
            record.scheduled_on,
            Some(Date::from_calendar_date(2026, Month::January, 15)?)
        );
        assert_eq!(record.requester.display_name(), "Grace Hopper");

        let encoded = serde_json::to_value(&record)?;
        assert_eq!(encoded["scheduled_on"], "2026-01-15");
        Ok(())
    }
}
