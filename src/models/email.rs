use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A mailbox message normalized from the mail provider.
///
/// Every optional field is serialized as an explicit `null` when the provider
/// omitted it, so a merge-upsert clears stale stored values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    /// Provider-assigned message id; the document key.
    pub id: String,
    pub subject: Option<String>,
    pub sender_address: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
    pub preview: Option<String>,
}

/// A stored mail record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub id: String,
    pub subject: Option<String>,
    pub sender_address: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
    pub preview: Option<String>,
    /// Stamped on every upsert.
    pub synced_at: DateTime<Utc>,
}

impl Email {
    /// The synced fields, without the write timestamp.
    pub fn record(&self) -> EmailRecord {
        EmailRecord {
            id: self.id.clone(),
            subject: self.subject.clone(),
            sender_address: self.sender_address.clone(),
            received_at: self.received_at,
            preview: self.preview.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_serialize_as_null() {
        let record = EmailRecord {
            id: "AAMk-1".into(),
            subject: None,
            sender_address: Some("a@example.com".into()),
            received_at: None,
            preview: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("subject").unwrap().is_null());
        assert!(json.get("received_at").unwrap().is_null());
        assert_eq!(json["sender_address"], "a@example.com");
    }
}
