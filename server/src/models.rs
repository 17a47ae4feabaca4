//! Domain records as stored in Redis.
//!
//! Each record type is one Redis hash; the helpers here translate between
//! the typed struct and the string field map that `HGETALL` returns. The
//! voter's voted-in election set is not a field of the voter hash, it lives
//! in its own Redis set so the cast script can claim it atomically.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Voter,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Voter => "voter",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "voter" => Some(Role::Voter),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationMethod {
    Face,
    Otp,
    Fingerprint,
}

impl VerificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationMethod::Face => "face",
            VerificationMethod::Otp => "otp",
            VerificationMethod::Fingerprint => "fingerprint",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Voter {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
    pub date_of_birth: NaiveDate,
    pub face_encoding: Vec<f64>,
    pub role: Role,
    pub is_verified: bool,
    pub otp: Option<String>,
    pub otp_expiry: Option<DateTime<Utc>>,
    pub voted_for: Option<String>,
    pub voted_party: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Voter {
    pub fn to_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("name".into(), self.name.clone()),
            ("email".into(), self.email.clone()),
            ("phone_number".into(), self.phone_number.clone()),
            ("password_hash".into(), self.password_hash.clone()),
            ("date_of_birth".into(), self.date_of_birth.to_string()),
            (
                "face_encoding".into(),
                serde_json::to_string(&self.face_encoding).unwrap_or_else(|_| "[]".into()),
            ),
            ("role".into(), self.role.as_str().into()),
            ("is_verified".into(), flag(self.is_verified)),
            ("created_at".into(), self.created_at.timestamp().to_string()),
        ];

        if let Some(otp) = &self.otp {
            fields.push(("otp".into(), otp.clone()));
        }
        if let Some(expiry) = &self.otp_expiry {
            fields.push(("otp_expiry".into(), expiry.timestamp().to_string()));
        }
        if let Some(voted_for) = &self.voted_for {
            fields.push(("voted_for".into(), voted_for.clone()));
        }
        if let Some(voted_party) = &self.voted_party {
            fields.push(("voted_party".into(), voted_party.clone()));
        }

        fields
    }

    pub fn from_fields(id: &str, map: &HashMap<String, String>) -> Option<Self> {
        Some(Self {
            id: id.to_string(),
            name: map.get("name")?.clone(),
            email: map.get("email")?.clone(),
            phone_number: map.get("phone_number")?.clone(),
            password_hash: map.get("password_hash")?.clone(),
            date_of_birth: map.get("date_of_birth")?.parse().ok()?,
            face_encoding: serde_json::from_str(map.get("face_encoding")?).ok()?,
            role: Role::parse(map.get("role")?)?,
            is_verified: map.get("is_verified").map(|v| v == "1").unwrap_or(false),
            otp: map.get("otp").cloned(),
            otp_expiry: map.get("otp_expiry").and_then(|v| timestamp(v)),
            voted_for: map.get("voted_for").cloned(),
            voted_party: map.get("voted_party").cloned(),
            created_at: timestamp(map.get("created_at")?)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub id: String,
    pub name: String,
    pub party_name: String,
    pub party_symbol: String,
    pub votes: u64,
    pub is_active: bool,
}

impl Party {
    pub fn to_fields(&self) -> Vec<(String, String)> {
        vec![
            ("name".into(), self.name.clone()),
            ("party_name".into(), self.party_name.clone()),
            ("party_symbol".into(), self.party_symbol.clone()),
            ("votes".into(), self.votes.to_string()),
            ("is_active".into(), flag(self.is_active)),
        ]
    }

    pub fn from_fields(id: &str, map: &HashMap<String, String>) -> Option<Self> {
        Some(Self {
            id: id.to_string(),
            name: map.get("name")?.clone(),
            party_name: map.get("party_name")?.clone(),
            party_symbol: map.get("party_symbol")?.clone(),
            votes: map.get("votes")?.parse().ok()?,
            is_active: map.get("is_active").map(|v| v == "1").unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Election {
    pub id: String,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub parties: Vec<String>,
    pub is_active: bool,
}

impl Election {
    pub fn to_fields(&self) -> Vec<(String, String)> {
        vec![
            ("title".into(), self.title.clone()),
            ("start_date".into(), self.start_date.timestamp().to_string()),
            ("end_date".into(), self.end_date.timestamp().to_string()),
            (
                "parties".into(),
                serde_json::to_string(&self.parties).unwrap_or_else(|_| "[]".into()),
            ),
            ("is_active".into(), flag(self.is_active)),
        ]
    }

    pub fn from_fields(id: &str, map: &HashMap<String, String>) -> Option<Self> {
        Some(Self {
            id: id.to_string(),
            title: map.get("title")?.clone(),
            start_date: timestamp(map.get("start_date")?)?,
            end_date: timestamp(map.get("end_date")?)?,
            parties: serde_json::from_str(map.get("parties")?).ok()?,
            is_active: map.get("is_active").map(|v| v == "1").unwrap_or(false),
        })
    }

    /// Whether a cast is admissible right now: the window is inclusive on
    /// both ends and deactivated elections never accept votes.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.start_date <= now && now <= self.end_date
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        now < self.start_date
    }

    pub fn contains_party(&self, party_id: &str) -> bool {
        self.parties.iter().any(|id| id == party_id)
    }

    pub fn is_closed(&self, now: DateTime<Utc>) -> bool {
        now > self.end_date
    }
}

#[derive(Debug, Clone)]
pub struct Ballot {
    pub voter: String,
    pub election: String,
    pub party: String,
    pub voted_at: DateTime<Utc>,
    pub method: VerificationMethod,
}

fn flag(value: bool) -> String {
    let bit = if value { "1" } else { "0" };
    bit.to_string()
}

fn timestamp(value: &str) -> Option<DateTime<Utc>> {
    let seconds: i64 = value.parse().ok()?;
    Utc.timestamp_opt(seconds, 0).single()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn election(start_offset: i64, end_offset: i64, active: bool) -> Election {
        let now = Utc::now();
        Election {
            id: "e1".into(),
            title: "General".into(),
            start_date: now + Duration::seconds(start_offset),
            end_date: now + Duration::seconds(end_offset),
            parties: vec!["p1".into()],
            is_active: active,
        }
    }

    #[test]
    fn window_states() {
        let now = Utc::now();

        assert!(election(-10, 10, true).is_open(now));
        assert!(election(60, 120, true).is_upcoming(now));
        assert!(election(-120, -60, true).is_closed(now));

        assert!(!election(60, 120, true).is_open(now));
        assert!(!election(-120, -60, true).is_open(now));
    }

    #[test]
    fn inactive_election_is_never_open() {
        let now = Utc::now();
        assert!(!election(-10, 10, false).is_open(now));
    }

    #[test]
    fn party_membership() {
        let e = election(-10, 10, true);
        assert!(e.contains_party("p1"));
        assert!(!e.contains_party("p2"));
    }

    #[test]
    fn window_is_inclusive_at_both_ends() {
        let e = election(0, 100, true);
        assert!(e.is_open(e.start_date));
        assert!(e.is_open(e.end_date));
        assert!(!e.is_open(e.end_date + Duration::seconds(1)));
    }

    #[test]
    fn voter_round_trips_through_fields() {
        let voter = Voter {
            id: "v1".into(),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            phone_number: "9876543210".into(),
            password_hash: "$2b$10$hash".into(),
            date_of_birth: "1990-01-01".parse().unwrap(),
            face_encoding: vec![0.25, -0.5, 0.125],
            role: Role::Voter,
            is_verified: true,
            otp: Some("123456".into()),
            otp_expiry: Some(timestamp("1900000000").unwrap()),
            voted_for: None,
            voted_party: None,
            created_at: timestamp("1700000000").unwrap(),
        };

        let map: HashMap<String, String> = voter.to_fields().into_iter().collect();
        let loaded = Voter::from_fields("v1", &map).unwrap();

        assert_eq!(loaded.email, voter.email);
        assert_eq!(loaded.face_encoding, voter.face_encoding);
        assert_eq!(loaded.role, Role::Voter);
        assert!(loaded.is_verified);
        assert_eq!(loaded.otp.as_deref(), Some("123456"));
        assert_eq!(loaded.voted_for, None);
    }

    #[test]
    fn corrupt_record_is_rejected() {
        let mut map: HashMap<String, String> = HashMap::new();
        map.insert("name".into(), "x".into());
        assert!(Voter::from_fields("v1", &map).is_none());

        let mut party = HashMap::new();
        party.insert("name".into(), "A".into());
        party.insert("party_name".into(), "Alpha".into());
        party.insert("party_symbol".into(), "sun".into());
        party.insert("votes".into(), "not-a-number".into());
        assert!(Party::from_fields("p1", &party).is_none());
    }
}
