//! Election registry: definitions, window queries and party membership.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    database,
    error::AppError,
    models::{Election, Party},
};

/// An election with its party records populated, for the listing routes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionView {
    #[serde(flatten)]
    pub election: Election,
    pub party_details: Vec<Party>,
}

/// Creates an election after validating the window and the party list.
///
/// The party list is valid when the number of distinct active parties found
/// equals the number requested; one stale or inactive id rejects the whole
/// request rather than being skipped.
pub async fn create(
    conn: &mut ConnectionManager,
    title: &str,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    party_ids: Vec<String>,
) -> Result<Election, AppError> {
    if title.trim().is_empty() || party_ids.is_empty() {
        return Err(AppError::Validation(
            "All required fields must be provided and valid".into(),
        ));
    }

    if start_date > end_date {
        return Err(AppError::Validation(
            "End date must be after start date".into(),
        ));
    }

    // Distinct ids, so a repeated entry cannot inflate the found count.
    let distinct: BTreeSet<&String> = party_ids.iter().collect();

    let mut found_active = 0;
    for id in &distinct {
        if let Some(party) = database::load_party(conn, id).await? {
            if party.is_active {
                found_active += 1;
            }
        }
    }

    if found_active != party_ids.len() {
        return Err(AppError::Validation(
            "One or more parties are invalid or inactive".into(),
        ));
    }

    let election = Election {
        id: Uuid::new_v4().to_string(),
        title: title.trim().to_string(),
        start_date,
        end_date,
        parties: party_ids,
        is_active: true,
    };

    database::create_election(conn, &election).await?;

    Ok(election)
}

/// Elections that have not ended yet: open now or still upcoming.
pub async fn live(
    conn: &mut ConnectionManager,
    now: DateTime<Utc>,
) -> Result<Vec<ElectionView>, AppError> {
    filtered(conn, |e| !e.is_closed(now)).await
}

/// Elections accepting votes right now.
pub async fn open(
    conn: &mut ConnectionManager,
    now: DateTime<Utc>,
) -> Result<Vec<ElectionView>, AppError> {
    filtered(conn, |e| e.is_open(now)).await
}

/// Elections whose window has passed.
pub async fn previous(
    conn: &mut ConnectionManager,
    now: DateTime<Utc>,
) -> Result<Vec<ElectionView>, AppError> {
    filtered(conn, |e| e.is_closed(now)).await
}

pub async fn parties_of(
    conn: &mut ConnectionManager,
    election_id: &str,
) -> Result<Vec<Party>, AppError> {
    let election = database::load_election(conn, election_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Election not found".into()))?;

    populate(conn, &election).await
}

async fn filtered(
    conn: &mut ConnectionManager,
    keep: impl Fn(&Election) -> bool,
) -> Result<Vec<ElectionView>, AppError> {
    let mut elections = database::list_elections(conn).await?;
    elections.retain(|e| keep(e));
    elections.sort_by_key(|e| e.start_date);

    let mut views = Vec::with_capacity(elections.len());
    for election in elections {
        let party_details = populate(conn, &election).await?;
        views.push(ElectionView {
            election,
            party_details,
        });
    }

    Ok(views)
}

async fn populate(
    conn: &mut ConnectionManager,
    election: &Election,
) -> Result<Vec<Party>, AppError> {
    let mut parties = Vec::with_capacity(election.parties.len());
    for id in &election.parties {
        if let Some(party) = database::load_party(conn, id).await? {
            parties.push(party);
        }
    }

    Ok(parties)
}
