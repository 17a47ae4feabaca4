//! # Redis
//!
//! The document store.
//!
//! One hash per record plus a set of ids per collection, and hash indexes
//! for the unique voter lookups:
//!
//! - `voter:{id}` hash, `voters` id set
//! - `voter:email` / `voter:phone` hashes mapping the unique value to the
//!   voter id, claimed with `HSETNX` so a duplicate registration loses the
//!   race instead of overwriting
//! - `voter:voted:{id}` set of election ids the voter has cast in
//! - `party:{id}` hash, `parties` id set
//! - `election:{id}` hash, `elections` id set
//! - `ballot:{election}:{voter}` hash, written only by the cast script
//!
//! Vote casting never reads-then-writes: the claim on the voted set, the
//! tally increment and the ballot write happen inside one server-side
//! script (see `votes`).

use std::{collections::HashMap, time::Duration};

use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};

use crate::{
    error::AppError,
    models::{Election, Party, Voter},
};

pub async fn init_redis(redis_url: &str) -> ConnectionManager {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url).unwrap();

    client
        .get_connection_manager_with_config(config)
        .await
        .unwrap()
}

pub fn voter_key(id: &str) -> String {
    format!("voter:{id}")
}

pub fn voted_key(id: &str) -> String {
    format!("voter:voted:{id}")
}

pub fn party_key(id: &str) -> String {
    format!("party:{id}")
}

pub fn election_key(id: &str) -> String {
    format!("election:{id}")
}

pub fn ballot_key(election_id: &str, voter_id: &str) -> String {
    format!("ballot:{election_id}:{voter_id}")
}

const EMAIL_INDEX: &str = "voter:email";
const PHONE_INDEX: &str = "voter:phone";
const VOTERS: &str = "voters";
const PARTIES: &str = "parties";
const ELECTIONS: &str = "elections";

fn corrupt(kind: &str, id: &str) -> AppError {
    AppError::Internal(format!("corrupt {kind} record: {id}").into())
}

// Voters

/// Registers a new voter. Email and phone uniqueness are claimed with
/// `HSETNX`; of two concurrent registrations for the same value exactly one
/// wins the claim.
pub async fn create_voter(conn: &mut ConnectionManager, voter: &Voter) -> Result<(), AppError> {
    let email_claimed: bool = conn.hset_nx(EMAIL_INDEX, &voter.email, &voter.id).await?;
    if !email_claimed {
        return Err(AppError::Validation(
            "User with this email already exists".into(),
        ));
    }

    let phone_claimed: bool = conn
        .hset_nx(PHONE_INDEX, &voter.phone_number, &voter.id)
        .await?;
    if !phone_claimed {
        let _: () = conn.hdel(EMAIL_INDEX, &voter.email).await?;
        return Err(AppError::Validation(
            "This phone number is already registered. Please use a different phone number.".into(),
        ));
    }

    let _: () = conn
        .hset_multiple(voter_key(&voter.id), &voter.to_fields())
        .await?;
    let _: () = conn.sadd(VOTERS, &voter.id).await?;

    Ok(())
}

pub async fn load_voter(
    conn: &mut ConnectionManager,
    id: &str,
) -> Result<Option<Voter>, AppError> {
    let map: HashMap<String, String> = conn.hgetall(voter_key(id)).await?;
    if map.is_empty() {
        return Ok(None);
    }

    Voter::from_fields(id, &map)
        .map(Some)
        .ok_or_else(|| corrupt("voter", id))
}

pub async fn find_voter_by_email(
    conn: &mut ConnectionManager,
    email: &str,
) -> Result<Option<Voter>, AppError> {
    let id: Option<String> = conn.hget(EMAIL_INDEX, email).await?;

    match id {
        Some(id) => load_voter(conn, &id).await,
        None => Ok(None),
    }
}

pub async fn list_voters(conn: &mut ConnectionManager) -> Result<Vec<Voter>, AppError> {
    let ids: Vec<String> = conn.smembers(VOTERS).await?;

    let mut voters = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(voter) = load_voter(conn, &id).await? {
            voters.push(voter);
        }
    }

    Ok(voters)
}

/// Marks the voter verified and discards the one-time code.
pub async fn mark_verified(conn: &mut ConnectionManager, id: &str) -> Result<(), AppError> {
    let key = voter_key(id);
    let _: () = conn.hset(&key, "is_verified", "1").await?;
    let _: () = conn.hdel(&key, vec!["otp", "otp_expiry"]).await?;

    Ok(())
}

pub async fn update_password(
    conn: &mut ConnectionManager,
    id: &str,
    password_hash: &str,
) -> Result<(), AppError> {
    let _: () = conn
        .hset(voter_key(id), "password_hash", password_hash)
        .await?;

    Ok(())
}

pub async fn delete_voter(conn: &mut ConnectionManager, voter: &Voter) -> Result<(), AppError> {
    let _: () = conn.hdel(EMAIL_INDEX, &voter.email).await?;
    let _: () = conn.hdel(PHONE_INDEX, &voter.phone_number).await?;
    let _: () = conn.srem(VOTERS, &voter.id).await?;
    let _: () = conn
        .del(vec![voter_key(&voter.id), voted_key(&voter.id)])
        .await?;

    Ok(())
}

pub async fn has_voted(
    conn: &mut ConnectionManager,
    voter_id: &str,
    election_id: &str,
) -> Result<bool, AppError> {
    let member: bool = conn.sismember(voted_key(voter_id), election_id).await?;

    Ok(member)
}

// Parties

pub async fn create_party(conn: &mut ConnectionManager, party: &Party) -> Result<(), AppError> {
    let _: () = conn
        .hset_multiple(party_key(&party.id), &party.to_fields())
        .await?;
    let _: () = conn.sadd(PARTIES, &party.id).await?;

    Ok(())
}

pub async fn load_party(
    conn: &mut ConnectionManager,
    id: &str,
) -> Result<Option<Party>, AppError> {
    let map: HashMap<String, String> = conn.hgetall(party_key(id)).await?;
    if map.is_empty() {
        return Ok(None);
    }

    Party::from_fields(id, &map)
        .map(Some)
        .ok_or_else(|| corrupt("party", id))
}

pub async fn list_parties(conn: &mut ConnectionManager) -> Result<Vec<Party>, AppError> {
    let ids: Vec<String> = conn.smembers(PARTIES).await?;

    let mut parties = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(party) = load_party(conn, &id).await? {
            parties.push(party);
        }
    }

    Ok(parties)
}

/// Soft delete. Tally history stays on the record for audit.
pub async fn deactivate_party(conn: &mut ConnectionManager, id: &str) -> Result<bool, AppError> {
    let exists: bool = conn.exists(party_key(id)).await?;
    if !exists {
        return Ok(false);
    }

    let _: () = conn.hset(party_key(id), "is_active", "0").await?;

    Ok(true)
}

pub async fn deactivate_all_parties(conn: &mut ConnectionManager) -> Result<usize, AppError> {
    let parties = list_parties(conn).await?;

    let mut count = 0;
    for party in &parties {
        let _: () = conn.hset(party_key(&party.id), "is_active", "0").await?;
        count += 1;
    }

    Ok(count)
}

// Elections

pub async fn create_election(
    conn: &mut ConnectionManager,
    election: &Election,
) -> Result<(), AppError> {
    let _: () = conn
        .hset_multiple(election_key(&election.id), &election.to_fields())
        .await?;
    let _: () = conn.sadd(ELECTIONS, &election.id).await?;

    Ok(())
}

pub async fn load_election(
    conn: &mut ConnectionManager,
    id: &str,
) -> Result<Option<Election>, AppError> {
    let map: HashMap<String, String> = conn.hgetall(election_key(id)).await?;
    if map.is_empty() {
        return Ok(None);
    }

    Election::from_fields(id, &map)
        .map(Some)
        .ok_or_else(|| corrupt("election", id))
}

pub async fn list_elections(conn: &mut ConnectionManager) -> Result<Vec<Election>, AppError> {
    let ids: Vec<String> = conn.smembers(ELECTIONS).await?;

    let mut elections = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(election) = load_election(conn, &id).await? {
            elections.push(election);
        }
    }

    Ok(elections)
}
