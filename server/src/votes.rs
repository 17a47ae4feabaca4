//! Ballot ledger.
//!
//! One vote per voter per election, with the tally increment and the cast
//! record written as a single atomic unit. The claim is the `SADD` on the
//! voter's voted set inside a server-side script: Redis runs the script
//! without interleaving, so of N concurrent casts for one (voter, election)
//! pair exactly one observes the claim succeed and applies the effects.
//! Everything before the script is a precondition read; losing a race after
//! those reads downgrades to `AlreadyVoted`, never to a double count.

use chrono::Utc;
use redis::{AsyncCommands, Script, aio::ConnectionManager};
use tracing::info;

use crate::{
    database,
    error::AppError,
    models::{Ballot, Party, VerificationMethod},
};

// KEYS: voted set, party hash, voter hash, ballot hash.
// ARGV: election id, party id, party label, voter id, cast timestamp,
// verification method.
const CAST_SCRIPT: &str = r#"
if redis.call('SADD', KEYS[1], ARGV[1]) == 0 then
    return 0
end
redis.call('HINCRBY', KEYS[2], 'votes', 1)
redis.call('HSET', KEYS[3], 'voted_for', ARGV[2], 'voted_party', ARGV[3])
redis.call('HSET', KEYS[4],
    'voter', ARGV[4],
    'election', ARGV[1],
    'party', ARGV[2],
    'voted_at', ARGV[5],
    'method', ARGV[6])
return 1
"#;

/// Records a vote. Precondition order, first failure wins: voter exists,
/// not voted yet, election open, party active, party in the election.
pub async fn cast(
    conn: &mut ConnectionManager,
    voter_id: &str,
    election_id: &str,
    party_id: &str,
    method: VerificationMethod,
) -> Result<Ballot, AppError> {
    let voter = database::load_voter(conn, voter_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Voter not found".into()))?;

    if database::has_voted(conn, voter_id, election_id).await? {
        return Err(AppError::AlreadyVoted);
    }

    let election = database::load_election(conn, election_id)
        .await?
        .ok_or(AppError::ElectionNotOpen)?;
    if !election.is_open(Utc::now()) {
        return Err(AppError::ElectionNotOpen);
    }

    let party = database::load_party(conn, party_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Candidate not found".into()))?;
    if !party.is_active {
        return Err(AppError::NotFound("Candidate not found".into()));
    }

    if !election.contains_party(party_id) {
        return Err(AppError::PartyNotInElection);
    }

    let ballot = Ballot {
        voter: voter.id.clone(),
        election: election_id.to_string(),
        party: party_id.to_string(),
        voted_at: Utc::now(),
        method,
    };

    let applied: i64 = Script::new(CAST_SCRIPT)
        .key(database::voted_key(voter_id))
        .key(database::party_key(party_id))
        .key(database::voter_key(voter_id))
        .key(database::ballot_key(election_id, voter_id))
        .arg(election_id)
        .arg(party_id)
        .arg(&party.party_name)
        .arg(voter_id)
        .arg(ballot.voted_at.timestamp())
        .arg(method.as_str())
        .invoke_async(conn)
        .await?;

    // A concurrent cast for the same pair won the claim between our
    // precondition read and the script.
    if applied == 0 {
        return Err(AppError::AlreadyVoted);
    }

    info!(
        voter = voter_id,
        election = election_id,
        party = party_id,
        method = method.as_str(),
        "vote cast"
    );

    Ok(ballot)
}

/// Zeroes every active party's tally and reports how many were touched.
/// Voted sets and ballot records are deliberately left alone; history and
/// tallies diverge after a reset.
pub async fn reset_tallies(conn: &mut ConnectionManager) -> Result<usize, AppError> {
    let parties = database::list_parties(conn).await?;

    let mut count = 0;
    for party in parties.iter().filter(|p| p.is_active) {
        let _: () = conn.hset(database::party_key(&party.id), "votes", 0).await?;
        count += 1;
    }

    info!(candidates = count, "tallies reset");

    Ok(count)
}

/// Active parties, highest tally first.
pub async fn results(conn: &mut ConnectionManager) -> Result<Vec<Party>, AppError> {
    Ok(rank(database::list_parties(conn).await?))
}

fn rank(mut parties: Vec<Party>) -> Vec<Party> {
    parties.retain(|p| p.is_active);
    parties.sort_by(|a, b| b.votes.cmp(&a.votes));
    parties
}
