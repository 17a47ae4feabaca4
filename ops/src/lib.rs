//! Operator maintenance commands.
//!
//! These talk to the store directly, bypassing the HTTP surface, for the
//! few account fixes that have no self-service path: bootstrapping the
//! first admin, rotating an admin password, removing an account.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use redis::{AsyncCommands, aio::ConnectionManager};
use uuid::Uuid;

use evote::{
    database,
    models::{Role, Voter},
};

const BCRYPT_COST: u32 = 10;

/// Admin accounts carry a placeholder descriptor; they never pass a face
/// check and never vote.
const FACE_ENCODING_LEN: usize = 128;

async fn connect() -> ConnectionManager {
    let redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

    println!("Connecting to Redis: {redis_url}");

    database::init_redis(&redis_url).await
}

pub async fn create_admin(email: &str, password: &str, name: &str) -> Result<()> {
    let mut conn = connect().await;

    let password_hash = bcrypt::hash(password, BCRYPT_COST).context("hashing password")?;

    if let Some(existing) = database::find_voter_by_email(&mut conn, email).await? {
        database::update_password(&mut conn, &existing.id, &password_hash).await?;
        let _: () = conn
            .hset(database::voter_key(&existing.id), "role", Role::Admin.as_str())
            .await?;

        println!("Admin user updated.");
        return Ok(());
    }

    let admin = Voter {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: email.to_string(),
        phone_number: "9999999999".to_string(),
        password_hash,
        date_of_birth: "1990-01-01".parse().expect("static date"),
        face_encoding: vec![0.0; FACE_ENCODING_LEN],
        role: Role::Admin,
        is_verified: true,
        otp: None,
        otp_expiry: None,
        voted_for: None,
        voted_party: None,
        created_at: Utc::now(),
    };

    database::create_voter(&mut conn, &admin).await?;

    println!("Admin user created.");
    Ok(())
}

pub async fn update_admin_password(email: &str, password: &str) -> Result<()> {
    let mut conn = connect().await;

    let Some(admin) = database::find_voter_by_email(&mut conn, email).await? else {
        bail!("Admin user not found");
    };

    if admin.role != Role::Admin {
        bail!("{email} is not an admin account");
    }

    let password_hash = bcrypt::hash(password, BCRYPT_COST).context("hashing password")?;
    database::update_password(&mut conn, &admin.id, &password_hash).await?;

    println!("Admin password updated successfully");
    Ok(())
}

pub async fn delete_user(email: &str) -> Result<()> {
    let mut conn = connect().await;

    let Some(user) = database::find_voter_by_email(&mut conn, email).await? else {
        println!("User not found");
        return Ok(());
    };

    database::delete_voter(&mut conn, &user).await?;

    println!("User deleted successfully");
    Ok(())
}
