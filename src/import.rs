use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::info;
use rusqlite::{named_params, Connection, Transaction};
use serde::{Deserialize, Serialize};

use crate::error::SitlyError;
use crate::ratings::Role;

/// Development data set: places, users with their profiles, and ratings with their messages
#[derive(Debug, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub places: Vec<PlaceFixture>,
    #[serde(default)]
    pub users: Vec<UserFixture>,
    #[serde(default)]
    pub ratings: Vec<RatingFixture>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceFixture {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UserFixture {
    pub id: i64,
    pub first_name: String,
    pub role: Role,
    pub profile: Option<ProfileFixture>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileFixture {
    pub place_id: Option<i64>,
    #[serde(default)]
    pub has_references: bool,
    #[serde(default)]
    pub has_first_aid: bool,
}

#[derive(Debug, Deserialize)]
pub struct RatingFixture {
    pub id: Option<i64>,
    pub sender_id: i64,
    pub receiver_id: i64,
    /// When the message carrying the rating was sent. Defaults to `delivered`.
    pub sent_at: Option<DateTime<Utc>>,
    pub rating: Option<i64>,
    #[serde(default = "default_active")]
    pub active: bool,
    pub delivered: Option<DateTime<Utc>>,
    pub comment: Option<String>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub places: usize,
    pub users: usize,
    pub ratings: usize,
}

pub struct Import;

impl Import {
    pub fn from_file(conn: &mut Connection, path: &Path) -> Result<ImportSummary, SitlyError> {
        let json = fs::read_to_string(path)?;
        let fixture: Fixture = serde_json::from_str(&json)?;

        let summary = Self::load(conn, &fixture)?;

        info!(
            "Imported {} places, {} users, {} ratings from {}",
            summary.places,
            summary.users,
            summary.ratings,
            path.display()
        );

        Ok(summary)
    }

    /// Writes the whole fixture in one transaction. Nothing is kept if any row fails.
    pub fn load(conn: &mut Connection, fixture: &Fixture) -> Result<ImportSummary, SitlyError> {
        let tx = conn.transaction()?;

        for place in &fixture.places {
            tx.execute(
                "INSERT INTO places (place_id, place_name) VALUES (:place_id, :place_name)",
                named_params! {
                    ":place_id":   place.id,
                    ":place_name": place.name,
                },
            )?;
        }

        for user in &fixture.users {
            Self::insert_user(&tx, user)?;
        }

        for rating in &fixture.ratings {
            Self::insert_rating(&tx, rating)?;
        }

        tx.commit()?;

        Ok(ImportSummary {
            places: fixture.places.len(),
            users: fixture.users.len(),
            ratings: fixture.ratings.len(),
        })
    }

    fn insert_user(tx: &Transaction, user: &UserFixture) -> Result<(), SitlyError> {
        tx.execute(
            "INSERT INTO users (user_id, first_name, role) VALUES (:user_id, :first_name, :role)",
            named_params! {
                ":user_id":    user.id,
                ":first_name": user.first_name,
                ":role":       user.role,
            },
        )?;

        if let Some(profile) = &user.profile {
            tx.execute(
                r#"
                INSERT INTO profiles (user_id, place_id, has_references, has_first_aid)
                VALUES (:user_id, :place_id, :has_references, :has_first_aid)"#,
                named_params! {
                    ":user_id":        user.id,
                    ":place_id":       profile.place_id,
                    ":has_references": profile.has_references,
                    ":has_first_aid":  profile.has_first_aid,
                },
            )?;
        }

        Ok(())
    }

    fn insert_rating(tx: &Transaction, rating: &RatingFixture) -> Result<(), SitlyError> {
        if let Some(stars) = rating.rating {
            if !(1..=5).contains(&stars) {
                return Err(SitlyError::InvalidInput(format!(
                    "Rating of {stars} is outside 1-5 (sender {})",
                    rating.sender_id
                )));
            }
        }

        let delivered = rating.delivered.map(|d| d.timestamp());
        let sent_at = rating
            .sent_at
            .map(|d| d.timestamp())
            .or(delivered)
            .unwrap_or_else(|| Utc::now().timestamp());

        tx.execute(
            r#"
            INSERT INTO messages (sender_id, receiver_id, created_at)
            VALUES (:sender_id, :receiver_id, :created_at)"#,
            named_params! {
                ":sender_id":   rating.sender_id,
                ":receiver_id": rating.receiver_id,
                ":created_at":  sent_at,
            },
        )?;
        let message_id = tx.last_insert_rowid();

        tx.execute(
            r#"
            INSERT INTO ratings (rating_id, message_id, active, rating, delivered, comment)
            VALUES (:rating_id, :message_id, :active, :rating, :delivered, :comment)"#,
            named_params! {
                ":rating_id":  rating.id,
                ":message_id": message_id,
                ":active":     rating.active,
                ":rating":     rating.rating,
                ":delivered":  delivered,
                ":comment":    rating.comment,
            },
        )?;

        Ok(())
    }
}
