use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{Row, ToSql};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Marketplace role of a user
#[derive(
    AsRefStr, Display, EnumIter, EnumString, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Parent,
    Babysitter,
    Childminder,
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_ref()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// The user who sent the message a rating was given in, flattened with profile and place
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RatingSender {
    pub user_id: i64,
    pub first_name: String,
    pub role: Role,
    pub place_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Rating {
    pub rating_id: i64,
    pub message_id: i64,
    pub active: bool,
    pub rating: Option<i64>,
    pub delivered: Option<i64>,
    pub comment: Option<String>,
    pub sender: RatingSender,
}

impl Rating {
    /// Column list matching `from_row`. Aliases refer to the joins in the ratings query.
    pub const SELECT_LIST: &'static str = "r.rating_id, r.message_id, r.active, r.rating, r.delivered, r.comment, \
         u.user_id, u.first_name, u.role, pl.place_name";

    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Rating {
            rating_id: row.get(0)?,
            message_id: row.get(1)?,
            active: row.get(2)?,
            rating: row.get(3)?,
            delivered: row.get(4)?,
            comment: row.get(5)?,
            sender: RatingSender {
                user_id: row.get(6)?,
                first_name: row.get(7)?,
                role: row.get(8)?,
                place_name: row.get(9)?,
            },
        })
    }
}

/// One page of ratings plus the total number matching the filter, ignoring pagination
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RatingPage {
    pub rows: Vec<Rating>,
    pub count: i64,
}

impl RatingPage {
    pub fn ids(&self) -> Vec<i64> {
        self.rows.iter().map(|rating| rating.rating_id).collect()
    }
}
