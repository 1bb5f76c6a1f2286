use std::fmt::Debug;

use rusqlite::ToSql;

use super::model::Role;

/// Minimum star rating for a rating to appear on the first page of the feed
pub const FEATURED_MIN_RATING: i64 = 4;

/// Defines the behavior of a filter.
pub trait Filter: Debug {
    /// return predicate text and params
    fn to_predicate_parts(&self) -> (String, Vec<Box<dyn ToSql>>);
}

/// Optional narrowing of the ratings feed. `None` imposes no constraint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RatingCriteria {
    /// Role of the rating's sender
    pub role: Option<Role>,
    /// Sender profile has references
    pub has_references: Option<bool>,
    /// Sender profile has a first aid certificate
    pub has_first_aid: Option<bool>,
    /// Name of the place on the sender's profile
    pub place: Option<String>,
}

#[derive(Debug, Clone)]
struct ActiveFilter;

impl Filter for ActiveFilter {
    fn to_predicate_parts(&self) -> (String, Vec<Box<dyn ToSql>>) {
        ("(r.active = 1)".to_owned(), Vec::new())
    }
}

#[derive(Debug, Clone)]
struct MinRatingFilter {
    min_rating: i64,
}

impl Filter for MinRatingFilter {
    fn to_predicate_parts(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let params: Vec<Box<dyn ToSql>> = vec![Box::new(self.min_rating)];
        ("(r.rating >= ?)".to_owned(), params)
    }
}

#[derive(Debug, Clone)]
struct RoleFilter {
    role: Role,
}

impl Filter for RoleFilter {
    fn to_predicate_parts(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let params: Vec<Box<dyn ToSql>> = vec![Box::new(self.role)];
        ("(u.role = ?)".to_owned(), params)
    }
}

#[derive(Debug, Clone)]
struct BoolFilter {
    bool_col_db: &'static str,
    value: bool,
}

impl Filter for BoolFilter {
    fn to_predicate_parts(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let params: Vec<Box<dyn ToSql>> = vec![Box::new(self.value)];
        (format!("({} = ?)", self.bool_col_db), params)
    }
}

#[derive(Debug, Clone)]
struct PlaceFilter {
    place_name: String,
}

impl Filter for PlaceFilter {
    fn to_predicate_parts(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let params: Vec<Box<dyn ToSql>> = vec![Box::new(self.place_name.clone())];
        ("(pl.place_name = ? COLLATE NOCASE)".to_owned(), params)
    }
}

/// The WHERE clause of one ratings query. Built once per call from the criteria and page number.
#[derive(Debug)]
pub struct RatingsPredicate {
    filters: Vec<Box<dyn Filter>>,
}

impl RatingsPredicate {
    pub fn build(criteria: &RatingCriteria, page_number: u32) -> Self {
        let mut filters: Vec<Box<dyn Filter>> = vec![Box::new(ActiveFilter)];

        if page_number <= 1 {
            filters.push(Box::new(MinRatingFilter {
                min_rating: FEATURED_MIN_RATING,
            }));
        }

        if let Some(role) = criteria.role {
            filters.push(Box::new(RoleFilter { role }));
        }

        if let Some(value) = criteria.has_references {
            filters.push(Box::new(BoolFilter {
                bool_col_db: "p.has_references",
                value,
            }));
        }

        if let Some(value) = criteria.has_first_aid {
            filters.push(Box::new(BoolFilter {
                bool_col_db: "p.has_first_aid",
                value,
            }));
        }

        if let Some(place_name) = &criteria.place {
            filters.push(Box::new(PlaceFilter {
                place_name: place_name.clone(),
            }));
        }

        RatingsPredicate { filters }
    }

    pub fn to_where_clause(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut where_clause = String::new();
        let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
        let mut first = true;

        for filter in &self.filters {
            match first {
                true => {
                    first = false;
                    where_clause.push_str("\nWHERE ");
                }
                false => where_clause.push_str(" AND "),
            }

            let (pred_str, pred_vec) = filter.to_predicate_parts();
            where_clause.push_str(&pred_str);
            params_vec.extend(pred_vec);
        }

        (where_clause, params_vec)
    }
}
