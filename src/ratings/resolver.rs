use log::Level;
use logging_timer::timer;
use rusqlite::{Connection, ToSql};

use crate::error::SitlyError;

use super::{
    filter::{RatingCriteria, RatingsPredicate},
    model::{Rating, RatingPage},
    order::RatingOrder,
    pagination::PageRequest,
};

const RATINGS_SQL_QUERY: &str = "SELECT {select_list}
FROM ratings r
JOIN messages m ON m.message_id = r.message_id
JOIN users u ON u.user_id = m.sender_id
LEFT JOIN profiles p ON p.user_id = u.user_id
LEFT JOIN places pl ON pl.place_id = p.place_id{where_clause}{order_clause}{limit_clause}{offset_clause}";

/// Stable paginated retrieval of the ratings feed.
///
/// Page 1 is always fetched first to find the anchor set: the ratings a client sees
/// as the first page. Later pages are ordered with the anchor set in front, so writes
/// landing between page loads don't push already-seen ratings onto the next page.
pub struct Ratings;

impl Ratings {
    /// Returns one page of the feed: page 1 as is, or page N anchored to a freshly
    /// fetched page 1 under the same criteria.
    pub fn find_page(
        conn: &Connection,
        criteria: &RatingCriteria,
        page: PageRequest,
    ) -> Result<RatingPage, SitlyError> {
        let anchor_set = Self::fetch_anchor_set(conn, criteria, page)?;

        if page.is_first() {
            return Ok(anchor_set);
        }

        Self::fetch_anchored_page(conn, criteria, page, &anchor_set.ids())
    }

    /// Returns page N anchored to the ratings the client actually saw on page 1.
    ///
    /// Ratings delivered after the newest seen rating are ordered behind everything the
    /// client could already have scrolled past, so they can't displace later pages.
    /// A first-page request ignores `seen_ids` and behaves like `find_page`.
    pub fn find_page_after(
        conn: &Connection,
        criteria: &RatingCriteria,
        page: PageRequest,
        seen_ids: &[i64],
    ) -> Result<RatingPage, SitlyError> {
        if page.is_first() {
            return Self::fetch_anchor_set(conn, criteria, page);
        }

        let predicate = RatingsPredicate::build(criteria, page.number);
        let order = RatingOrder::anchor_snapshot(seen_ids);
        Self::find_and_count(conn, &predicate, &order, page.limit, page.offset)
    }

    /// Page 1 under `criteria`, using the limit of the requested page.
    pub fn fetch_anchor_set(
        conn: &Connection,
        criteria: &RatingCriteria,
        page: PageRequest,
    ) -> Result<RatingPage, SitlyError> {
        let first = page.first();
        let predicate = RatingsPredicate::build(criteria, first.number);
        Self::find_and_count(conn, &predicate, &RatingOrder::Delivered, first.limit, first.offset)
    }

    /// The requested page ordered with `anchor_ids` first, then newest delivery first.
    /// An empty anchor means plain delivery order.
    pub fn fetch_anchored_page(
        conn: &Connection,
        criteria: &RatingCriteria,
        page: PageRequest,
        anchor_ids: &[i64],
    ) -> Result<RatingPage, SitlyError> {
        let predicate = RatingsPredicate::build(criteria, page.number);
        let order = RatingOrder::anchor_first(anchor_ids);
        Self::find_and_count(conn, &predicate, &order, page.limit, page.offset)
    }

    /// Runs the count and the page query inside one read transaction so both see the same data.
    pub fn find_and_count(
        conn: &Connection,
        predicate: &RatingsPredicate,
        order: &RatingOrder,
        limit: u32,
        offset: u32,
    ) -> Result<RatingPage, SitlyError> {
        let _tmr = timer!(Level::Trace; "Ratings::find_and_count", "limit={} offset={}", limit, offset);

        let tx = conn.unchecked_transaction()?;

        let count = Self::count(&tx, predicate)?;
        let rows = Self::fetch_rows(&tx, predicate, order, limit, offset)?;

        tx.commit()?;

        Ok(RatingPage { rows, count })
    }

    fn count(conn: &Connection, predicate: &RatingsPredicate) -> Result<i64, SitlyError> {
        let (sql, params_vec) = Self::build_sql(predicate, None, None, None);
        let sql_params: Vec<&dyn ToSql> = params_vec.iter().map(|b| &**b).collect();

        let count: i64 = conn
            .prepare(&sql)?
            .query_row(&sql_params[..], |row| row.get(0))?;

        Ok(count)
    }

    fn fetch_rows(
        conn: &Connection,
        predicate: &RatingsPredicate,
        order: &RatingOrder,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Rating>, SitlyError> {
        let (sql, params_vec) = Self::build_sql(predicate, Some(order), Some(limit), Some(offset));
        let sql_params: Vec<&dyn ToSql> = params_vec.iter().map(|b| &**b).collect();

        let mut sql_statement = conn.prepare(&sql)?;
        let rows = sql_statement
            .query_map(&sql_params[..], Rating::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Builds the SQL text and parameters. Without an order the query is a COUNT(*) over
    /// the same joins and predicate.
    fn build_sql(
        predicate: &RatingsPredicate,
        order: Option<&RatingOrder>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> (String, Vec<Box<dyn ToSql>>) {
        let (where_clause, mut params_vec) = predicate.to_where_clause();

        let (select_list, order_clause) = match order {
            Some(order) => {
                let (order_clause, order_params) = order.to_order_clause();
                params_vec.extend(order_params);
                (Rating::SELECT_LIST, order_clause)
            }
            None => ("COUNT(*)", String::new()),
        };

        let limit_clause = limit
            .map(|l| format!("\nLIMIT {l}"))
            .unwrap_or_default();
        let offset_clause = offset
            .map(|o| format!("\nOFFSET {o}"))
            .unwrap_or_default();

        let sql = RATINGS_SQL_QUERY
            .replace("{select_list}", select_list)
            .replace("{where_clause}", &where_clause)
            .replace("{order_clause}", &order_clause)
            .replace("{limit_clause}", &limit_clause)
            .replace("{offset_clause}", &offset_clause);

        (sql, params_vec)
    }
}
