use rusqlite::ToSql;

/// Ordering of a ratings query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatingOrder {
    /// Newest delivery first
    Delivered,
    /// Ratings in the anchor set first, then newest delivery first
    AnchorFirst(Vec<i64>),
    /// Ratings in the anchor set first, then ratings that sort below the newest anchor
    /// rating by (delivered, rating_id), then anything above it. Each group newest first.
    AnchorSnapshot(Vec<i64>),
}

impl RatingOrder {
    /// Anchor-first ordering, or plain delivery order when there is nothing to anchor to.
    pub fn anchor_first(anchor_ids: &[i64]) -> Self {
        match anchor_ids.is_empty() {
            true => RatingOrder::Delivered,
            false => RatingOrder::AnchorFirst(anchor_ids.to_vec()),
        }
    }

    /// Snapshot ordering, or plain delivery order when there is nothing to anchor to.
    pub fn anchor_snapshot(anchor_ids: &[i64]) -> Self {
        match anchor_ids.is_empty() {
            true => RatingOrder::Delivered,
            false => RatingOrder::AnchorSnapshot(anchor_ids.to_vec()),
        }
    }

    pub fn to_order_clause(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut order_clause = "\nORDER BY ".to_string();
        let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

        match self {
            RatingOrder::Delivered => {}
            RatingOrder::AnchorFirst(anchor_ids) => {
                order_clause.push_str(&format!(
                    "CASE WHEN r.rating_id IN ({}) THEN 1 ELSE 0 END DESC, ",
                    placeholders(anchor_ids.len())
                ));
                push_ids(&mut params_vec, anchor_ids);
            }
            RatingOrder::AnchorSnapshot(anchor_ids) => {
                let list = placeholders(anchor_ids.len());
                order_clause.push_str(&format!(
                    "CASE WHEN r.rating_id IN ({list}) THEN 1 ELSE 0 END DESC, \
                     CASE WHEN (r.delivered, r.rating_id) > (SELECT a.delivered, a.rating_id FROM ratings a \
                     WHERE a.rating_id IN ({list}) ORDER BY a.delivered DESC, a.rating_id DESC LIMIT 1) \
                     THEN 1 ELSE 0 END ASC, "
                ));
                push_ids(&mut params_vec, anchor_ids);
                push_ids(&mut params_vec, anchor_ids);
            }
        }

        // rating_id breaks delivered ties (and orders NULL deliveries) so repeated calls agree
        order_clause.push_str("r.delivered DESC, r.rating_id DESC");

        (order_clause, params_vec)
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn push_ids(params_vec: &mut Vec<Box<dyn ToSql>>, ids: &[i64]) {
    params_vec.extend(ids.iter().map(|id| Box::new(*id) as Box<dyn ToSql>));
}
