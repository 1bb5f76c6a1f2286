use crate::error::SitlyError;

/// Page descriptor handed to the ratings resolver.
///
/// Values are stored as given: callers are responsible for `number >= 1`, `limit >= 1`
/// and an `offset` that agrees with the other two.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u32,
    pub limit: u32,
    pub offset: u32,
}

impl PageRequest {
    pub fn new(number: u32, limit: u32, offset: u32) -> Self {
        PageRequest {
            number,
            limit,
            offset,
        }
    }

    /// Builds the request for page `number` using the conventional `(number - 1) * limit` offset.
    pub fn for_page(number: u32, limit: u32) -> Self {
        let offset = number.saturating_sub(1).saturating_mul(limit);
        Self::new(number, limit, offset)
    }

    /// Caller-side validation for user supplied paging: `number >= 1` and `1 <= limit <= max_limit`.
    pub fn checked(number: u32, limit: u32, max_limit: u32) -> Result<Self, SitlyError> {
        if number == 0 {
            return Err(SitlyError::InvalidInput(
                "page numbers start at 1".to_string(),
            ));
        }

        if limit == 0 || limit > max_limit {
            return Err(SitlyError::InvalidInput(format!(
                "limit must be between 1 and {max_limit}, got {limit}"
            )));
        }

        Ok(Self::for_page(number, limit))
    }

    pub fn is_first(&self) -> bool {
        self.number <= 1
    }

    /// Page 1 with this request's limit.
    pub fn first(&self) -> Self {
        Self::new(1, self.limit, 0)
    }
}
