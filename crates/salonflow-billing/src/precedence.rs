//! Ordered override resolution.
//!
//! Billing values come from a chain of sources (custom price, negotiated base
//! price, plan list price; billing-level trial end, organization trial end).
//! Every chain resolves through `first_defined`.

/// First `Some` in precedence order, or `None` when every source is unset.
pub fn first_defined<T, I>(sources: I) -> Option<T>
where
    I: IntoIterator<Item = Option<T>>,
{
    sources.into_iter().flatten().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_defined_wins() {
        assert_eq!(first_defined([None, Some(2), Some(3)]), Some(2));
        assert_eq!(first_defined([Some(1), None, Some(3)]), Some(1));
    }

    #[test]
    fn test_all_unset() {
        assert_eq!(first_defined::<u32, _>([None, None]), None);
        assert_eq!(first_defined::<u32, _>([]), None);
    }
}
