//! Domain-specific assertion macros for hublex harnesses, with failure
//! messages that say which filter contract was violated.

// ---------------------------------------------------------------------------
// Filter assertions
// ---------------------------------------------------------------------------

/// Assert that a filter list contains an EQ filter on `property` = `value`.
///
/// ```rust
/// assert_eq_filter!(filters, "city", "Dallas");
/// ```
#[macro_export]
macro_rules! assert_eq_filter {
    ($filters:expr, $property:expr, $value:expr) => {{
        let filters: &[hublex_core::types::Filter] = &$filters;
        let property: &str = $property;
        let value: &str = $value;
        let found = filters.iter().any(|f| {
            f.property_name == property
                && f.operator == hublex_core::types::FilterOperator::Eq
                && f.value.as_deref() == Some(value)
        });
        if !found {
            panic!(
                "assert_eq_filter! failed: no EQ filter {property} = {value:?}.\n  Filters: {:#?}",
                filters
            );
        }
    }};
}

/// Assert that a filter list contains a HAS_PROPERTY filter on `property`.
#[macro_export]
macro_rules! assert_has_property_filter {
    ($filters:expr, $property:expr) => {{
        let filters: &[hublex_core::types::Filter] = &$filters;
        let property: &str = $property;
        let found = filters.iter().any(|f| {
            f.property_name == property
                && f.operator == hublex_core::types::FilterOperator::HasProperty
        });
        if !found {
            panic!(
                "assert_has_property_filter! failed: no HAS_PROPERTY filter on {property}.\n  Filters: {:#?}",
                filters
            );
        }
    }};
}

/// Assert the exact property-name sequence of a filter list — the stable
/// category ordering contract.
#[macro_export]
macro_rules! assert_filter_order {
    ($filters:expr, [$($property:expr),* $(,)?]) => {{
        let filters: &[hublex_core::types::Filter] = &$filters;
        let actual: Vec<&str> = filters.iter().map(|f| f.property_name.as_str()).collect();
        let expected: Vec<&str> = vec![$($property),*];
        if actual != expected {
            panic!(
                "assert_filter_order! failed:\n  expected: {:?}\n  actual:   {:?}",
                expected, actual
            );
        }
    }};
}
