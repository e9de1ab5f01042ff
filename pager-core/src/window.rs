//! Window planning for the page source.
//!
//! Pure decision logic for which boundary loads a window read should
//! trigger. The page source reads a window from the cache store and
//! asks this module whether the window is close enough to an
//! unexhausted boundary to warrant a prepend or append.

/// The boundary loads a window read should trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowPlan {
    /// The window is within prefetch distance of the cached start.
    pub need_prepend: bool,
    /// The window is within prefetch distance of the cached end.
    pub need_append: bool,
}

/// Decide which boundary loads a window read should trigger.
///
/// `offset`/`limit` describe the requested window over the cached
/// items, `cached` is the number of items currently in the store, and
/// `prefetch_distance` is how many items short of a boundary a read may
/// come before the next page is requested. Exhausted boundaries
/// (`end_reached_*`) are never requested.
pub fn plan_window(
    offset: usize,
    limit: usize,
    cached: usize,
    prefetch_distance: usize,
    end_reached_start: bool,
    end_reached_end: bool,
) -> WindowPlan {
    let window_end = offset.saturating_add(limit);

    WindowPlan {
        need_prepend: !end_reached_start && offset <= prefetch_distance,
        need_append: !end_reached_end && window_end.saturating_add(prefetch_distance) >= cached,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_window_triggers_nothing() {
        let plan = plan_window(10, 20, 100, 5, false, false);
        assert!(!plan.need_prepend);
        assert!(!plan.need_append);
    }

    #[test]
    fn window_at_start_triggers_prepend() {
        let plan = plan_window(0, 20, 100, 5, false, false);
        assert!(plan.need_prepend);
        assert!(!plan.need_append);
    }

    #[test]
    fn window_within_prefetch_of_start_triggers_prepend() {
        let plan = plan_window(5, 20, 100, 5, false, false);
        assert!(plan.need_prepend);

        let plan = plan_window(6, 20, 100, 5, false, false);
        assert!(!plan.need_prepend);
    }

    #[test]
    fn window_at_end_triggers_append() {
        let plan = plan_window(80, 20, 100, 0, false, false);
        assert!(plan.need_append);
        assert!(!plan.need_prepend);
    }

    #[test]
    fn window_within_prefetch_of_end_triggers_append() {
        let plan = plan_window(70, 20, 100, 10, false, false);
        assert!(plan.need_append);

        let plan = plan_window(60, 20, 100, 10, false, false);
        assert!(!plan.need_append);
    }

    #[test]
    fn window_past_cached_end_triggers_append() {
        // Placeholder-style reads address offsets beyond the cache.
        let plan = plan_window(200, 20, 100, 0, false, false);
        assert!(plan.need_append);
    }

    #[test]
    fn exhausted_boundaries_are_never_requested() {
        let plan = plan_window(0, 20, 20, 5, true, true);
        assert!(!plan.need_prepend);
        assert!(!plan.need_append);
    }

    #[test]
    fn empty_cache_requests_append() {
        let plan = plan_window(0, 20, 0, 0, false, false);
        assert!(plan.need_append);
    }

    #[test]
    fn overflow_is_saturating() {
        let plan = plan_window(usize::MAX, usize::MAX, 100, usize::MAX, false, false);
        assert!(plan.need_append);
        assert!(plan.need_prepend);
    }
}
