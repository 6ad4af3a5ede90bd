pub mod fetch_progress;
pub mod paged_fetcher;
pub mod pagination_cursor;
pub mod raw_accumulated;
