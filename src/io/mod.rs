/// CSV export of the history window.
pub mod export;
