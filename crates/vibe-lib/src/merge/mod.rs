pub mod column;
pub mod offset;
pub mod order;

pub use column::find_matching_column;
pub use offset::{merge_tables, MergeOutcome, SegmentReport};
pub use order::{extract_ex_number, natural_sort};
