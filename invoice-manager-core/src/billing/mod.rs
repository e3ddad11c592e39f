pub mod purchase_orders;
pub mod totals;

pub use purchase_orders::merge_purchase_orders;
pub use totals::{compute_totals, recompute_totals, Totals};
