use crate::models::PurchaseOrder;

/// Appends every candidate whose PO number is not already present.
///
/// Matching is an exact string comparison on `po_number`. Existing entries
/// keep their position and date; candidates are appended in order. Returns
/// the number of entries added.
pub fn merge_purchase_orders(
    existing: &mut Vec<PurchaseOrder>,
    candidates: &[PurchaseOrder],
) -> usize {
    let before = existing.len();
    for candidate in candidates {
        if !existing.iter().any(|po| po.po_number == candidate.po_number) {
            existing.push(candidate.clone());
        }
    }
    existing.len() - before
}
