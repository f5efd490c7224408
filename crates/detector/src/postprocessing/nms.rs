use crate::detection::BoundingBox;
use common::span_debug;

/// Greedy class-aware non-maximum suppression.
///
/// Candidates are visited in descending confidence; each accepted box
/// suppresses every later box of the same class whose IoU with it exceeds
/// `iou_threshold`. Boxes of different classes never suppress each other.
/// The result keeps the descending-confidence order. Equal confidences keep
/// their input order, so the output is deterministic for a given input.
pub fn suppress(mut candidates: Vec<BoundingBox>, iou_threshold: f32) -> Vec<BoundingBox> {
    let _s = span_debug!("nms");

    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut suppressed = vec![false; candidates.len()];
    let mut kept = Vec::new();

    for i in 0..candidates.len() {
        if suppressed[i] {
            continue;
        }
        let current = candidates[i];
        kept.push(current);

        for j in (i + 1)..candidates.len() {
            if suppressed[j] {
                continue;
            }
            let other = &candidates[j];
            if other.class_id == current.class_id && current.iou(other) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    tracing::trace!(
        candidates = candidates.len(),
        kept = kept.len(),
        "Suppressed overlapping boxes"
    );

    kept
}
