//! Event filter helpers for `Scene::on`

use crate::scenes::EventFilter;

/// Predicate filter on the message payload.
///
/// `"text"` matches messages carrying non-empty text; any other kind never
/// matches.
pub fn message(kind: &str) -> EventFilter {
    match kind {
        "text" => EventFilter::predicate(|ctx| ctx.text().is_some_and(|text| !text.is_empty())),
        _ => EventFilter::predicate(|_| false),
    }
}
