use crate::core::catalog;
use crate::domain::model::{Card, CardReading, SelectedCard};

/// The ids actually interpreted: the first `card_count` submissions.
pub fn selected_ids(selected: &[SelectedCard], card_count: usize) -> Vec<u32> {
    selected.iter().take(card_count).map(|card| card.id).collect()
}

/// Pairs each submitted card with its reference data, in submission order.
///
/// Submissions whose id is missing from `cards` are skipped. Position labels
/// follow the submission index, so a skipped card leaves its label unused.
pub fn assemble(
    reading_type: &str,
    selected: &[SelectedCard],
    cards: &[Card],
) -> Vec<CardReading> {
    let count = catalog::card_count(reading_type);

    selected
        .iter()
        .take(count)
        .enumerate()
        .filter_map(|(index, selection)| {
            let Some(card) = cards.iter().find(|card| card.id == selection.id) else {
                tracing::debug!("Card {} not found in store, dropping it", selection.id);
                return None;
            };

            Some(CardReading {
                name: card.name.clone(),
                orientation: selection.orientation.label().to_string(),
                keywords: card.keywords(selection.orientation).to_vec(),
                interpretation: card.interpretation(selection.orientation).to_string(),
                position: catalog::position_label(reading_type, index).map(str::to_string),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Orientation;

    fn card(id: u32) -> Card {
        Card {
            id,
            name: format!("Carta {}", id),
            keywords_upright: vec![format!("up-{}", id)],
            keywords_reversed: vec![format!("rev-{}", id)],
            interpretation_upright: format!("upright text {}", id),
            interpretation_reversed: format!("reversed text {}", id),
        }
    }

    fn pick(id: u32, orientation: Orientation) -> SelectedCard {
        SelectedCard { id, orientation }
    }

    #[test]
    fn test_orientation_selects_matching_fields() {
        let cards = vec![card(1), card(2)];
        let selected = vec![pick(1, Orientation::Reversed), pick(2, Orientation::Upright)];

        let readings = assemble("three_card", &selected, &cards);

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].orientation, "Invertida");
        assert_eq!(readings[0].keywords, vec!["rev-1"]);
        assert_eq!(readings[0].interpretation, "reversed text 1");
        assert_eq!(readings[1].orientation, "Al derecho");
        assert_eq!(readings[1].keywords, vec!["up-2"]);
        assert_eq!(readings[1].interpretation, "upright text 2");
    }

    #[test]
    fn test_missing_card_is_dropped() {
        let cards = vec![card(1), card(3)];
        let selected = vec![
            pick(1, Orientation::Upright),
            pick(2, Orientation::Upright),
            pick(3, Orientation::Upright),
        ];

        let readings = assemble("three_card", &selected, &cards);

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].name, "Carta 1");
        assert_eq!(readings[0].position.as_deref(), Some("Pasado"));
        assert_eq!(readings[1].name, "Carta 3");
        assert_eq!(readings[1].position.as_deref(), Some("Futuro"));
    }

    #[test]
    fn test_excess_cards_are_truncated() {
        let cards: Vec<Card> = (1..=5).map(card).collect();
        let selected: Vec<SelectedCard> = (1..=5).map(|id| pick(id, Orientation::Upright)).collect();

        assert_eq!(selected_ids(&selected, 3), vec![1, 2, 3]);
        assert_eq!(assemble("three_card", &selected, &cards).len(), 3);
        assert_eq!(assemble("unknown", &selected, &cards).len(), 1);
    }

    #[test]
    fn test_celtic_cross_keeps_order_and_labels() {
        let cards: Vec<Card> = (0..10).rev().map(card).collect();
        let selected: Vec<SelectedCard> = (0..10).map(|id| pick(id, Orientation::Upright)).collect();

        let readings = assemble("celtic_cross", &selected, &cards);

        assert_eq!(readings.len(), 10);
        for (index, reading) in readings.iter().enumerate() {
            assert_eq!(reading.name, format!("Carta {}", index));
            assert_eq!(
                reading.position.as_deref(),
                catalog::position_label("celtic_cross", index)
            );
        }
        assert_eq!(readings[9].position.as_deref(), Some("Síntesis"));
    }

    #[test]
    fn test_types_without_layout_have_no_position() {
        let readings = assemble("single", &[pick(1, Orientation::Upright)], &[card(1)]);
        assert_eq!(readings.len(), 1);
        assert!(readings[0].position.is_none());
    }
}
