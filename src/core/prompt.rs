use crate::core::catalog;
use crate::domain::model::CardReading;

fn card_line(card: &CardReading) -> String {
    let mut line = String::with_capacity(128);

    line.push_str("- ");
    if let Some(position) = &card.position {
        line.push_str(position);
        line.push_str(": ");
    }
    line.push_str(&card.name);
    line.push_str(" (");
    line.push_str(&card.orientation);
    line.push_str("). Palabras clave: ");
    line.push_str(&card.keywords.join(", "));
    line.push_str(". Interpretación: ");
    line.push_str(&card.interpretation);

    line
}

/// Renders the generation prompt. Same inputs always yield the same text.
pub fn build_prompt(reading_type: &str, question: Option<&str>, cards: &[CardReading]) -> String {
    let mut out = String::with_capacity(256 + cards.len() * 160);

    out.push_str("Cartas seleccionadas para la pregunta: \"");
    out.push_str(question.unwrap_or("").trim());
    out.push_str("\"\n");

    for card in cards {
        out.push_str(&card_line(card));
        out.push('\n');
    }

    out.push_str(catalog::instructions(reading_type));
    out.push('\n');
    out.push_str(catalog::CLOSING_INSTRUCTIONS);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(name: &str, position: Option<&str>) -> CardReading {
        CardReading {
            name: name.to_string(),
            orientation: "Invertida".to_string(),
            keywords: vec!["cambio".to_string(), "cierre".to_string()],
            interpretation: "Un ciclo termina.".to_string(),
            position: position.map(str::to_string),
        }
    }

    #[test]
    fn test_prompt_lists_every_card_with_position() {
        let cards = vec![reading("La Muerte", Some("Pasado")), reading("La Torre", None)];

        let prompt = build_prompt("three_card", Some("¿Tendré éxito?"), &cards);
        let lines: Vec<&str> = prompt.lines().collect();

        assert_eq!(lines[0], "Cartas seleccionadas para la pregunta: \"¿Tendré éxito?\"");
        assert_eq!(
            lines[1],
            "- Pasado: La Muerte (Invertida). Palabras clave: cambio, cierre. Interpretación: Un ciclo termina."
        );
        assert_eq!(
            lines[2],
            "- La Torre (Invertida). Palabras clave: cambio, cierre. Interpretación: Un ciclo termina."
        );
        assert_eq!(lines[3], catalog::instructions("three_card"));
        assert_eq!(lines[4], catalog::CLOSING_INSTRUCTIONS);
    }

    #[test]
    fn test_prompt_is_deterministic_and_handles_missing_question() {
        let cards = vec![reading("El Sol", None)];

        let first = build_prompt("single", None, &cards);
        let second = build_prompt("single", None, &cards);

        assert_eq!(first, second);
        assert!(first.starts_with("Cartas seleccionadas para la pregunta: \"\"\n"));
    }

    #[test]
    fn test_unknown_type_uses_default_instructions() {
        let prompt = build_prompt("mystery", Some("hola"), &[]);
        assert!(prompt.contains(catalog::DEFAULT_INSTRUCTIONS));
        assert!(prompt.ends_with(catalog::CLOSING_INSTRUCTIONS));
    }
}
