use serde::Serialize;

/// Static description of one spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadingTypeConfig {
    pub key: &'static str,
    pub label: &'static str,
    pub card_count: usize,
    pub layout: &'static [&'static str],
    #[serde(skip)]
    pub instructions: &'static str,
}

pub const DEFAULT_CARD_COUNT: usize = 1;

pub const DEFAULT_INSTRUCTIONS: &str =
    "Interpreta cada carta en relación con la pregunta de quien consulta.";

pub const CLOSING_INSTRUCTIONS: &str =
    "Redacta una conclusión general para esta tirada, integrando los significados de las cartas y la pregunta.";

pub static READING_TYPES: [ReadingTypeConfig; 10] = [
    ReadingTypeConfig {
        key: "single",
        label: "Una carta",
        card_count: 1,
        layout: &[],
        instructions: "Es una tirada de una sola carta: ofrece un mensaje directo y concreto.",
    },
    ReadingTypeConfig {
        key: "three_card",
        label: "Tirada de 3 cartas",
        card_count: 3,
        layout: &["Pasado", "Presente", "Futuro"],
        instructions: "Lee las cartas como una línea temporal: pasado, presente y futuro.",
    },
    ReadingTypeConfig {
        key: "love",
        label: "Amor",
        card_count: 3,
        layout: &[],
        instructions: "Enfoca la lectura en el amor, los vínculos afectivos y las emociones.",
    },
    ReadingTypeConfig {
        key: "career",
        label: "Trabajo",
        card_count: 3,
        layout: &[],
        instructions: "Enfoca la lectura en el trabajo, la vocación y las finanzas.",
    },
    ReadingTypeConfig {
        key: "celtic_cross",
        label: "Cruz Celta",
        card_count: 10,
        layout: &[
            "Situación actual",
            "Desafío",
            "Pasado",
            "Futuro",
            "Meta",
            "Inconsciente",
            "Influencia externa",
            "Esperanzas",
            "Resultado",
            "Síntesis",
        ],
        instructions: "Es una Cruz Celta: analiza cada posición en profundidad y relaciona las cartas entre sí antes de llegar al resultado.",
    },
    ReadingTypeConfig {
        key: "yes_no",
        label: "Sí o No",
        card_count: 1,
        layout: &["Respuesta"],
        instructions: "Responde con un sí, un no o un quizás según la energía de la carta, y explica el porqué.",
    },
    ReadingTypeConfig {
        key: "love_relationship",
        label: "Relación de pareja",
        card_count: 4,
        layout: &["Tú", "La otra persona", "Obstáculos", "Potencial"],
        instructions: "Describe a ambas personas, los obstáculos de la relación y su potencial.",
    },
    ReadingTypeConfig {
        key: "soulmate",
        label: "Alma gemela",
        card_count: 3,
        layout: &["Conexión", "Bloqueos", "Camino a sanar"],
        instructions: "Explora la conexión del alma, lo que la bloquea y el camino para sanarla.",
    },
    ReadingTypeConfig {
        key: "life_purpose",
        label: "Propósito de vida",
        card_count: 4,
        layout: &["Dones", "Misión", "Bloqueos", "Próximos pasos"],
        instructions: "Habla de los dones, la misión, los bloqueos y los próximos pasos concretos.",
    },
    ReadingTypeConfig {
        key: "shadow_work",
        label: "Sombras",
        card_count: 3,
        layout: &["Inconsciente", "Miedo", "Sanación"],
        instructions: "Trabaja la sombra con tacto: lo inconsciente, el miedo y la vía de sanación.",
    },
];

pub fn lookup(reading_type: &str) -> Option<&'static ReadingTypeConfig> {
    READING_TYPES.iter().find(|config| config.key == reading_type)
}

pub fn card_count(reading_type: &str) -> usize {
    lookup(reading_type)
        .map(|config| config.card_count)
        .unwrap_or(DEFAULT_CARD_COUNT)
}

pub fn position_label(reading_type: &str, index: usize) -> Option<&'static str> {
    lookup(reading_type).and_then(|config| config.layout.get(index).copied())
}

pub fn instructions(reading_type: &str) -> &'static str {
    lookup(reading_type)
        .map(|config| config.instructions)
        .unwrap_or(DEFAULT_INSTRUCTIONS)
}
