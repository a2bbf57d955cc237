//! The built-in topic table and the fallback words.

use impostor_protocol::Difficulty;
use rand::seq::IndexedRandom;

use crate::{OracleError, WordOracle};

/// Topic every unknown topic name resolves to.
pub const DEFAULT_TOPIC: &str = "Random";

/// The built-in topics with their words, in menu order.
pub const TOPICS: &[(&str, &[&str])] = &[
    (
        "Animales",
        &[
            "León", "Tigre", "Elefante", "Jirafa", "Canguro", "Pingüino", "Delfín", "Tiburón",
            "Águila", "Búho", "Lobo", "Oso", "Mono", "Cebra", "Hipopótamo", "Rinoceronte",
            "Tortuga", "Serpiente", "Camello", "Panda",
        ],
    ),
    (
        "Vida Cotidiana",
        &[
            "Cepillo de dientes", "Llaves", "Reloj", "Celular", "Laptop", "Mochila", "Zapatos",
            "Espejo", "Control remoto", "Lámpara", "Almohada", "Toalla", "Sombrilla",
            "Billetera", "Botella de agua", "Audífonos", "Gafas", "Peine", "Jabón", "Plato",
        ],
    ),
    (
        "Comida",
        &[
            "Pizza", "Hamburguesa", "Sushi", "Taco", "Helado", "Chocolate", "Manzana", "Banana",
            "Pasta", "Ensalada", "Sopa", "Arroz", "Huevo", "Queso", "Pan", "Café", "Jugo",
            "Dona", "Galleta", "Filete",
        ],
    ),
    (
        "Deportes",
        &[
            "Fútbol", "Baloncesto", "Tenis", "Natación", "Atletismo", "Ciclismo", "Boxeo",
            "Voleibol", "Béisbol", "Golf", "Rugby", "Karate", "Surf", "Esquí", "Patinaje",
            "Yoga", "Gimnasia", "Remo", "Escalada", "Ajedrez",
        ],
    ),
    (
        "Random",
        &[
            "Bitcoin", "Inteligencia Artificial", "Agujero Negro", "Satélite", "Pirámide",
            "Volcán", "Tornado", "Galaxia", "Submarino", "Robot", "Astronauta", "Brújula",
            "Microscopio", "Telescopio", "ADN", "Molécula", "Átomo", "Chip", "Laser",
            "Holograma",
        ],
    ),
];

/// Names of the built-in topics, in menu order.
pub fn topic_names() -> impl Iterator<Item = &'static str> {
    TOPICS.iter().map(|(name, _)| *name)
}

/// The word list for `topic`. Matching ignores case and surrounding
/// whitespace; unknown topics get the [`DEFAULT_TOPIC`] list.
pub fn words_for(topic: &str) -> &'static [&'static str] {
    let wanted = topic.trim().to_lowercase();
    TOPICS
        .iter()
        .find(|(name, _)| name.to_lowercase() == wanted)
        .or_else(|| TOPICS.iter().find(|(name, _)| *name == DEFAULT_TOPIC))
        .map(|(_, words)| *words)
        .unwrap_or(&[])
}

/// Word used when the oracle fails for `(topic, difficulty)`.
///
/// Always the same entry for the same pair. Each tier reads from a
/// different third of the topic list.
pub fn fallback_word(topic: &str, difficulty: Difficulty) -> &'static str {
    let words = words_for(topic);
    if words.is_empty() {
        return "Palabra";
    }
    let stride = words.len() / 3;
    words[(difficulty.tier() * stride) % words.len()]
}

/// A [`WordOracle`] that picks uniformly from the built-in table.
///
/// Difficulty does not change the pick; every tier draws from the
/// whole topic list.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordTable;

impl WordTable {
    pub fn new() -> Self {
        Self
    }
}

impl WordOracle for WordTable {
    async fn fetch_word(&self, topic: &str, _difficulty: Difficulty) -> Result<String, OracleError> {
        words_for(topic)
            .choose(&mut rand::rng())
            .map(|w| w.to_string())
            .ok_or_else(|| OracleError::Backend(format!("no words for topic {topic:?}")))
    }
}
