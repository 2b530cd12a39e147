//! PokéAPI lookups.

use serde::Deserialize;

use super::{ApiClient, capitalize, join_url};
use crate::reply::{EmbedSpec, Reply};
use crate::{CoreError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Pokemon {
    pub name: String,
    /// Decimetres
    pub height: u32,
    /// Hectograms
    pub weight: u32,
    pub types: Vec<TypeSlot>,
    pub abilities: Vec<AbilitySlot>,
    pub stats: Vec<StatSlot>,
    pub sprites: Sprites,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeSlot {
    #[serde(rename = "type")]
    pub kind: Named,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbilitySlot {
    pub ability: Named,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatSlot {
    pub base_stat: u32,
    pub stat: Named,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sprites {
    pub front_default: Option<String>,
}

impl Pokemon {
    pub fn height_m(&self) -> f64 {
        f64::from(self.height) / 10.0
    }

    pub fn weight_kg(&self) -> f64 {
        f64::from(self.weight) / 10.0
    }

    pub fn stat(&self, name: &str) -> u32 {
        self.stats
            .iter()
            .find(|s| s.stat.name == name)
            .map(|s| s.base_stat)
            .unwrap_or(0)
    }
}

impl ApiClient {
    pub async fn pokemon(&self, name: &str) -> Result<Pokemon> {
        let query = name.trim().to_lowercase();
        if query.is_empty() {
            return Err(CoreError::invalid_argument("pokedex", "pokemon", "em falta"));
        }
        let url = join_url(
            &self.urls().pokedex_url,
            &format!("pokemon/{}", urlencoding::encode(&query)),
        );
        self.get_json("pokeapi", &url, &[])
            .await?
            .ok_or_else(|| CoreError::not_found("Pokémon", name.trim()))
    }
}

const STAT_LABELS: [(&str, &str); 6] = [
    ("hp", "HP"),
    ("attack", "Ataque"),
    ("defense", "Defesa"),
    ("special-attack", "Ataque Especial"),
    ("special-defense", "Defesa Especial"),
    ("speed", "Velocidade"),
];

pub fn render(pokemon: &Pokemon) -> Reply {
    let types = pokemon
        .types
        .iter()
        .map(|t| capitalize(&t.kind.name))
        .collect::<Vec<_>>()
        .join(", ");
    let abilities = pokemon
        .abilities
        .iter()
        .map(|a| capitalize(&a.ability.name.replace('-', " ")))
        .collect::<Vec<_>>()
        .join(", ");
    let stats = STAT_LABELS
        .iter()
        .map(|(key, label)| format!("{}: {}", label, pokemon.stat(key)))
        .collect::<Vec<_>>()
        .join("\n");

    let mut embed = EmbedSpec::new(format!("Pokémon: {}", capitalize(&pokemon.name)))
        .description(format!("Tipos: {}\nHabilidades: {}", types, abilities))
        .colour(0x2F3136)
        .field("Altura", format!("{} m", pokemon.height_m()), true)
        .field("Peso", format!("{} kg", pokemon.weight_kg()), true)
        .field("Estatísticas", stats, false);

    if let Some(sprite) = &pokemon.sprites.front_default {
        embed = embed.thumbnail(sprite.clone());
    }

    Reply::embed(embed)
}
