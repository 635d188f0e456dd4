/// Five elements, zodiac signs and earthly branches used by thematic scoring.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Wood,
    Fire,
    Earth,
    Metal,
    Water,
}

impl Element {
    pub fn all() -> &'static [Element] {
        &[
            Element::Wood,
            Element::Fire,
            Element::Earth,
            Element::Metal,
            Element::Water,
        ]
    }

    /// The tag string characters carry for this element.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Wood => "wood",
            Self::Fire => "fire",
            Self::Earth => "earth",
            Self::Metal => "metal",
            Self::Water => "water",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Element> {
        match tag {
            "wood" => Some(Self::Wood),
            "fire" => Some(Self::Fire),
            "earth" => Some(Self::Earth),
            "metal" => Some(Self::Metal),
            "water" => Some(Self::Water),
            _ => None,
        }
    }

    /// Generating cycle: wood feeds fire, fire makes earth, earth bears
    /// metal, metal carries water, water nourishes wood.
    pub fn generates(&self) -> Element {
        match self {
            Self::Wood => Self::Fire,
            Self::Fire => Self::Earth,
            Self::Earth => Self::Metal,
            Self::Metal => Self::Water,
            Self::Water => Self::Wood,
        }
    }

    /// Overcoming cycle: wood parts earth, earth dams water, water quenches
    /// fire, fire melts metal, metal cuts wood.
    pub fn overcomes(&self) -> Element {
        match self {
            Self::Wood => Self::Earth,
            Self::Earth => Self::Water,
            Self::Water => Self::Fire,
            Self::Fire => Self::Metal,
            Self::Metal => Self::Wood,
        }
    }

    /// The element that generates this one.
    pub fn nourished_by(&self) -> Element {
        Element::all()
            .iter()
            .copied()
            .find(|e| e.generates() == *self)
            .unwrap_or(*self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChineseZodiac {
    Rat,
    Ox,
    Tiger,
    Rabbit,
    Dragon,
    Snake,
    Horse,
    Goat,
    Monkey,
    Rooster,
    Dog,
    Pig,
}

impl ChineseZodiac {
    /// Fixed element of the animal sign.
    pub fn element(&self) -> Element {
        match self {
            Self::Rat | Self::Pig => Element::Water,
            Self::Tiger | Self::Rabbit => Element::Wood,
            Self::Snake | Self::Horse => Element::Fire,
            Self::Monkey | Self::Rooster => Element::Metal,
            Self::Ox | Self::Dragon | Self::Goat | Self::Dog => Element::Earth,
        }
    }

    pub fn parse(s: &str) -> Option<ChineseZodiac> {
        match s.to_lowercase().as_str() {
            "rat" => Some(Self::Rat),
            "ox" => Some(Self::Ox),
            "tiger" => Some(Self::Tiger),
            "rabbit" => Some(Self::Rabbit),
            "dragon" => Some(Self::Dragon),
            "snake" => Some(Self::Snake),
            "horse" => Some(Self::Horse),
            "goat" | "sheep" => Some(Self::Goat),
            "monkey" => Some(Self::Monkey),
            "rooster" => Some(Self::Rooster),
            "dog" => Some(Self::Dog),
            "pig" => Some(Self::Pig),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WesternZodiac {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl WesternZodiac {
    /// Character tags that resonate with the sign.
    pub fn affinity_tags(&self) -> &'static [&'static str] {
        match self {
            Self::Aries | Self::Leo | Self::Sagittarius => &["fire", "courage", "bright"],
            Self::Taurus | Self::Virgo | Self::Capricorn => &["earth", "steady", "mountain"],
            Self::Gemini | Self::Libra | Self::Aquarius => &["wisdom", "literary", "soar"],
            Self::Cancer | Self::Scorpio | Self::Pisces => &["water", "gentle", "pure"],
        }
    }
}

/// Earthly branch for a birth hour (0-23). The 子 branch spans 23:00-00:59.
pub fn hour_branch(hour: u8) -> usize {
    ((hour as usize + 1) / 2) % 12
}

/// Element of an earthly branch index, 子 = 0.
pub fn branch_element(branch: usize) -> Element {
    match branch % 12 {
        0 | 11 => Element::Water,
        2 | 3 => Element::Wood,
        5 | 6 => Element::Fire,
        8 | 9 => Element::Metal,
        _ => Element::Earth,
    }
}
