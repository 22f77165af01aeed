use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Court {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub sport_type: String,
    pub hourly_rate: f64,
    #[serde(default)]
    pub shared_allocation: bool,
}

// How much of a physical court a booking occupies.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AllocationType {
    #[default]
    Full,
    HalfA,
    HalfB,
}

impl AllocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationType::Full => "full",
            AllocationType::HalfA => "half_a",
            AllocationType::HalfB => "half_b",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "half_a" => AllocationType::HalfA,
            "half_b" => AllocationType::HalfB,
            _ => AllocationType::Full,
        }
    }

    pub fn is_half(&self) -> bool {
        matches!(self, AllocationType::HalfA | AllocationType::HalfB)
    }
}
