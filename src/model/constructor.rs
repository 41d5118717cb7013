use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Constructor {
    pub position: Option<u32>,
    pub name: String,
    pub nationality: String,
    pub points: f64,
    pub wins: u32,
}
