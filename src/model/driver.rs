use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Driver {
    pub id: String,
    pub name: String,
    pub code: Option<String>,
    pub number: Option<u32>,
    pub nationality: String,
    pub constructor: String,
    pub position: Option<u32>,
    pub points: f64,
    pub wins: u32,
}
