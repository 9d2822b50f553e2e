use super::Image;
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum ActivityPeriod {
    Timespan {
        start_year: u16,
        end_year: Option<u16>,
    },
    Decade(u16),
}

#[derive(Clone, Deserialize, Serialize, Debug, PartialEq, Eq)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub genre: Vec<String>,
    pub portraits: Vec<Image>,
    pub activity_periods: Vec<ActivityPeriod>,
    pub related: Vec<String>,
    pub portrait_group: Vec<Image>,
}

#[derive(Clone, Serialize)]
pub struct ArtistDiscography {
    pub albums: Vec<String>,
    pub features: Vec<String>,
}
