use crate::report::Warning;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Units {
    #[default]
    #[serde(rename = "mm")]
    Millimeters,
    #[serde(rename = "m")]
    Meters,
}

impl Units {
    /// Accepts the unit strings clients send; anything other than `mm` is meters.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("mm") {
            Units::Millimeters
        } else {
            Units::Meters
        }
    }

    pub fn to_meters(self) -> f64 {
        match self {
            Units::Millimeters => 0.001,
            Units::Meters => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dims {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Dims {
    pub const fn new(width: f64, depth: f64, height: f64) -> Self {
        Self {
            width,
            depth,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SlopeAxis {
    #[default]
    Y,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSlope {
    #[serde(default)]
    pub axis: SlopeAxis,
    pub rise: f64,
    pub run: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feet {
    pub count_x: u32,
    pub count_y: u32,
    pub size: [f64; 3],
    pub pad: [f64; 2],
    #[serde(default)]
    pub fillet: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cutout {
    pub at: [f64; 3],
    pub size: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    #[serde(default)]
    pub front_chamfer: Option<f64>,
    #[serde(default)]
    pub panel_slope: Option<PanelSlope>,
    #[serde(default)]
    pub feet: Option<Feet>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cutouts: Vec<Cutout>,
    #[serde(default)]
    pub global_fillet: Option<f64>,
}

impl Features {
    pub fn is_empty(&self) -> bool {
        self.front_chamfer.is_none()
            && self.panel_slope.is_none()
            && self.feet.is_none()
            && self.cutouts.is_empty()
            && self.global_fillet.is_none()
    }
}

fn null_as_empty<'de, D>(de: D) -> Result<Vec<Cutout>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Cutout>>::deserialize(de)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    #[serde(default)]
    pub units: Units,
    pub bbox: Dims,
    #[serde(default)]
    pub features: Features,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResponse {
    pub dims: Dims,
    #[serde(default)]
    pub features_proposed: Features,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}
