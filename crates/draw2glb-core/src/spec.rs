use crate::geom::Vec3;
use crate::model::{Dims, Features, ModelSpec, Units};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("spec must be a JSON object")]
    NotAnObject,
    #[error("missing dimension `{0}`")]
    MissingDimension(&'static str),
    #[error("dimension `{0}` is not a number")]
    NotANumber(&'static str),
    #[error("dimension `{name}` must be positive and finite, got {value}")]
    OutOfRange { name: &'static str, value: f64 },
    #[error("invalid features: {0}")]
    Features(#[from] serde_json::Error),
}

/// A build request resolved to meters.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSpec {
    pub units: Units,
    /// Requested extents in spec units.
    pub dims: Dims,
    pub features: Features,
}

impl BuildSpec {
    /// Reads the shapes clients send: `{"dims": {..}}`, `{"bbox": {..}}`, or
    /// a flat object carrying `width`/`depth`/`height` itself.
    pub fn from_json(spec: &Value) -> Result<Self, SpecError> {
        let obj = spec.as_object().ok_or(SpecError::NotAnObject)?;

        let dims_value = obj
            .get("dims")
            .filter(|v| v.is_object())
            .or_else(|| obj.get("bbox").filter(|v| v.is_object()))
            .unwrap_or(spec);

        let dims = Dims::new(
            read_dim(dims_value, "width")?,
            read_dim(dims_value, "depth")?,
            read_dim(dims_value, "height")?,
        );

        let units = obj
            .get("units")
            .and_then(Value::as_str)
            .map(Units::from_label)
            .unwrap_or_default();

        let features = match obj.get("features") {
            None | Some(Value::Null) => Features::default(),
            Some(v) => serde_json::from_value(v.clone())?,
        };

        Ok(Self {
            units,
            dims,
            features,
        })
    }

    pub fn from_model_spec(spec: &ModelSpec) -> Result<Self, SpecError> {
        for (name, value) in [
            ("width", spec.bbox.width),
            ("depth", spec.bbox.depth),
            ("height", spec.bbox.height),
        ] {
            check_dim(name, value)?;
        }
        Ok(Self {
            units: spec.units,
            dims: spec.bbox,
            features: spec.features.clone(),
        })
    }

    pub fn scale(&self) -> f64 {
        self.units.to_meters()
    }

    /// Extents in meters, X = width, Y = depth, Z = height.
    pub fn size_m(&self) -> Vec3 {
        Vec3::new(self.dims.width, self.dims.depth, self.dims.height).scale(self.scale())
    }
}

fn read_dim(dims: &Value, name: &'static str) -> Result<f64, SpecError> {
    let raw = dims.get(name).ok_or(SpecError::MissingDimension(name))?;
    let value = match raw {
        Value::Number(n) => n.as_f64().ok_or(SpecError::NotANumber(name))?,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| SpecError::NotANumber(name))?,
        _ => return Err(SpecError::NotANumber(name)),
    };
    check_dim(name, value)
}

fn check_dim(name: &'static str, value: f64) -> Result<f64, SpecError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SpecError::OutOfRange { name, value })
    }
}
