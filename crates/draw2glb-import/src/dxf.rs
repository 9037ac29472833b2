use anyhow::{Context, Result};
use dxf::entities::{Entity, EntityType};
use std::collections::HashMap;
use std::io::Cursor;

/// Text and dimension values pulled from a DXF drawing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DxfAnnotations {
    pub text: String,
    /// Actual measurements of linear dimensions, in drawing units.
    pub measurements: Vec<f64>,
}

pub fn dxf_annotations(bytes: &[u8]) -> Result<DxfAnnotations> {
    let mut reader = Cursor::new(bytes);
    let drawing = dxf::Drawing::load(&mut reader).context("load DXF")?;
    Ok(annotations_of(&drawing))
}

/// Walks model space, expanding block inserts at most `MAX_INSERT_DEPTH` deep.
pub fn annotations_of(drawing: &dxf::Drawing) -> DxfAnnotations {
    let mut collector = Collector::new(drawing);
    let mut stack = Vec::new();
    for ent in drawing.entities() {
        collector.visit(ent, &mut stack, 0);
    }

    DxfAnnotations {
        text: collector.lines.join("\n"),
        measurements: collector.measurements,
    }
}

const MAX_INSERT_DEPTH: usize = 8;

struct Collector<'a> {
    blocks: HashMap<String, &'a dxf::Block>,
    lines: Vec<String>,
    measurements: Vec<f64>,
}

impl<'a> Collector<'a> {
    fn new(drawing: &'a dxf::Drawing) -> Self {
        let mut blocks = HashMap::new();
        for block in drawing.blocks() {
            blocks.insert(block.name.to_ascii_lowercase(), block);
        }
        Self {
            blocks,
            lines: Vec::new(),
            measurements: Vec::new(),
        }
    }

    fn visit(&mut self, ent: &Entity, stack: &mut Vec<String>, depth: usize) {
        match &ent.specific {
            EntityType::Insert(insert) => self.visit_insert(&insert.name, stack, depth + 1),
            EntityType::Text(t) => self.push_text(&t.value),
            EntityType::MText(t) => self.push_text(&join_mtext(t)),
            EntityType::RotatedDimension(d) => self.push_length_dimension(&d.dimension_base),
            // Ordinates measure an offset from a datum, not a part length.
            EntityType::OrdinateDimension(d) => self.push_text(&d.dimension_base.text),
            EntityType::RadialDimension(d) => self.push_text(&d.dimension_base.text),
            EntityType::DiameterDimension(d) => self.push_text(&d.dimension_base.text),
            _ => {}
        }
    }

    fn visit_insert(&mut self, name: &str, stack: &mut Vec<String>, depth: usize) {
        if depth > MAX_INSERT_DEPTH {
            return;
        }
        let name = name.to_ascii_lowercase();
        if stack.iter().any(|n| n == &name) {
            return;
        }
        let Some(block) = self.blocks.get(&name).copied() else {
            return;
        };
        stack.push(name);
        for ent in &block.entities {
            self.visit(ent, stack, depth);
        }
        stack.pop();
    }

    fn push_text(&mut self, s: &str) {
        // "<>" stands for the measured value, which is recorded separately.
        let s = s.replace("<>", " ");
        let s = s.trim();
        if !s.is_empty() {
            self.lines.push(s.to_string());
        }
    }

    /// Empty text or a `<>` placeholder shows the measured value; any other
    /// text overrides it and is the only value kept.
    fn push_length_dimension(&mut self, base: &dxf::entities::DimensionBase) {
        let shows_measurement = base.text.trim().is_empty() || base.text.contains("<>");
        self.push_text(&base.text);
        if shows_measurement {
            self.push_measurement(base.actual_measurement);
        }
    }

    fn push_measurement(&mut self, v: f64) {
        if v.is_finite() && v > 0.0 {
            self.measurements.push(v);
        }
    }
}

fn join_mtext(t: &dxf::entities::MText) -> String {
    if t.extended_text.is_empty() {
        return t.text.clone();
    }
    let mut s = String::new();
    s.push_str(&t.text);
    for part in &t.extended_text {
        s.push_str(part);
    }
    s
}
