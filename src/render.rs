use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tera::Tera;

#[derive(Serialize)]
struct ReportContext {
    sections: Vec<SectionView>,
}

#[derive(Serialize)]
struct SectionView {
    index: usize,
    inputs: Vec<FieldView>,
    fields: Vec<FieldView>,
    /// Pretty JSON for non-object results, rendered as a fenced block
    raw: Option<String>,
}

#[derive(Serialize)]
struct FieldView {
    name: String,
    value: String,
}

/// Renders results into the flat Markdown report.
pub(crate) struct ReportRenderer {
    tera: Tera,
}

impl ReportRenderer {
    /// Creates a renderer with the embedded report template.
    ///
    /// # Errors
    ///
    /// Returns an error if template registration fails.
    pub(crate) fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template("report", include_str!("../templates/report.tera"))
            .map_err(|e| Error::template("report", &e))?;
        tera.register_filter("hard_break", hard_break_filter);
        Ok(Self { tera })
    }

    fn render(&self, context: &ReportContext) -> Result<String> {
        let context = tera::Context::from_serialize(context)
            .map_err(|e| Error::template("report", &e))?;
        let document = self
            .tera
            .render("report", &context)
            .map_err(|e| Error::template("report", &e))?;
        Ok(document.trim_end().to_string())
    }
}

/// Renders an ordered result list as a Markdown document.
///
/// `field_order` lists fields to display first (the schema's `required`
/// list); remaining fields follow in their original order. When
/// `batch_inputs` is given, each section starts with the matching input
/// record's fields. Multi-line string values become hard-line-break blocks;
/// non-object results render as a fenced JSON block.
///
/// # Errors
///
/// Returns a template error if rendering fails.
pub fn render_markdown(
    results: &[Value],
    field_order: &[String],
    batch_inputs: Option<&[Value]>,
) -> Result<String> {
    let sections = results
        .iter()
        .enumerate()
        .map(|(index, result)| build_section(index, result, field_order, batch_inputs))
        .collect::<Result<Vec<_>>>()?;

    ReportRenderer::new()?.render(&ReportContext { sections })
}

fn build_section(
    index: usize,
    result: &Value,
    field_order: &[String],
    batch_inputs: Option<&[Value]>,
) -> Result<SectionView> {
    let inputs = batch_inputs
        .and_then(|items| items.get(index))
        .and_then(Value::as_object)
        .map(|fields| {
            fields
                .iter()
                .map(|(name, value)| FieldView {
                    name: name.clone(),
                    value: value_as_text(value),
                })
                .collect()
        })
        .unwrap_or_default();

    let (fields, raw) = match result.as_object() {
        Some(object) => (ordered_fields(object, field_order), None),
        None => (Vec::new(), Some(serde_json::to_string_pretty(result)?)),
    };

    Ok(SectionView {
        index: index + 1,
        inputs,
        fields,
        raw,
    })
}

/// Orders result fields hinted-first, then remaining in their original order.
fn ordered_fields(result: &Map<String, Value>, hint: &[String]) -> Vec<FieldView> {
    let mut fields = Vec::with_capacity(result.len());

    for name in hint {
        if let Some(value) = result.get(name) {
            fields.push(FieldView {
                name: name.clone(),
                value: value_as_text(value),
            });
        }
    }

    for (name, value) in result {
        if !hint.contains(name) {
            fields.push(FieldView {
                name: name.clone(),
                value: value_as_text(value),
            });
        }
    }

    fields
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Tera filter turning multi-line strings into Markdown hard-break blocks:
/// every non-final line ends with two trailing spaces, continuation lines are
/// indented under the bullet.
fn hard_break_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    if let Some(s) = value.as_str() {
        if s.contains('\n') {
            let joined = s.lines().collect::<Vec<_>>().join("  \n  ");
            return Ok(tera::Value::String(joined));
        }
    }
    Ok(value.clone())
}
