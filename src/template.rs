use anyhow::Result;
use handlebars::{handlebars_helper, Handlebars};
use serde_derive::Serialize;
use serde_json::Value;

use crate::model::Queue;
use crate::summary::ComponentSummary;

pub const TEMPLATE: &str = r#"{{pad "Component" width}}{{#each queues}}  {{lpad this 6}}{{/each}}  {{lpad "Total" 6}}
{{#each rows}}{{pad component ../width}}{{#each counts}}  {{lpad this 6}}{{/each}}  {{lpad total 6}}
{{/each}}{{pad "TOTAL" width}}{{#each totals}}  {{lpad this 6}}{{/each}}  {{lpad grand_total 6}}
"#;

const COMPONENT_HEADER: &str = "Component";
const TOTAL_LABEL: &str = "TOTAL";

#[derive(Serialize)]
struct Row<'a> {
    component: &'a str,
    counts: Vec<usize>,
    total: usize,
}

#[derive(Serialize)]
struct Report<'a> {
    width: usize,
    queues: Vec<&'static str>,
    rows: Vec<Row<'a>>,
    totals: Vec<usize>,
    grand_total: usize,
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

handlebars_helper!(pad: |value: Json, width: u64| format!("{:<width$}", text(value), width = width as usize));
handlebars_helper!(lpad: |value: Json, width: u64| format!("{:>width$}", text(value), width = width as usize));

pub fn registry() -> Result<Handlebars<'static>> {
    let mut reg = Handlebars::new();
    reg.register_escape_fn(handlebars::no_escape);
    reg.register_helper("pad", Box::new(pad));
    reg.register_helper("lpad", Box::new(lpad));
    reg.register_template_string("report", TEMPLATE)?;
    Ok(reg)
}

/// Renders the ranked table: a header, one line per component and a totals line.
pub fn render(hb: &Handlebars, queues: &[Queue], rows: &[ComponentSummary]) -> Result<String> {
    let width = rows
        .iter()
        .map(|row| row.component.chars().count())
        .chain([COMPONENT_HEADER.len(), TOTAL_LABEL.len()])
        .max()
        .unwrap_or(COMPONENT_HEADER.len());

    let totals: Vec<usize> = queues
        .iter()
        .map(|&queue| rows.iter().map(|row| row.count(queue)).sum())
        .collect();

    let report = Report {
        width,
        queues: queues.iter().map(|queue| queue.label()).collect(),
        rows: rows
            .iter()
            .map(|row| Row {
                component: &row.component,
                counts: queues.iter().map(|&queue| row.count(queue)).collect(),
                total: row.total,
            })
            .collect(),
        grand_total: totals.iter().sum(),
        totals,
    };

    Ok(hb.render("report", &report)?)
}
