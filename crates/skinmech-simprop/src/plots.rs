//! Property boxplots and the random-search trace.

use std::fs;
use std::path::Path;

use plotters::prelude::*;
use skinmech::stats::mean;
use skinmech::{FiveNumberSummary, ParameterColumn, ParameterTable};

use crate::design::DesignProperties;
use crate::sampling::TracePoint;

const BOX_HALF_WIDTH: f64 = 0.25;

struct BoxColumn {
    label: &'static str,
    summary: FiveNumberSummary,
    annotations: [f64; 5],
    integer_labels: bool,
}

/// Boxplots of thickness, modulus and viscoelasticity, each normalized by
/// its mean and annotated with the design levels.
pub fn plot_property_boxes(
    table: &ParameterTable,
    design: &DesignProperties,
    path: &Path,
) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut ginf_labels = design.ginf;
    ginf_labels[0] = design.observed_ginf_min;
    let specs = [
        ("Thickness (um)", ParameterColumn::Thickness, design.thickness, true),
        ("Modulus", ParameterColumn::Alpha, design.alpha, false),
        ("Viscoelasticity", ParameterColumn::Ginf, ginf_labels, false),
    ];

    let mut columns = Vec::with_capacity(specs.len());
    for (label, column, annotations, integer_labels) in specs {
        let values = table.column(column);
        let scale = mean(&values)?;
        anyhow::ensure!(scale != 0.0, "column {} has zero mean", column.name());
        let normalized: Vec<f64> = values.iter().map(|v| v / scale).collect();
        columns.push(BoxColumn {
            label,
            summary: FiveNumberSummary::from_data(&normalized)?,
            annotations: annotations.map(|v| v / scale),
            integer_labels,
        });
    }
    let raw_annotations: Vec<[f64; 5]> = vec![design.thickness, design.alpha, ginf_labels];

    let y_max = columns
        .iter()
        .flat_map(|c| c.summary.to_array().into_iter().chain(c.annotations))
        .fold(1.0_f64, f64::max)
        * 1.1;

    let root = BitMapBackend::new(path, (1200, 900)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(0.5..(columns.len() as f64 + 0.5), -0.1..y_max)?;

    for (idx, column) in columns.iter().enumerate() {
        let x = idx as f64 + 1.0;
        let s = column.summary;
        chart.draw_series(std::iter::once(Rectangle::new(
            [
                (x - BOX_HALF_WIDTH, s.lower_quartile),
                (x + BOX_HALF_WIDTH, s.upper_quartile),
            ],
            BLACK.stroke_width(2),
        )))?;
        chart.draw_series(
            [
                vec![(x - BOX_HALF_WIDTH, s.median), (x + BOX_HALF_WIDTH, s.median)],
                vec![(x, s.upper_quartile), (x, s.upper_whisker)],
                vec![(x, s.lower_quartile), (x, s.lower_whisker)],
                vec![
                    (x - BOX_HALF_WIDTH / 2.0, s.upper_whisker),
                    (x + BOX_HALF_WIDTH / 2.0, s.upper_whisker),
                ],
                vec![
                    (x - BOX_HALF_WIDTH / 2.0, s.lower_whisker),
                    (x + BOX_HALF_WIDTH / 2.0, s.lower_whisker),
                ],
            ]
            .into_iter()
            .map(|points| PathElement::new(points, BLACK.stroke_width(2))),
        )?;

        chart.draw_series(column.annotations.iter().zip(raw_annotations[idx]).map(
            |(&y, raw)| {
                let text = if column.integer_labels {
                    format!("{}", raw.round() as i64)
                } else {
                    format!("{raw:.2}")
                };
                Text::new(text, (x + BOX_HALF_WIDTH + 0.05, y), ("sans-serif", 20).into_font())
            },
        ))?;

        chart.draw_series(std::iter::once(Text::new(
            column.label,
            (x - BOX_HALF_WIDTH, -0.07),
            ("sans-serif", 22).into_font(),
        )))?;
    }

    root.present()?;
    Ok(())
}

/// Best covariance residual against random-search budget.
pub fn plot_random_trace(trace: &[TracePoint], path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    anyhow::ensure!(!trace.is_empty(), "random-search trace is empty");

    let root = BitMapBackend::new(path, (1280, 720)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_iter = trace.iter().map(|p| p.iterations).max().unwrap_or(10) as f64;
    let min_iter = trace.iter().map(|p| p.iterations).min().unwrap_or(1) as f64;
    let max_res = trace
        .iter()
        .map(|p| p.residual)
        .fold(f64::MIN_POSITIVE, f64::max)
        * 1.1;
    let min_res = trace
        .iter()
        .map(|p| p.residual)
        .fold(f64::INFINITY, f64::min)
        .max(max_res * 1e-6)
        * 0.9;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Representative Sampling: Random Search",
            ("sans-serif", 34).into_font(),
        )
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(
            (min_iter..max_iter.max(min_iter * 10.0)).log_scale(),
            (min_res..max_res).log_scale(),
        )?;

    chart
        .configure_mesh()
        .x_desc("Iterations")
        .y_desc("Covariance residual")
        .draw()?;

    chart.draw_series(LineSeries::new(
        trace
            .iter()
            .map(|p| (p.iterations as f64, p.residual.max(min_res))),
        &BLUE,
    ))?;
    chart.draw_series(trace.iter().map(|p| {
        Circle::new(
            (p.iterations as f64, p.residual.max(min_res)),
            4,
            BLUE.filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}
