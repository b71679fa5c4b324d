//! Hand-off of aggregated results to a rendering collaborator.

use de_core::{Real, Timestamp, tick_label, title_label};
use de_results::ResultMapping;
use ndarray::Array2;

use crate::error::AppResult;
use crate::growth::{self, GrowthReport};

/// Label of the averaged line in every series plot.
pub const AVERAGE_LABEL: &str = "Average";

#[derive(Debug, Clone, PartialEq)]
pub struct PlotLine {
    pub label: String,
    pub values: Vec<Real>,
}

/// Labelled lines over a shared time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPlot {
    pub name: String,
    pub times: Vec<Timestamp>,
    /// `"%d/%H"` label per time.
    pub tick_labels: Vec<String>,
    pub lines: Vec<PlotLine>,
}

/// A labelled 2D field at one time.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPlot {
    pub name: String,
    pub title: String,
    pub time: Timestamp,
    pub field: Array2<Real>,
}

/// Receives plots. Rendering is up to the implementation.
pub trait PlotSink {
    fn series_plot(&mut self, plot: &SeriesPlot) -> AppResult<()>;

    fn field_plot(&mut self, plot: &FieldPlot) -> AppResult<()>;
}

pub fn tick_labels(times: &[Timestamp]) -> Vec<String> {
    times.iter().map(tick_label).collect()
}

fn series_plot(name: String, times: &[Timestamp], lines: Vec<PlotLine>) -> SeriesPlot {
    SeriesPlot {
        name,
        times: times.to_vec(),
        tick_labels: tick_labels(times),
        lines,
    }
}

/// Build the growth plots of a report: one per group, plus an
/// average-of-averages plot when grouped.
pub fn growth_plots(report: &GrowthReport, prefix: &str) -> Vec<SeriesPlot> {
    let mut plots = Vec::with_capacity(report.groups.len() + 1);

    for group in &report.groups {
        let mut lines: Vec<PlotLine> = group
            .members
            .iter()
            .map(|m| PlotLine {
                label: m.label.clone(),
                values: m.values.clone(),
            })
            .collect();
        lines.push(PlotLine {
            label: AVERAGE_LABEL.to_string(),
            values: group.average.clone(),
        });
        plots.push(series_plot(
            format!("{}_Growth_{}", prefix, group.key),
            &report.times,
            lines,
        ));
    }

    if report.grouped {
        let mut lines: Vec<PlotLine> = report
            .groups
            .iter()
            .map(|g| PlotLine {
                label: g.key.clone(),
                values: g.average.clone(),
            })
            .collect();
        lines.push(PlotLine {
            label: AVERAGE_LABEL.to_string(),
            values: report.overall.clone(),
        });
        plots.push(series_plot(
            format!("{}_Growth_Averages", prefix),
            &report.times,
            lines,
        ));
    }

    plots
}

/// Aggregate `mapping` and send its growth plots to `sink`.
pub fn plot_error_growth(
    mapping: &ResultMapping,
    sensitivity: Option<&[String]>,
    prefix: &str,
    sink: &mut dyn PlotSink,
) -> AppResult<GrowthReport> {
    let report = growth::aggregate(mapping, sensitivity)?;
    for plot in growth_plots(&report, prefix) {
        sink.series_plot(&plot)?;
    }
    Ok(report)
}

/// Send the pair-averaged column field at each of `times` to `sink`.
pub fn plot_field_averages(
    mapping: &ResultMapping,
    times: &[Timestamp],
    prefix: &str,
    sink: &mut dyn PlotSink,
) -> AppResult<usize> {
    for (n, time) in times.iter().enumerate() {
        let field = growth::field_average_at(mapping, time)?;
        sink.field_plot(&FieldPlot {
            name: format!("{}_p{:02}", prefix, n),
            title: format!("{} at {}", mapping.energy.abbreviation(), title_label(time)),
            time: *time,
            field,
        })?;
    }
    Ok(times.len())
}
