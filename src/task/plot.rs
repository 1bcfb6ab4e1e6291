use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::LineSeries;
use plotters::prelude::*;

use crate::task::error::TaskError;

/// One panel of the gold-vs-subject comparison figure: both curves already
/// z-scored, plus the Fisher-z value shown in the panel title.
#[derive(Clone, Debug)]
pub struct BlockPanel {
    pub label: String,
    pub gold: Vec<f64>,
    pub subject: Vec<f64>,
    pub fisher_z: f64,
}

#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub panel_width: u32,
    pub height: u32,
    pub background: RGBColor,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            panel_width: 320,
            height: 360,
            background: WHITE,
        }
    }
}

/// Render the per-run QC figure: one panel per block, actor rating in
/// black, participant rating in red, both on a fixed -3..3 z scale.
pub fn render_comparison_png(
    title: &str,
    panels: &[BlockPanel],
    style: PlotStyle,
) -> Result<Vec<u8>, TaskError> {
    if panels.is_empty() {
        return Err(TaskError::Plot("no blocks to plot".into()));
    }
    let width = style.panel_width * panels.len() as u32;
    let height = style.height;
    let mut buffer = vec![0u8; (width * height * 3) as usize];
    {
        let root =
            BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&style.background)?;
        let root = root.titled(title, ("sans-serif", 16).into_font())?;
        let areas = root.split_evenly((1, panels.len()));
        for (i, (panel, area)) in panels.iter().zip(areas.iter()).enumerate() {
            let x_max = panel.subject.len().max(panel.gold.len()).max(2) - 1;
            let mut chart = ChartBuilder::on(area)
                .margin(8)
                .caption(
                    format!("{}: z(r) = {:.2}", panel.label, panel.fisher_z),
                    ("sans-serif", 13).into_font(),
                )
                .set_label_area_size(LabelAreaPosition::Left, 35)
                .set_label_area_size(LabelAreaPosition::Bottom, 25)
                .build_cartesian_2d(0f64..x_max as f64, -3f64..3f64)?;
            let mut mesh = chart.configure_mesh();
            mesh.light_line_style(&style.background.mix(0.0)).x_desc("TR");
            if i == 0 {
                mesh.y_desc("Rating (z)");
            }
            mesh.draw()?;
            let last = i == panels.len() - 1;
            let actor = chart.draw_series(LineSeries::new(
                panel.gold.iter().enumerate().map(|(x, &y)| (x as f64, y)),
                BLACK.stroke_width(2),
            ))?;
            if last {
                actor.label("Actor").legend(|(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(2))
                });
            }
            let participant = chart.draw_series(LineSeries::new(
                panel.subject.iter().enumerate().map(|(x, &y)| (x as f64, y)),
                RED.stroke_width(2),
            ))?;
            if last {
                participant.label("Participant").legend(|(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2))
                });
                chart
                    .configure_series_labels()
                    .border_style(&TRANSPARENT)
                    .background_style(&style.background)
                    .draw()?;
            }
        }
        root.present()?;
    }
    encode_png(&buffer, width, height)
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, TaskError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| TaskError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
