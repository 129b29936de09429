use std::path::Path;

use plotters::prelude::*;

use crate::plant::results::DailySeries;

fn max_of<'a>(series: impl IntoIterator<Item = &'a [f64]>) -> f64 {
    series
        .into_iter()
        .flatten()
        .fold(0f64, |a, &b| a.max(b))
        .max(1.0)
}

/// Plot the daily schedule: energy flows on top, battery and hydrogen below
pub fn plot_daily_schedule(
    daily: &DailySeries,
    filename: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let days = daily.hydrogen_kg.len() as f64;
    let root = BitMapBackend::new(filename, (1000, 1000)).into_drawing_area();
    root.fill(&WHITE)?;

    let areas = root.split_evenly((2, 1));
    let upper = &areas[0];
    let lower = &areas[1];

    // First subplot: energy flows
    let mut chart1 = ChartBuilder::on(upper)
        .caption("Daily Energy Flows", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            0f64..days,
            0f64..max_of([
                &daily.turbine_output_mwh[..],
                &daily.bought_mwh[..],
                &daily.sold_mwh[..],
                &daily.electrolyzer_energy_mwh[..],
            ]),
        )?;

    chart1.configure_mesh().x_desc("Day").y_desc("MWh").draw()?;

    let flows = [
        (&daily.turbine_output_mwh, "turbine output", BLUE),
        (&daily.electrolyzer_energy_mwh, "electrolyzers", GREEN),
        (&daily.bought_mwh, "bought", RED),
        (&daily.sold_mwh, "sold", MAGENTA),
    ];
    for (data, label, colour) in flows {
        chart1
            .draw_series(LineSeries::new(
                data.iter().enumerate().map(|(i, &y)| (i as f64, y)),
                &colour,
            ))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], &colour));
    }

    chart1
        .configure_series_labels()
        .border_style(&BLACK)
        .draw()?;

    // Second subplot: battery level (left axis) and hydrogen (right axis)
    let mut chart2 = ChartBuilder::on(lower)
        .caption("Battery and Hydrogen", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .right_y_label_area_size(60)
        .build_cartesian_2d(0f64..days, 0f64..max_of([&daily.battery_level_mwh[..]]))?
        .set_secondary_coord(0f64..days, 0f64..max_of([&daily.hydrogen_kg[..]]));

    chart2
        .configure_mesh()
        .x_desc("Day")
        .y_desc("Battery level (MWh)")
        .draw()?;
    chart2
        .configure_secondary_axes()
        .y_desc("Hydrogen (kg)")
        .draw()?;

    chart2
        .draw_series(daily.battery_level_mwh.iter().enumerate().map(|(i, &y)| {
            Rectangle::new([(i as f64, 0.0), (i as f64 + 0.8, y)], CYAN.filled())
        }))?
        .label("battery level")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], &CYAN));

    chart2
        .draw_secondary_series(LineSeries::new(
            daily
                .hydrogen_kg
                .iter()
                .enumerate()
                .map(|(i, &y)| (i as f64, y)),
            &BLACK,
        ))?
        .label("hydrogen")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], &BLACK));

    chart2
        .configure_series_labels()
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    log::info!("Plot saved as {}", filename.display());
    Ok(())
}
