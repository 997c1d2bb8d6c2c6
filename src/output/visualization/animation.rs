//! Animated GIF of agent snapshots

use std::error::Error;

use plotters::prelude::*;

use crate::agents::{AgentFrame, EpidemicHistory, HealthState};

/// Render `frames` to an animated GIF
///
/// The image has the size of the box, one pixel per unit. Each frame shows
/// the day, hour and S/I/R/D counts when `history` covers it.
pub fn render_agents_gif(
    frames: &[AgentFrame],
    box_size: (u32, u32),
    radius: f64,
    history: Option<&EpidemicHistory>,
    output_path: &str,
    frame_delay_ms: u32,
) -> Result<(), Box<dyn Error>> {
    if frames.is_empty() {
        return Err("No agent frames to render".into());
    }

    let root = BitMapBackend::gif(output_path, box_size, frame_delay_ms)?.into_drawing_area();
    let r = radius.round().max(1.0) as i32;

    for frame in frames {
        root.fill(&WHITE)?;

        for (position, health) in frame.positions.iter().zip(&frame.health) {
            if *health == HealthState::Dead {
                continue;
            }
            let (red, green, blue) = health.color();
            root.draw(&Circle::new(
                (position[0].round() as i32, position[1].round() as i32),
                r,
                RGBColor(red, green, blue).filled(),
            ))?;
        }

        if let Some(history) = history {
            let per_day = history.steps_per_day.max(1);
            let mut caption = format!("{} Day {} Hours", frame.frame / per_day, frame.frame % per_day);
            if let Some(counts) = history.counts.get(frame.frame.saturating_sub(1)) {
                caption.push_str(&format!(
                    " | S: {} | I: {} | R: {} | D: {}",
                    counts.susceptible, counts.infected, counts.recovered, counts.dead
                ));
            }
            root.draw(&Text::new(caption, (10, 10), ("sans-serif", 16).into_font()))?;
        }

        root.present()?;
    }

    Ok(())
}
