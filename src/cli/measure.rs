//! Measurement commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use super::output::Output;
use crate::domain::measurement::{cartesian_to_polar, polar_to_cartesian};
use crate::domain::ImperialMeasurement;

#[derive(Subcommand)]
pub enum MeasureCommands {
    /// Parse imperial text such as 27' 6" into feet, inches and meters
    Parse {
        /// Imperial text; anything unparsable reads as 0' 0"
        text: String,
    },

    /// Convert meters to imperial text
    FromMeters {
        #[arg(allow_negative_numbers = true)]
        meters: f64,
    },

    /// Convert an angle (degrees clockwise from +z) and distance to x/z
    Polar {
        #[arg(allow_negative_numbers = true)]
        angle: f64,

        #[arg(allow_negative_numbers = true)]
        distance: f64,
    },

    /// Convert x/z to an angle in [0, 360) and distance
    Cartesian {
        #[arg(allow_negative_numbers = true)]
        x: f64,

        #[arg(allow_negative_numbers = true)]
        z: f64,
    },
}

#[derive(Serialize)]
struct Imperial {
    feet: i32,
    inches: i32,
    text: String,
    meters: f64,
}

impl From<ImperialMeasurement> for Imperial {
    fn from(m: ImperialMeasurement) -> Self {
        Self {
            feet: m.feet,
            inches: m.inches,
            text: m.to_string(),
            meters: m.to_meters(),
        }
    }
}

pub fn run(cmd: MeasureCommands, output: &Output) -> Result<()> {
    match cmd {
        MeasureCommands::Parse { text } => {
            let parsed = Imperial::from(ImperialMeasurement::parse(&text));
            if output.is_json() {
                output.data(&parsed);
            } else {
                println!("{} = {:.4} m", parsed.text, parsed.meters);
            }
        }

        MeasureCommands::FromMeters { meters } => {
            let converted = Imperial::from(ImperialMeasurement::from_meters(meters));
            if output.is_json() {
                output.data(&converted);
            } else {
                println!("{} m = {}", meters, converted.text);
            }
        }

        MeasureCommands::Polar { angle, distance } => {
            let (x, z) = polar_to_cartesian(angle, distance);
            if output.is_json() {
                output.data(&serde_json::json!({ "x": x, "z": z }));
            } else {
                println!("x = {:.4}, z = {:.4}", x, z);
            }
        }

        MeasureCommands::Cartesian { x, z } => {
            let (angle, distance) = cartesian_to_polar(x, z);
            if output.is_json() {
                output.data(&serde_json::json!({ "angle": angle, "distance": distance }));
            } else {
                println!("angle = {:.2}°, distance = {:.4}", angle, distance);
            }
        }
    }

    Ok(())
}
