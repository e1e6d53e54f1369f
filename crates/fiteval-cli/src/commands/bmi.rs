//! The `fiteval bmi` command.

use anyhow::Result;

use fiteval_core::body::BodyMetrics;

pub fn execute(weight_kg: f64, height_cm: f64) -> Result<()> {
    let body = BodyMetrics::new(weight_kg, height_cm)?;
    println!("BMI: {} ({})", body.bmi_display(), body.bmi_category());
    Ok(())
}
