//! Body metrics from the intake form and the BMI derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BodyError;

/// Heaviest weight the intake form accepts, in kilograms.
pub const MAX_WEIGHT_KG: f64 = 250.0;
/// Tallest height the intake form accepts, in centimetres.
pub const MAX_HEIGHT_CM: f64 = 215.0;

/// Validated weight and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyMetrics {
    weight_kg: f64,
    height_cm: f64,
}

impl BodyMetrics {
    pub fn new(weight_kg: f64, height_cm: f64) -> Result<Self, BodyError> {
        if !(weight_kg > 0.0 && weight_kg <= MAX_WEIGHT_KG) {
            return Err(BodyError::Weight {
                value: weight_kg,
                max: MAX_WEIGHT_KG,
            });
        }
        if !(height_cm > 0.0 && height_cm <= MAX_HEIGHT_CM) {
            return Err(BodyError::Height {
                value: height_cm,
                max: MAX_HEIGHT_CM,
            });
        }
        Ok(Self {
            weight_kg,
            height_cm,
        })
    }

    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    pub fn height_cm(&self) -> f64 {
        self.height_cm
    }

    /// Body-mass index, kg/m².
    pub fn bmi(&self) -> f64 {
        let meters = self.height_cm / 100.0;
        self.weight_kg / (meters * meters)
    }

    /// BMI formatted the way it is shown and stored: two decimals.
    pub fn bmi_display(&self) -> String {
        format!("{:.2}", self.bmi())
    }

    pub fn bmi_category(&self) -> BmiCategory {
        BmiCategory::from_bmi(self.bmi())
    }
}

/// WHO adult BMI bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BmiCategory::Underweight => write!(f, "underweight"),
            BmiCategory::Normal => write!(f, "normal"),
            BmiCategory::Overweight => write!(f, "overweight"),
            BmiCategory::Obese => write!(f, "obese"),
        }
    }
}
