// src/dag/templates.rs

//! Ready-made step definitions.

use crate::dag::step::StepDef;

/// Five-step pizza order: payment, then a strict chain through delivery.
pub fn pizza_order() -> Vec<StepDef> {
    vec![
        StepDef::root("Payment"),
        StepDef::new("MakeDough", ["Payment"]),
        StepDef::new("AddToppings", ["MakeDough"]),
        StepDef::new("BakePizza", ["AddToppings"]),
        StepDef::new("Deliver", ["BakePizza"]),
    ]
}
