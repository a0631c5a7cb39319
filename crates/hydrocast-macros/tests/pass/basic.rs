use hydrocast_macros::StepSeries;

#[derive(Debug, Clone, Copy, StepSeries)]
pub struct RouteStep {
    pub surface: f64,
    pub interflow: f64,
    pub groundwater: f64,
}

fn main() {
    let step = RouteStep { surface: 1.0, interflow: 2.0, groundwater: 3.0 };
    let mut series = RouteStepSeries::with_capacity(4);
    assert!(series.is_empty());
    series.push(&step);
    series.push(&step);
    assert_eq!(series.len(), 2);
    assert_eq!(series.column("interflow"), Some(&[2.0, 2.0][..]));
    assert!(series.column("discharge").is_none());
    assert_eq!(RouteStep::field_names(), &["surface", "interflow", "groundwater"]);
}
