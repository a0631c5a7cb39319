use hydrocast_macros::StepSeries;

#[derive(Debug, Clone, Copy, StepSeries)]
#[series(name = "SoilTrace")]
pub struct SoilStep {
    pub upper: f64,
    pub lower: f64,
}

fn main() {
    let mut trace = SoilTrace::with_capacity(1);
    trace.push(&SoilStep { upper: 10.0, lower: 40.0 });
    assert_eq!(trace.len(), 1);
    assert_eq!(trace.upper, vec![10.0]);
    assert_eq!(SoilStep::field_names(), &["upper", "lower"]);
}
