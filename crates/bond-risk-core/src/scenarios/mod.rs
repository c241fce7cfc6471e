pub mod ladder;
pub mod yield_shift;

pub use ladder::{shift_ladder, LadderPoint, ShiftLadderInput, ShiftLadderOutput};
pub use yield_shift::{
    price_change_series, simulate_parallel_shift, PriceChangePoint, ScenarioHolding,
    ScenarioSnapshot,
};
