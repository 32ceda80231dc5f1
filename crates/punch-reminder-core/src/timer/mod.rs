mod gate;
mod task;

pub use gate::CancelGate;
pub use task::{spawn_fixed_delay, TaskHandle};
