//! Output Adapter - 输出设备实现

mod simulated_output;

pub use simulated_output::SimulatedAudioOutput;
