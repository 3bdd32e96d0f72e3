pub mod synthesis_flow;

pub use synthesis_flow::SynthesisFlow;
