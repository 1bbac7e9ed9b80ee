//! Traffic planning module.

pub mod planner;

pub use planner::{plan_traffic, ActiveWindow, FlowDirection, PacketSink, TrafficError, TrafficFlow, TrafficPlan};
