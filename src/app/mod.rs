// Application layer: pipeline implementations wiring adapters to the core.

pub mod pipelines;
