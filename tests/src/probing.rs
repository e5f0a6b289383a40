mod properties;
mod scenarios;
mod sinks;
