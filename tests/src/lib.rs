//! Scenario tests driving the public engine API over the scripted transport.

#[cfg(test)]
mod probing;
