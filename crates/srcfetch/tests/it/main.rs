mod client;
mod pipeline;

/// A contract address used across the tests.
pub const DAI: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";
