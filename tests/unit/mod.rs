mod builder;
mod roundtrip;
